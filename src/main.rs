#![warn(clippy::pedantic)]
#![allow(clippy::default_trait_access)] // because of derive(FromArgs).

use {
    argh::FromArgs,
    std::{
        fs,
        path::{Path, PathBuf},
        process,
    },
    toml_reader::{diagnostics::Diagnostic, read_toml, Output},
};

#[derive(Debug, FromArgs)]
/// Reads TOML documents and reports what's wrong with them.
struct Arghs {
    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Check(Check),
}

#[derive(Debug, FromArgs)]
/// Read TOML files and print either their contents or their diagnostics.
#[argh(subcommand, name = "check")]
struct Check {
    #[argh(switch)]
    /// print the typed tree including source images instead of plain values.
    full: bool,

    #[argh(positional)]
    /// the files to read.
    paths: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let arghs: Arghs = argh::from_env();

    match arghs.subcommand {
        SubCommand::Check(Check { full, paths }) => {
            let mut failed = false;
            for path in paths {
                log::info!("Checking {}", path.display());
                let text = match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(error) => {
                        eprintln!("{}: {}", path.display(), error);
                        failed = true;
                        continue;
                    }
                };

                let reading = read_toml(&text, full);
                for diagnostic in &reading.errors {
                    print_diagnostic(&path, diagnostic);
                }
                match reading.result {
                    Some(Output::Full(table)) => println!("{:#?}", table),
                    Some(Output::Plain(table)) => println!("{:#?}", table),
                    None => failed = true,
                }
            }

            if failed {
                process::exit(1)
            }
        }
    }
}

fn print_diagnostic(path: &Path, diagnostic: &Diagnostic) {
    // `Diagnostic`'s `Display` starts with `line:column: ` if it has a location.
    if diagnostic.location().is_some() {
        eprintln!("{}:{}", path.display(), diagnostic)
    } else {
        eprintln!("{}: {}", path.display(), diagnostic)
    }
}
