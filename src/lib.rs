//! A TOML reader that either hands back a whole document or only diagnostics.
//!
//! ```
//! use toml_reader::{document::PlainValue, read_toml};
//!
//! let reading = read_toml("title = \"x\"\n[a]\nb = 1\n", false);
//! assert!(reading.errors.is_empty());
//!
//! let document = reading.plain().unwrap();
//! assert_eq!(document["a"], PlainValue::Table(
//!     vec![("b".into(), PlainValue::Integer(1))].into_iter().collect()
//! ));
//! ```
//!
//! The stages are available individually: [`tokenize`](`token::tokenize`) →
//! [`parse`](`parsing::parse`) → [`reduce`](`document::reduce`).
//! Each reports through a [`Reporter`](`diagnostics::Reporter`) and stops at its first error.

#![doc(html_root_url = "https://docs.rs/toml-reader/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::result_unit_err)]
#![allow(
	clippy::semicolon_if_nothing_returned,
	clippy::trivially_copy_pass_by_ref
)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod datetime;
pub mod diagnostics;
pub mod document;
pub mod parsing;
pub mod reading;
pub mod token;

pub use document::reduce;
pub use parsing::parse;
pub use reading::{read_toml, Output, Reading};
pub use token::{tokenize, Token};
