//! The all-or-nothing entry point: text in, either a document or diagnostics out.

use crate::{
	diagnostics::{Diagnostic, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticType, Reporter},
	document::{self, PlainTable, Table},
	parsing, token,
};
use std::panic::{self, AssertUnwindSafe};

/// A successfully read document, in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Output<'a> {
	/// Typed tree with source images, from `full_value = true`.
	Full(Table<'a>),
	/// Native values only.
	Plain(PlainTable<'a>),
}

/// The outcome of [`read_toml`].
///
/// `result` is [`Some`] iff `errors` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading<'a> {
	pub result: Option<Output<'a>>,
	pub errors: Vec<Diagnostic>,
}

impl<'a> Reading<'a> {
	#[must_use]
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}

	#[must_use]
	pub fn full(&self) -> Option<&Table<'a>> {
		match &self.result {
			Some(Output::Full(table)) => Some(table),
			_ => None,
		}
	}

	#[must_use]
	pub fn plain(&self) -> Option<&PlainTable<'a>> {
		match &self.result {
			Some(Output::Plain(table)) => Some(table),
			_ => None,
		}
	}
}

/// Reads `input` as a TOML document.
///
/// Stages run in order (lexing, parsing, reduction and, unless `full_value` is set, flattening)
/// and the first failing stage ends the read.
/// Panics inside any stage are caught and reported as [`DiagnosticType::InternalError`].
#[must_use]
pub fn read_toml(input: &str, full_value: bool) -> Reading {
	let mut errors = vec![];

	let result = match panic::catch_unwind(AssertUnwindSafe(|| {
		read_stages(input, full_value, &mut errors)
	})) {
		Ok(result) => result,
		Err(payload) => {
			let message = payload
				.downcast_ref::<&str>()
				.copied()
				.or_else(|| payload.downcast_ref::<std::string::String>().map(|s| s.as_str()))
				.unwrap_or("(non-string panic payload)");
			log::error!("Internal error while reading TOML: {}", message);
			errors.report_with(|| Diagnostic {
				r#type: DiagnosticType::InternalError,
				labels: vec![DiagnosticLabel::new(
					"The reader panicked while processing this document.",
					None,
					DiagnosticLabelPriority::Primary,
				)],
			});
			None
		}
	};

	Reading {
		result: result.filter(|_| errors.is_empty()),
		errors,
	}
}

fn read_stages<'a>(
	input: &'a str,
	full_value: bool,
	reporter: &mut impl Reporter,
) -> Option<Output<'a>> {
	log::debug!("Lexing {} bytes.", input.len());
	let tokens = token::tokenize(input, reporter).ok()?;

	log::debug!("Parsing {} tokens.", tokens.len());
	let entries = parsing::parse(input, &tokens, reporter).ok()?;

	log::debug!("Reducing {} entries.", entries.len());
	let table = document::reduce(entries, reporter).ok()?;

	Some(if full_value {
		Output::Full(table)
	} else {
		Output::Plain(table.into_plain())
	})
}
