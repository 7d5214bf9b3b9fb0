use {
	crate::token::Token,
	enum_properties::enum_properties,
	std::{fmt::Display, iter},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticLevel {
	Warning,
	Error,
}

pub struct DiagnosticGroupProperties {
	pub code: char,
}

enum_properties! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub enum DiagnosticGroup: DiagnosticGroupProperties {
		Lexing { code: 'L' },
		Parsing { code: 'P' },
		Semantic { code: 'S' },
		Internal { code: 'I' },
	}
}

pub struct DiagnosticTypeProperties {
	pub group: DiagnosticGroup,
	pub code: usize,
	pub level: DiagnosticLevel,
	pub title: &'static str,
}

enum_properties! {
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	#[non_exhaustive]
	pub enum DiagnosticType: DiagnosticTypeProperties {
		UnrecognizedToken {
			group: DiagnosticGroup::Lexing,
			code: 0,
			level: DiagnosticLevel::Error,
			title: "Unrecognised token",
		},

		ExpectedEntry {
			group: DiagnosticGroup::Parsing,
			code: 0,
			level: DiagnosticLevel::Error,
			title: "Expected a key, a table header or a table array header",
		},

		ExpectedKey {
			group: DiagnosticGroup::Parsing,
			code: 1,
			level: DiagnosticLevel::Error,
			title: "Expected key",
		},

		ExpectedEquals {
			group: DiagnosticGroup::Parsing,
			code: 2,
			level: DiagnosticLevel::Error,
			title: "Expected equals sign",
		},

		ExpectedValue {
			group: DiagnosticGroup::Parsing,
			code: 3,
			level: DiagnosticLevel::Error,
			title: "Expected value",
		},

		UnclosedTableHeader {
			group: DiagnosticGroup::Parsing,
			code: 4,
			level: DiagnosticLevel::Error,
			title: "Unclosed table header",
		},

		UnclosedTableArrayHeader {
			group: DiagnosticGroup::Parsing,
			code: 5,
			level: DiagnosticLevel::Error,
			title: "Unclosed table array header",
		},

		UnclosedArray {
			group: DiagnosticGroup::Parsing,
			code: 6,
			level: DiagnosticLevel::Error,
			title: "Unclosed array",
		},

		UnclosedInlineTable {
			group: DiagnosticGroup::Parsing,
			code: 7,
			level: DiagnosticLevel::Error,
			title: "Unclosed inline table",
		},

		UnclosedString {
			group: DiagnosticGroup::Parsing,
			code: 8,
			level: DiagnosticLevel::Error,
			title: "Unclosed string",
		},

		InvalidEscape {
			group: DiagnosticGroup::Parsing,
			code: 9,
			level: DiagnosticLevel::Error,
			title: "Invalid escape sequence",
		},

		IntegerOutOfRange {
			group: DiagnosticGroup::Parsing,
			code: 10,
			level: DiagnosticLevel::Error,
			title: "Integer out of range",
		},

		InvalidDateTime {
			group: DiagnosticGroup::Parsing,
			code: 11,
			level: DiagnosticLevel::Error,
			title: "Invalid date or time",
		},

		NestingTooDeep {
			group: DiagnosticGroup::Parsing,
			code: 12,
			level: DiagnosticLevel::Error,
			title: "Arrays and inline tables are nested too deeply",
		},

		PathContainsValue {
			group: DiagnosticGroup::Semantic,
			code: 0,
			level: DiagnosticLevel::Error,
			title: "Path already contains a value",
		},

		KeyAlreadyInitialized {
			group: DiagnosticGroup::Semantic,
			code: 1,
			level: DiagnosticLevel::Error,
			title: "Path has already been initialized to some value",
		},

		TableAlreadyInitialized {
			group: DiagnosticGroup::Semantic,
			code: 2,
			level: DiagnosticLevel::Error,
			title: "Path has already been initialized to a table",
		},

		TableNotTableArray {
			group: DiagnosticGroup::Semantic,
			code: 3,
			level: DiagnosticLevel::Error,
			title: "Path has already been initialized to a table, not an array table",
		},

		TableArrayNotTable {
			group: DiagnosticGroup::Semantic,
			code: 4,
			level: DiagnosticLevel::Error,
			title: "Path has already been initialized to a table array, not a table",
		},

		StaticTableArray {
			group: DiagnosticGroup::Semantic,
			code: 5,
			level: DiagnosticLevel::Error,
			title: "Static table array already initialized for path",
		},

		HeterogeneousArray {
			group: DiagnosticGroup::Semantic,
			code: 6,
			level: DiagnosticLevel::Error,
			title: "Elements in array are not of the same type",
		},

		InternalError {
			group: DiagnosticGroup::Internal,
			code: 0,
			level: DiagnosticLevel::Error,
			title: "Unexpected internal error",
		},
	}
}

impl Display for DiagnosticType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "TOML-{}{:04} {}", self.group.code, self.code, self.title)
	}
}

/// Where a diagnostic points into the source text.
///
/// `line` and `column` are 1-based, `column` counts characters.
/// `offset` and `length` are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
	pub offset: usize,
	pub line: usize,
	pub column: usize,
	pub length: usize,
}

impl<'a> From<&Token<'a>> for Location {
	fn from(token: &Token<'a>) -> Self {
		Self {
			offset: token.offset,
			line: token.line,
			column: token.column,
			length: token.length,
		}
	}
}

impl<'a> From<Token<'a>> for Location {
	fn from(token: Token<'a>) -> Self {
		(&token).into()
	}
}

impl Display for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLabelPriority {
	Primary,
	Auxiliary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLabel {
	pub caption: Option<&'static str>,
	pub location: Option<Location>,
	pub priority: DiagnosticLabelPriority,
}

impl DiagnosticLabel {
	pub fn new(
		caption: impl Into<Option<&'static str>>,
		location: impl Into<Option<Location>>,
		priority: DiagnosticLabelPriority,
	) -> Self {
		Self {
			caption: caption.into(),
			location: location.into(),
			priority,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub r#type: DiagnosticType,
	pub labels: Vec<DiagnosticLabel>,
}

impl Diagnostic {
	#[must_use]
	pub fn code(&self) -> String {
		format!("TOML-{}{:04}", self.r#type.group.code, self.r#type.code)
	}

	#[must_use]
	pub fn group(&self) -> DiagnosticGroup {
		self.r#type.group
	}

	#[must_use]
	pub fn level(&self) -> DiagnosticLevel {
		self.r#type.level
	}

	#[must_use]
	pub fn message(&self) -> &'static str {
		self.r#type.title
	}

	/// The location of the first primary label, if any.
	#[must_use]
	pub fn location(&self) -> Option<Location> {
		self.labels
			.iter()
			.filter(|label| label.priority == DiagnosticLabelPriority::Primary)
			.find_map(|label| label.location)
	}
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if let Some(location) = self.location() {
			write!(f, "{}: ", location)?;
		}
		write!(f, "{}", self.r#type)?;
		let captions = self.labels.iter().filter_map(|label| label.caption);
		for caption in captions {
			write!(f, " ({})", caption)?;
		}
		Ok(())
	}
}

pub trait Reporter {
	fn report_with(&mut self, diagnostic: impl FnOnce() -> Diagnostic) {
		self.report_many_with(|| iter::once_with(diagnostic))
	}
	fn report_many_with<I: IntoIterator<Item = Diagnostic>>(
		&mut self,
		diagnostics: impl FnOnce() -> I,
	);
}

impl Reporter for () {
	fn report_with(&mut self, _diagnostic: impl FnOnce() -> Diagnostic) {
		// Do nothing.
	}

	fn report_many_with<I: IntoIterator<Item = Diagnostic>>(
		&mut self,
		_diagnostics: impl FnOnce() -> I,
	) {
		// Do nothing.
	}
}

impl Reporter for Vec<Diagnostic> {
	fn report_many_with<I: IntoIterator<Item = Diagnostic>>(
		&mut self,
		diagnostics: impl FnOnce() -> I,
	) {
		self.extend(diagnostics())
	}
}
