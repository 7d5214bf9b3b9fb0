//! Mode-stack tokenization of TOML source text.
//!
//! TOML changes meaning depending on where in a line you are: `true` is a bare key before `=` and
//! a boolean after it, `[` opens a table header at the start of a line and an array in a value.
//! [`Lexer`] keeps an explicit stack of [`Mode`]s and runs the [`logos`] automaton that belongs to
//! the mode on top of it, one token at a time.

use {
	crate::diagnostics::{
		Diagnostic, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticType, Location, Reporter,
	},
	logos::Logos,
	std::ops::Range,
};

pub(crate) mod quoting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	BareKey,
	Dot,
	Equals,
	Comma,
	TableOpen,
	TableClose,
	TableArrayOpen,
	TableArrayClose,
	ArrayOpen,
	ArrayClose,
	InlineTableOpen,
	InlineTableClose,

	BasicStringQuote,
	MultiLineBasicStringQuote,
	LiteralStringQuote,
	MultiLineLiteralStringQuote,
	StringContent,
	Escape,

	OffsetDateTime,
	LocalDateTime,
	LocalDate,
	LocalTime,
	Integer,
	HexInteger,
	OctalInteger,
	BinaryInteger,
	Float,
	Infinity,
	NotANumber,
	Boolean,
}

/// A lexed token. `image` borrows the exact source text it was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
	pub kind: TokenKind,
	pub image: &'a str,
	/// Byte offset into the source.
	pub offset: usize,
	/// 1-based.
	pub line: usize,
	/// 1-based, in characters.
	pub column: usize,
	/// In bytes.
	pub length: usize,
}

impl<'a> Token<'a> {
	#[must_use]
	pub fn end(&self) -> usize {
		self.offset + self.length
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
	Top,
	Value,
	Table,
	TableArrayItem,
	/// Between a header's closing bracket(s) and the end of its line.
	AfterHeader,
	Array,
	InlineTable,
	InlineValue,
	BasicString,
	MultiLineBasicString,
	LiteralString,
	MultiLineLiteralString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
	Stay,
	Push(Mode),
	Pop(usize),
	/// Pops one mode and pushes another.
	Replace(Mode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
	Emit(TokenKind, Transition),
	Skip(Transition),
	Unrecognized(&'static str),
}

trait ModeToken {
	fn step(self, mode: Mode) -> Step;
}

/// Keys, header brackets and inline table punctuation.
/// Used in [`Mode::Top`], [`Mode::Table`], [`Mode::TableArrayItem`], [`Mode::AfterHeader`] and
/// [`Mode::InlineTable`].
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum KeyToken {
	#[regex(r"[A-Za-z0-9_\-]+")]
	BareKey,

	#[token("\"")]
	BasicQuote,
	#[token("'")]
	LiteralQuote,

	#[token(".")]
	Dot,
	#[token("=")]
	Equals,
	#[token(",")]
	Comma,

	#[token("[")]
	Brac,
	#[token("[[")]
	BracBrac,
	#[token("]")]
	Ket,
	#[token("]]")]
	KetKet,
	#[token("}")]
	Ce,

	#[regex(r"\r?\n")]
	Newline,

	#[error]
	#[regex(r"[ \t]+|#[^\r\n]*", logos::skip)]
	Error,
}

impl ModeToken for KeyToken {
	fn step(self, mode: Mode) -> Step {
		use {Step::Emit, Transition::*};
		if mode == Mode::AfterHeader {
			return match self {
				KeyToken::Newline => Step::Skip(Pop(1)),
				_ => Step::Unrecognized("Expected the end of the line after this header."),
			};
		}
		match self {
			KeyToken::BareKey => Emit(TokenKind::BareKey, Stay),
			KeyToken::BasicQuote => Emit(TokenKind::BasicStringQuote, Push(Mode::BasicString)),
			KeyToken::LiteralQuote => {
				Emit(TokenKind::LiteralStringQuote, Push(Mode::LiteralString))
			}
			KeyToken::Dot => Emit(TokenKind::Dot, Stay),
			KeyToken::Equals => match mode {
				Mode::Top => Emit(TokenKind::Equals, Push(Mode::Value)),
				Mode::InlineTable => Emit(TokenKind::Equals, Push(Mode::InlineValue)),
				_ => Emit(TokenKind::Equals, Stay),
			},
			KeyToken::Comma => Emit(TokenKind::Comma, Stay),
			KeyToken::Brac => match mode {
				Mode::Top => Emit(TokenKind::TableOpen, Push(Mode::Table)),
				_ => Emit(TokenKind::TableOpen, Stay),
			},
			KeyToken::BracBrac => match mode {
				Mode::Top => Emit(TokenKind::TableArrayOpen, Push(Mode::TableArrayItem)),
				_ => Emit(TokenKind::TableArrayOpen, Stay),
			},
			KeyToken::Ket => match mode {
				Mode::Table => Emit(TokenKind::TableClose, Replace(Mode::AfterHeader)),
				_ => Emit(TokenKind::TableClose, Stay),
			},
			KeyToken::KetKet => match mode {
				Mode::TableArrayItem => {
					Emit(TokenKind::TableArrayClose, Replace(Mode::AfterHeader))
				}
				_ => Emit(TokenKind::TableArrayClose, Stay),
			},
			KeyToken::Ce => match mode {
				Mode::InlineTable => Emit(TokenKind::InlineTableClose, Pop(1)),
				_ => Emit(TokenKind::InlineTableClose, Stay),
			},
			KeyToken::Newline => match mode {
				Mode::Top => Step::Skip(Stay),
				Mode::InlineTable => Step::Unrecognized("Inline tables can't span multiple lines."),
				_ => Step::Unrecognized("Table headers can't span multiple lines."),
			},
			KeyToken::Error => Step::Unrecognized("No key or header token starts here."),
		}
	}
}

/// Atoms and the brackets of arrays and inline tables.
/// Used in [`Mode::Value`], [`Mode::Array`] and [`Mode::InlineValue`].
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum ValueToken {
	#[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9][Tt][0-9][0-9]:[0-9][0-9]:[0-9][0-9](\.[0-9]+)?([Zz]|[+\-][0-9][0-9]:[0-9][0-9])")]
	OffsetDateTime,
	#[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9][Tt][0-9][0-9]:[0-9][0-9]:[0-9][0-9](\.[0-9]+)?")]
	LocalDateTime,
	#[regex(r"[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]")]
	LocalDate,
	#[regex(r"[0-9][0-9]:[0-9][0-9]:[0-9][0-9](\.[0-9]+)?")]
	LocalTime,

	#[regex(r"[+\-]?(0|[1-9](_?[0-9])*)\.[0-9](_?[0-9])*([eE][+\-]?[0-9](_?[0-9])*)?")]
	#[regex(r"[+\-]?(0|[1-9](_?[0-9])*)[eE][+\-]?[0-9](_?[0-9])*")]
	Float,
	#[regex(r"[+\-]?(0|[1-9](_?[0-9])*)")]
	Integer,
	#[regex(r"0x[0-9A-Fa-f](_?[0-9A-Fa-f])*")]
	HexInteger,
	#[regex(r"0o[0-7](_?[0-7])*")]
	OctalInteger,
	#[regex(r"0b[01](_?[01])*")]
	BinaryInteger,
	#[regex(r"[+\-]?inf")]
	Infinity,
	#[regex(r"[+\-]?nan")]
	NotANumber,
	#[token("true")]
	#[token("false")]
	Boolean,

	#[token("\"")]
	BasicQuote,
	/// Lexed whole so every prefix of `"""` is a token.
	#[token("\"\"")]
	EmptyBasicString,
	#[token("\"\"\"")]
	MultiLineBasicQuote,
	#[token("'")]
	LiteralQuote,
	#[token("''")]
	EmptyLiteralString,
	#[token("'''")]
	MultiLineLiteralQuote,

	#[token("[")]
	Brac,
	#[token("]")]
	Ket,
	#[token("{")]
	Bra,
	#[token("}")]
	Ce,
	#[token(",")]
	Comma,

	#[regex(r"\r?\n")]
	Newline,

	#[error]
	#[regex(r"[ \t]+|#[^\r\n]*", logos::skip)]
	Error,
}

impl ModeToken for ValueToken {
	fn step(self, mode: Mode) -> Step {
		use {Step::Emit, Transition::*};
		match self {
			ValueToken::OffsetDateTime => Emit(TokenKind::OffsetDateTime, Stay),
			ValueToken::LocalDateTime => Emit(TokenKind::LocalDateTime, Stay),
			ValueToken::LocalDate => Emit(TokenKind::LocalDate, Stay),
			ValueToken::LocalTime => Emit(TokenKind::LocalTime, Stay),
			ValueToken::Float => Emit(TokenKind::Float, Stay),
			ValueToken::Integer => Emit(TokenKind::Integer, Stay),
			ValueToken::HexInteger => Emit(TokenKind::HexInteger, Stay),
			ValueToken::OctalInteger => Emit(TokenKind::OctalInteger, Stay),
			ValueToken::BinaryInteger => Emit(TokenKind::BinaryInteger, Stay),
			ValueToken::Infinity => Emit(TokenKind::Infinity, Stay),
			ValueToken::NotANumber => Emit(TokenKind::NotANumber, Stay),
			ValueToken::Boolean => Emit(TokenKind::Boolean, Stay),

			ValueToken::BasicQuote => Emit(TokenKind::BasicStringQuote, Push(Mode::BasicString)),
			ValueToken::EmptyBasicString => Emit(TokenKind::BasicStringQuote, Stay),
			ValueToken::EmptyLiteralString => Emit(TokenKind::LiteralStringQuote, Stay),
			ValueToken::MultiLineBasicQuote => Emit(
				TokenKind::MultiLineBasicStringQuote,
				Push(Mode::MultiLineBasicString),
			),
			ValueToken::LiteralQuote => {
				Emit(TokenKind::LiteralStringQuote, Push(Mode::LiteralString))
			}
			ValueToken::MultiLineLiteralQuote => Emit(
				TokenKind::MultiLineLiteralStringQuote,
				Push(Mode::MultiLineLiteralString),
			),

			ValueToken::Brac => Emit(TokenKind::ArrayOpen, Push(Mode::Array)),
			ValueToken::Ket => match mode {
				Mode::Array => Emit(TokenKind::ArrayClose, Pop(1)),
				_ => Emit(TokenKind::ArrayClose, Stay),
			},
			ValueToken::Bra => Emit(TokenKind::InlineTableOpen, Push(Mode::InlineTable)),
			// Closes both the value and the surrounding inline table.
			ValueToken::Ce => match mode {
				Mode::InlineValue => Emit(TokenKind::InlineTableClose, Pop(2)),
				_ => Emit(TokenKind::InlineTableClose, Stay),
			},
			ValueToken::Comma => match mode {
				Mode::InlineValue => Emit(TokenKind::Comma, Pop(1)),
				_ => Emit(TokenKind::Comma, Stay),
			},

			ValueToken::Newline => match mode {
				Mode::Value => Step::Skip(Pop(1)),
				Mode::InlineValue => {
					Step::Unrecognized("Inline tables can't span multiple lines.")
				}
				_ => Step::Skip(Stay),
			},
			ValueToken::Error => Step::Unrecognized("No value token starts here."),
		}
	}
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum BasicStringToken {
	#[token("\"")]
	Quote,
	#[regex(r#"[^"\\\r\n]+"#)]
	Content,
	#[regex(r#"\\[btnfr"\\]"#)]
	#[regex(r"\\u[0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f]")]
	#[regex(r"\\U[0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f]")]
	Escape,
	#[error]
	Error,
}

impl ModeToken for BasicStringToken {
	fn step(self, _mode: Mode) -> Step {
		match self {
			BasicStringToken::Quote => {
				Step::Emit(TokenKind::BasicStringQuote, Transition::Pop(1))
			}
			BasicStringToken::Content => Step::Emit(TokenKind::StringContent, Transition::Stay),
			BasicStringToken::Escape => Step::Emit(TokenKind::Escape, Transition::Stay),
			BasicStringToken::Error => Step::Unrecognized(
				"Expected string content, an escape sequence or a closing quote (single-line strings can't contain newlines).",
			),
		}
	}
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum MultiLineBasicStringToken {
	#[regex(r#""+"#, |lex| lex.slice().len())]
	Quotes(usize),
	#[regex(r#"[^"\\]+"#)]
	Content,
	#[regex(r#"\\[btnfr"\\]"#)]
	#[regex(r"\\u[0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f]")]
	#[regex(r"\\U[0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f][0-9A-Fa-f]")]
	Escape,
	#[error]
	#[regex(r"\\[ \t]*\r?\n[ \t\r\n]*", logos::skip)]
	Error,
}

impl ModeToken for MultiLineBasicStringToken {
	fn step(self, _mode: Mode) -> Step {
		match self {
			MultiLineBasicStringToken::Quotes(count) => {
				quote_run(count, TokenKind::MultiLineBasicStringQuote)
			}
			MultiLineBasicStringToken::Content => {
				Step::Emit(TokenKind::StringContent, Transition::Stay)
			}
			MultiLineBasicStringToken::Escape => Step::Emit(TokenKind::Escape, Transition::Stay),
			MultiLineBasicStringToken::Error => {
				Step::Unrecognized("Expected string content, an escape sequence or `\"\"\"`.")
			}
		}
	}
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LiteralStringToken {
	#[token("'")]
	Quote,
	#[regex(r"[^'\r\n]+")]
	Content,
	#[error]
	Error,
}

impl ModeToken for LiteralStringToken {
	fn step(self, _mode: Mode) -> Step {
		match self {
			LiteralStringToken::Quote => {
				Step::Emit(TokenKind::LiteralStringQuote, Transition::Pop(1))
			}
			LiteralStringToken::Content => Step::Emit(TokenKind::StringContent, Transition::Stay),
			LiteralStringToken::Error => Step::Unrecognized(
				"Expected string content or a closing quote (single-line strings can't contain newlines).",
			),
		}
	}
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum MultiLineLiteralStringToken {
	#[regex(r"'+", |lex| lex.slice().len())]
	Apostrophes(usize),
	#[regex(r"[^']+")]
	Content,
	#[error]
	Error,
}

impl ModeToken for MultiLineLiteralStringToken {
	fn step(self, _mode: Mode) -> Step {
		match self {
			MultiLineLiteralStringToken::Apostrophes(count) => {
				quote_run(count, TokenKind::MultiLineLiteralStringQuote)
			}
			MultiLineLiteralStringToken::Content => {
				Step::Emit(TokenKind::StringContent, Transition::Stay)
			}
			MultiLineLiteralStringToken::Error => Step::Unrecognized("Expected `'''`."),
		}
	}
}

/// The time of a date-time that separates date and time with a space.
///
/// Lexed separately since a date may also be followed by a space and a comment.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum SpacedTime {
	#[regex(r"[0-9][0-9]:[0-9][0-9]:[0-9][0-9](\.[0-9]+)?([Zz]|[+\-][0-9][0-9]:[0-9][0-9])")]
	Offset,
	#[regex(r"[0-9][0-9]:[0-9][0-9]:[0-9][0-9](\.[0-9]+)?")]
	Local,
	#[error]
	Error,
}

/// Measures the ` HH:MM:SS…` that turns a local date into a date-time, if `after_date` starts
/// with one.
fn spaced_time(after_date: &str) -> Option<(TokenKind, usize)> {
	let time = after_date.strip_prefix(' ')?;
	let mut lexer = SpacedTime::lexer(time);
	let kind = match lexer.next()? {
		SpacedTime::Offset => TokenKind::OffsetDateTime,
		SpacedTime::Local => TokenKind::LocalDateTime,
		SpacedTime::Error => return None,
	};
	Some((kind, 1 + lexer.span().end))
}

/// Classifies a run of `count` quotes inside a multi-line string that `close` terminates.
///
/// Up to two quotes directly before the closing three belong to the content.
fn quote_run(count: usize, close: TokenKind) -> Step {
	match count {
		1 | 2 => Step::Emit(TokenKind::StringContent, Transition::Stay),
		3..=5 => Step::Emit(close, Transition::Pop(1)),
		_ => Step::Unrecognized("At most two quotes can directly precede the closing delimiter."),
	}
}

/// Runs a fresh automaton of type `T` over `rest` and returns its first (non-skipped) token.
fn lex_step<'a, T>(rest: &'a str, mode: Mode) -> Option<(Step, Range<usize>)>
where
	T: Logos<'a, Source = str> + ModeToken,
	T::Extras: Default,
{
	let mut lexer = T::lexer(rest);
	let token = lexer.next()?;
	Some((token.step(mode), lexer.span()))
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
	offset: usize,
	line: usize,
	column: usize,
}

impl Cursor {
	fn advance_to(&mut self, input: &str, offset: usize) {
		for c in input[self.offset..offset].chars() {
			if c == '\n' {
				self.line += 1;
				self.column = 1;
			} else {
				self.column += 1;
			}
		}
		self.offset = offset;
	}
}

/// An input position no token of the current [`Mode`] matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecognized {
	pub location: Location,
	pub mode: Mode,
	pub caption: &'static str,
}

impl Unrecognized {
	#[must_use]
	pub fn to_diagnostic(&self) -> Diagnostic {
		Diagnostic {
			r#type: DiagnosticType::UnrecognizedToken,
			labels: vec![DiagnosticLabel::new(
				self.caption,
				self.location,
				DiagnosticLabelPriority::Primary,
			)],
		}
	}
}

/// Iterator over the [`Token`]s of a TOML document.
///
/// Stops after the first [`Unrecognized`] position: there is no recovery.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
	input: &'a str,
	modes: Vec<Mode>,
	cursor: Cursor,
	failed: bool,
}

impl<'a> Lexer<'a> {
	#[must_use]
	pub fn new(input: &'a str) -> Self {
		Self {
			input,
			modes: vec![Mode::Top],
			cursor: Cursor {
				offset: 0,
				line: 1,
				column: 1,
			},
			failed: false,
		}
	}

	/// The mode on top of the stack.
	#[must_use]
	pub fn mode(&self) -> Mode {
		self.modes.last().copied().unwrap_or(Mode::Top)
	}

	fn apply(&mut self, transition: Transition) {
		match transition {
			Transition::Stay => (),
			Transition::Push(mode) => {
				log::trace!("push {:?} at {}", mode, self.cursor.offset);
				self.modes.push(mode)
			}
			Transition::Pop(count) => {
				// The bottom `Top` is never popped.
				let len = self.modes.len().saturating_sub(count).max(1);
				log::trace!("pop {:?} at {}", &self.modes[len..], self.cursor.offset);
				self.modes.truncate(len)
			}
			Transition::Replace(mode) => {
				log::trace!(
					"replace {:?} with {:?} at {}",
					self.mode(),
					mode,
					self.cursor.offset
				);
				if self.modes.len() > 1 {
					self.modes.pop();
				}
				self.modes.push(mode)
			}
		}
	}

	/// Input may only end outside of strings.
	fn end_of_input(&mut self, mode: Mode) -> Option<Result<Token<'a>, Unrecognized>> {
		match mode {
			Mode::BasicString
			| Mode::MultiLineBasicString
			| Mode::LiteralString
			| Mode::MultiLineLiteralString => {
				self.failed = true;
				self.cursor.advance_to(self.input, self.input.len());
				Some(Err(Unrecognized {
					location: Location {
						offset: self.cursor.offset,
						line: self.cursor.line,
						column: self.cursor.column,
						length: 0,
					},
					mode,
					caption: "This string is never closed.",
				}))
			}
			_ => None,
		}
	}
}

impl<'a> Iterator for Lexer<'a> {
	type Item = Result<Token<'a>, Unrecognized>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if self.failed {
				return None;
			}

			let base = self.cursor.offset;
			let rest = &self.input[base..];
			let mode = self.mode();
			let next = match mode {
				Mode::Top
				| Mode::Table
				| Mode::TableArrayItem
				| Mode::AfterHeader
				| Mode::InlineTable => lex_step::<KeyToken>(rest, mode),
				Mode::Value | Mode::Array | Mode::InlineValue => lex_step::<ValueToken>(rest, mode),
				Mode::BasicString => lex_step::<BasicStringToken>(rest, mode),
				Mode::MultiLineBasicString => lex_step::<MultiLineBasicStringToken>(rest, mode),
				Mode::LiteralString => lex_step::<LiteralStringToken>(rest, mode),
				Mode::MultiLineLiteralString => {
					lex_step::<MultiLineLiteralStringToken>(rest, mode)
				}
			};
			let (step, span) = match next {
				Some((Step::Emit(TokenKind::LocalDate, transition), span)) => {
					match spaced_time(&rest[span.end..]) {
						Some((kind, length)) => {
							(Step::Emit(kind, transition), span.start..span.end + length)
						}
						None => (Step::Emit(TokenKind::LocalDate, transition), span),
					}
				}
				Some(next) => next,
				None => return self.end_of_input(mode),
			};

			let (start, end) = (base + span.start, base + span.end);
			self.cursor.advance_to(self.input, start);

			match step {
				Step::Emit(kind, transition) => {
					let token = Token {
						kind,
						image: &self.input[start..end],
						offset: start,
						line: self.cursor.line,
						column: self.cursor.column,
						length: end - start,
					};
					self.cursor.advance_to(self.input, end);
					self.apply(transition);
					return Some(Ok(token));
				}
				Step::Skip(transition) => {
					self.cursor.advance_to(self.input, end);
					self.apply(transition);
				}
				Step::Unrecognized(caption) => {
					self.failed = true;
					let length = self.input[start..].chars().next().map_or(0, char::len_utf8);
					return Some(Err(Unrecognized {
						location: Location {
							offset: start,
							line: self.cursor.line,
							column: self.cursor.column,
							length,
						},
						mode,
						caption,
					}));
				}
			}
		}
	}
}

/// Tokenizes `input` completely.
///
/// # Errors
///
/// Iff some part of `input` can't be tokenized. The tokens lexed before that point are returned
/// in the [`Err`] variant and the position is reported via `reporter`.
pub fn tokenize<'a>(
	input: &'a str,
	reporter: &mut impl Reporter,
) -> Result<Vec<Token<'a>>, Vec<Token<'a>>> {
	let mut tokens = vec![];
	for next in Lexer::new(input) {
		match next {
			Ok(token) => tokens.push(token),
			Err(unrecognized) => {
				reporter.report_with(|| unrecognized.to_diagnostic());
				return Err(tokens);
			}
		}
	}
	Ok(tokens)
}
