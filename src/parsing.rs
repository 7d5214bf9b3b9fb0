//! Recursive descent from [`Token`]s to a flat list of top-level [`Entry`]s.

use crate::{
	datetime,
	diagnostics::{Diagnostic, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticType, Reporter},
	token::{quoting, Token, TokenKind},
};
use cervine::Cow;
use enum_properties::enum_properties;
use smartstring::alias::String;
use std::{iter::Peekable, ops::Deref};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub struct ValueTypeProperties {
	pub name: &'static str,
}

enum_properties! {
	/// The discriminant shared by all elements of a well-formed array.
	#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
	pub enum ValueType: ValueTypeProperties {
		OffsetDateTime { name: "offsetDateTime" },
		LocalDateTime { name: "localDateTime" },
		LocalDate { name: "localDate" },
		LocalTime { name: "localTime" },
		String { name: "string" },
		Integer { name: "integer" },
		Float { name: "float" },
		NotANumber { name: "notANumber" },
		Infinity { name: "infinity" },
		Boolean { name: "boolean" },
		Array { name: "array" },
		InlineTable { name: "inlineTable" },
		Table { name: "table" },
	}
}

/// The native value of an atom.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
	OffsetDateTime(OffsetDateTime),
	LocalDateTime(PrimitiveDateTime),
	LocalDate(Date),
	LocalTime(Time),
	String(Cow<'a, String, str>),
	Integer(i64),
	Float(f64),
	NotANumber(f64),
	Infinity(f64),
	Boolean(bool),
}

impl<'a> Scalar<'a> {
	#[must_use]
	pub fn value_type(&self) -> ValueType {
		match self {
			Scalar::OffsetDateTime(_) => ValueType::OffsetDateTime,
			Scalar::LocalDateTime(_) => ValueType::LocalDateTime,
			Scalar::LocalDate(_) => ValueType::LocalDate,
			Scalar::LocalTime(_) => ValueType::LocalTime,
			Scalar::String(_) => ValueType::String,
			Scalar::Integer(_) => ValueType::Integer,
			Scalar::Float(_) => ValueType::Float,
			Scalar::NotANumber(_) => ValueType::NotANumber,
			Scalar::Infinity(_) => ValueType::Infinity,
			Scalar::Boolean(_) => ValueType::Boolean,
		}
	}
}

/// An atomic value together with the exact source text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom<'a> {
	pub image: &'a str,
	pub value: Scalar<'a>,
	pub token: Token<'a>,
}

impl<'a> Atom<'a> {
	#[must_use]
	pub fn value_type(&self) -> ValueType {
		self.value.value_type()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode<'a> {
	pub contents: Vec<ValueNode<'a>>,
	/// The opening bracket.
	pub token: Token<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineTableNode<'a> {
	pub bindings: Vec<KeysValue<'a>>,
	/// The opening brace.
	pub token: Token<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode<'a> {
	Atom(Atom<'a>),
	Array(ArrayNode<'a>),
	InlineTable(InlineTableNode<'a>),
}

impl<'a> ValueNode<'a> {
	#[must_use]
	pub fn value_type(&self) -> ValueType {
		match self {
			ValueNode::Atom(atom) => atom.value_type(),
			ValueNode::Array(_) => ValueType::Array,
			ValueNode::InlineTable(_) => ValueType::InlineTable,
		}
	}

	#[must_use]
	pub fn token(&self) -> Token<'a> {
		match self {
			ValueNode::Atom(Atom { token, .. })
			| ValueNode::Array(ArrayNode { token, .. })
			| ValueNode::InlineTable(InlineTableNode { token, .. }) => *token,
		}
	}
}

/// One segment of a dotted key. Quoted segments are unescaped.
#[derive(Clone, Debug, PartialEq)]
pub struct Key<'a> {
	pub name: Cow<'a, String, str>,
	/// Covers the quotes, if any.
	pub token: Token<'a>,
}

impl<'a> Deref for Key<'a> {
	type Target = str;
	fn deref(&self) -> &Self::Target {
		self.name.as_ref()
	}
}

impl<'a> AsRef<str> for Key<'a> {
	fn as_ref(&self) -> &str {
		self.name.as_ref()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeysValue<'a> {
	pub keys: Vec<Key<'a>>,
	pub value: ValueNode<'a>,
	/// The first key segment.
	pub token: Token<'a>,
}

/// `[a.b.c]`
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader<'a> {
	pub headers: Vec<Key<'a>>,
	pub token: Token<'a>,
}

/// `[[a.b.c]]`
#[derive(Debug, Clone, PartialEq)]
pub struct TableArrayEntryHeader<'a> {
	pub headers: Vec<Key<'a>>,
	pub token: Token<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<'a> {
	KeysValue(KeysValue<'a>),
	TableHeader(TableHeader<'a>),
	TableArrayEntryHeader(TableArrayEntryHeader<'a>),
}

fn err<T>(
	r#type: DiagnosticType,
	caption: &'static str,
	token: Option<Token>,
	reporter: &mut impl Reporter,
) -> Result<T, ()> {
	reporter.report_with(|| Diagnostic {
		r#type,
		labels: vec![DiagnosticLabel::new(
			caption,
			token.map(Into::into),
			DiagnosticLabelPriority::Primary,
		)],
	});
	Err(())
}

/// How deeply arrays and inline tables may nest inside each other.
pub const MAX_NESTING_DEPTH: usize = 128;

fn peek_kind<'a>(iter: &mut Peekable<impl Iterator<Item = Token<'a>>>) -> Option<TokenKind> {
	iter.peek().map(|t| t.kind)
}

/// Parses TOML tokens into the document's top-level entries, in source order.
///
/// `source` must be the text `tokens` were lexed from.
/// Any errors are reported via `reporter`.
///
/// # Errors
///
/// Iff the token stream doesn't match the grammar. Parsing stops at the first error.
pub fn parse<'a>(
	source: &'a str,
	tokens: &[Token<'a>],
	reporter: &mut impl Reporter,
) -> Result<Vec<Entry<'a>>, ()> {
	let mut iter = tokens.iter().copied().peekable();
	let mut entries = vec![];

	while let Some(next) = iter.peek().copied() {
		entries.push(match next.kind {
			TokenKind::BareKey | TokenKind::BasicStringQuote | TokenKind::LiteralStringQuote => {
				Entry::KeysValue(parse_keys_value(source, &mut iter, 0, reporter)?)
			}

			TokenKind::TableOpen => {
				let token = iter.next().unwrap_or(next);
				let headers = parse_keys(source, &mut iter, reporter)?;
				if peek_kind(&mut iter) == Some(TokenKind::TableClose) {
					iter.next();
				} else {
					return err(
						DiagnosticType::UnclosedTableHeader,
						"Expected `]` or `.` here.",
						iter.next(),
						reporter,
					);
				}
				Entry::TableHeader(TableHeader { headers, token })
			}

			TokenKind::TableArrayOpen => {
				let token = iter.next().unwrap_or(next);
				let headers = parse_keys(source, &mut iter, reporter)?;
				if peek_kind(&mut iter) == Some(TokenKind::TableArrayClose) {
					iter.next();
				} else {
					return err(
						DiagnosticType::UnclosedTableArrayHeader,
						"Expected `]]` or `.` here.",
						iter.next(),
						reporter,
					);
				}
				Entry::TableArrayEntryHeader(TableArrayEntryHeader { headers, token })
			}

			_ => {
				return err(
					DiagnosticType::ExpectedEntry,
					"Lines must start with a key, `[` or `[[`.",
					Some(next),
					reporter,
				)
			}
		})
	}

	Ok(entries)
}

fn parse_keys_value<'a>(
	source: &'a str,
	iter: &mut Peekable<impl Iterator<Item = Token<'a>>>,
	depth: usize,
	reporter: &mut impl Reporter,
) -> Result<KeysValue<'a>, ()> {
	let keys = parse_keys(source, iter, reporter)?;
	if peek_kind(iter) == Some(TokenKind::Equals) {
		iter.next();
	} else {
		return err(
			DiagnosticType::ExpectedEquals,
			"Expected `=` or `.` here.",
			iter.next(),
			reporter,
		);
	}
	let value = parse_value(source, iter, depth, reporter)?;
	Ok(KeysValue {
		token: keys[0].token,
		keys,
		value,
	})
}

/// Parses one or more `.`-separated key segments. The result is never empty.
fn parse_keys<'a>(
	source: &'a str,
	iter: &mut Peekable<impl Iterator<Item = Token<'a>>>,
	reporter: &mut impl Reporter,
) -> Result<Vec<Key<'a>>, ()> {
	let mut keys = vec![parse_key(source, iter, reporter)?];
	while peek_kind(iter) == Some(TokenKind::Dot) {
		iter.next();
		keys.push(parse_key(source, iter, reporter)?);
	}
	Ok(keys)
}

fn parse_key<'a>(
	source: &'a str,
	iter: &mut Peekable<impl Iterator<Item = Token<'a>>>,
	reporter: &mut impl Reporter,
) -> Result<Key<'a>, ()> {
	match iter.next() {
		Some(token) if token.kind == TokenKind::BareKey => Ok(Key {
			name: Cow::Borrowed(token.image),
			token,
		}),
		Some(open)
			if matches!(
				open.kind,
				TokenKind::BasicStringQuote | TokenKind::LiteralStringQuote
			) =>
		{
			let (name, token) = parse_string(source, open, iter, reporter)?;
			Ok(Key { name, token })
		}
		next => err(
			DiagnosticType::ExpectedKey,
			"Expected a bare or quoted key here.",
			next,
			reporter,
		),
	}
}

/// `depth` counts the arrays and inline tables around the value.
fn parse_value<'a>(
	source: &'a str,
	iter: &mut Peekable<impl Iterator<Item = Token<'a>>>,
	depth: usize,
	reporter: &mut impl Reporter,
) -> Result<ValueNode<'a>, ()> {
	let token = match iter.next() {
		Some(token) => token,
		None => {
			return err(
				DiagnosticType::ExpectedValue,
				"Expected a value before the end of input.",
				None,
				reporter,
			)
		}
	};

	if depth >= MAX_NESTING_DEPTH
		&& matches!(
			token.kind,
			TokenKind::ArrayOpen | TokenKind::InlineTableOpen
		) {
		return err(
			DiagnosticType::NestingTooDeep,
			"This value is nested too deeply.",
			Some(token),
			reporter,
		);
	}

	Ok(match token.kind {
		TokenKind::OffsetDateTime
		| TokenKind::LocalDateTime
		| TokenKind::LocalDate
		| TokenKind::LocalTime
		| TokenKind::Integer
		| TokenKind::HexInteger
		| TokenKind::OctalInteger
		| TokenKind::BinaryInteger
		| TokenKind::Float
		| TokenKind::Infinity
		| TokenKind::NotANumber
		| TokenKind::Boolean => ValueNode::Atom(parse_atom(token, reporter)?),

		TokenKind::BasicStringQuote
		| TokenKind::MultiLineBasicStringQuote
		| TokenKind::LiteralStringQuote
		| TokenKind::MultiLineLiteralStringQuote => {
			let (value, token) = parse_string(source, token, iter, reporter)?;
			ValueNode::Atom(Atom {
				image: token.image,
				value: Scalar::String(value),
				token,
			})
		}

		TokenKind::ArrayOpen => {
			let mut contents = vec![];
			loop {
				match peek_kind(iter) {
					Some(TokenKind::ArrayClose) => {
						iter.next();
						break;
					}
					Some(_) => (),
					None => {
						return err(
							DiagnosticType::UnclosedArray,
							"This array is never closed.",
							Some(token),
							reporter,
						)
					}
				}

				contents.push(parse_value(source, iter, depth + 1, reporter)?);

				match peek_kind(iter) {
					Some(TokenKind::Comma) => {
						iter.next();
					}
					Some(TokenKind::ArrayClose) => (),
					_ => {
						return err(
							DiagnosticType::UnclosedArray,
							"Expected `,` or `]` here.",
							iter.next().or(Some(token)),
							reporter,
						)
					}
				}
			}
			ValueNode::Array(ArrayNode { contents, token })
		}

		TokenKind::InlineTableOpen => {
			let mut bindings = vec![];
			if peek_kind(iter) == Some(TokenKind::InlineTableClose) {
				iter.next();
			} else {
				loop {
					bindings.push(parse_keys_value(source, iter, depth + 1, reporter)?);
					match iter.next() {
						Some(Token {
							kind: TokenKind::Comma,
							..
						}) => (),
						Some(Token {
							kind: TokenKind::InlineTableClose,
							..
						}) => break,
						next => {
							return err(
								DiagnosticType::UnclosedInlineTable,
								"Expected `,` or `}` here.",
								next.or(Some(token)),
								reporter,
							)
						}
					}
				}
			}
			ValueNode::InlineTable(InlineTableNode { bindings, token })
		}

		_ => {
			return err(
				DiagnosticType::ExpectedValue,
				"Expected a string, number, boolean, date-time, array or inline table here.",
				Some(token),
				reporter,
			)
		}
	})
}

fn parse_integer(digits: &str, radix: u32) -> Option<i64> {
	i64::from_str_radix(AsRef::<str>::as_ref(&quoting::strip_underscores(digits)), radix).ok()
}

fn parse_atom<'a>(token: Token<'a>, reporter: &mut impl Reporter) -> Result<Atom<'a>, ()> {
	let image = token.image;
	let negative = image.starts_with('-');

	let value = match token.kind {
		TokenKind::Integer
		| TokenKind::HexInteger
		| TokenKind::OctalInteger
		| TokenKind::BinaryInteger => {
			let parsed = match token.kind {
				TokenKind::HexInteger => parse_integer(&image[2..], 16),
				TokenKind::OctalInteger => parse_integer(&image[2..], 8),
				TokenKind::BinaryInteger => parse_integer(&image[2..], 2),
				_ => parse_integer(image, 10),
			};
			match parsed {
				Some(integer) => Scalar::Integer(integer),
				None => {
					return err(
						DiagnosticType::IntegerOutOfRange,
						"Integers must fit into 64 signed bits.",
						Some(token),
						reporter,
					)
				}
			}
		}

		TokenKind::Float => match AsRef::<str>::as_ref(&quoting::strip_underscores(image)).parse() {
			Ok(float) => Scalar::Float(float),
			Err(_) => {
				return err(
					DiagnosticType::ExpectedValue,
					"This float literal can't be represented.",
					Some(token),
					reporter,
				)
			}
		},
		TokenKind::Infinity => Scalar::Infinity(if negative {
			f64::NEG_INFINITY
		} else {
			f64::INFINITY
		}),
		TokenKind::NotANumber => Scalar::NotANumber(if negative { -f64::NAN } else { f64::NAN }),
		TokenKind::Boolean => Scalar::Boolean(image == "true"),

		TokenKind::OffsetDateTime
		| TokenKind::LocalDateTime
		| TokenKind::LocalDate
		| TokenKind::LocalTime => {
			let parsed = match token.kind {
				TokenKind::OffsetDateTime => {
					datetime::offset_date_time(image).map(Scalar::OffsetDateTime)
				}
				TokenKind::LocalDateTime => {
					datetime::local_date_time(image).map(Scalar::LocalDateTime)
				}
				TokenKind::LocalDate => datetime::local_date(image).map(Scalar::LocalDate),
				_ => datetime::local_time(image).map(Scalar::LocalTime),
			};
			match parsed {
				Some(value) => value,
				None => {
					return err(
						DiagnosticType::InvalidDateTime,
						"A component of this date or time is out of range.",
						Some(token),
						reporter,
					)
				}
			}
		}

		kind => unreachable!("{:?} is not an atom token", kind),
	};

	Ok(Atom {
		image,
		value,
		token,
	})
}

fn push_borrowed<'a>(value: &mut Cow<'a, String, str>, piece: &'a str) {
	if piece.is_empty() {
		return;
	}
	let extended = match value {
		Cow::Owned(owned) => {
			owned.push_str(piece);
			return;
		}
		Cow::Borrowed(borrowed) if borrowed.is_empty() => Cow::Borrowed(piece),
		Cow::Borrowed(borrowed) => {
			let mut owned = String::from(*borrowed);
			owned.push_str(piece);
			Cow::Owned(owned)
		}
	};
	*value = extended;
}

fn push_char(value: &mut Cow<'_, String, str>, c: char) {
	let extended = match value {
		Cow::Owned(owned) => {
			owned.push(c);
			return;
		}
		Cow::Borrowed(borrowed) => {
			let mut owned = String::from(*borrowed);
			owned.push(c);
			Cow::Owned(owned)
		}
	};
	*value = extended;
}

/// Parses the body of a string after its opening quote `open`, up to and including the closing
/// quote.
///
/// Returns the unescaped contents and a token that spans the whole literal, quotes included.
fn parse_string<'a>(
	source: &'a str,
	open: Token<'a>,
	iter: &mut Peekable<impl Iterator<Item = Token<'a>>>,
	reporter: &mut impl Reporter,
) -> Result<(Cow<'a, String, str>, Token<'a>), ()> {
	let multi_line = matches!(
		open.kind,
		TokenKind::MultiLineBasicStringQuote | TokenKind::MultiLineLiteralStringQuote
	);

	// `""` and `''` are lexed as a single token.
	if open.length == 2 {
		return Ok((Cow::Borrowed(""), open));
	}

	let mut value = Cow::Borrowed("");
	let mut first = true;
	let close = loop {
		let token = match iter.next() {
			Some(token) => token,
			None => {
				return err(
					DiagnosticType::UnclosedString,
					"This string is never closed.",
					Some(open),
					reporter,
				)
			}
		};
		match token.kind {
			TokenKind::StringContent if first && multi_line => {
				push_borrowed(&mut value, quoting::trim_leading_newline(token.image))
			}
			TokenKind::StringContent => push_borrowed(&mut value, token.image),
			TokenKind::Escape => match quoting::unescape(token.image) {
				Some(c) => push_char(&mut value, c),
				None => {
					return err(
						DiagnosticType::InvalidEscape,
						"Escaped code points must be Unicode scalar values.",
						Some(token),
						reporter,
					)
				}
			},
			kind if kind == open.kind => {
				// Up to two quotes directly before a multi-line closer are content.
				push_borrowed(&mut value, &token.image[open.length..]);
				break token;
			}
			_ => {
				return err(
					DiagnosticType::UnclosedString,
					"Expected string content or the closing quote here.",
					Some(token),
					reporter,
				)
			}
		}
		first = false;
	};

	let end = close.end();
	Ok((
		value,
		Token {
			image: &source[open.offset..end],
			length: end - open.offset,
			..open
		},
	))
}
