use {cervine::Cow, smartstring::alias::String};

pub enum TransformedPart {
	Unchanged,
	Changed(String),
}

pub trait Transform {
	/// Rewrites `self` piecewise, copying only once the first [`TransformedPart::Changed`] appears.
	fn transform(
		&self,
		transform_next: impl FnMut(&mut &str) -> TransformedPart,
	) -> Cow<String, str>;
}

impl Transform for str {
	fn transform(
		&self,
		mut transform_next: impl FnMut(&mut &str) -> TransformedPart,
	) -> Cow<String, str> {
		let mut rest = self;
		let mut copied = loop {
			if rest.is_empty() {
				return Cow::Borrowed(self);
			}
			let rest_len = rest.len();
			if let TransformedPart::Changed(transformed) = transform_next(&mut rest) {
				let mut copied = String::from(&self[..self.len() - rest_len]);
				copied.push_str(&transformed);
				break copied;
			}
		};

		while !rest.is_empty() {
			let unchanged_rest = rest;
			match transform_next(&mut rest) {
				TransformedPart::Unchanged => {
					copied.push_str(&unchanged_rest[..unchanged_rest.len() - rest.len()]);
				}
				TransformedPart::Changed(changed) => copied.push_str(&changed),
			}
		}

		Cow::Owned(copied)
	}
}

/// Removes the digit separators of a numeric literal.
pub fn strip_underscores(literal: &str) -> Cow<String, str> {
	literal.transform(|rest| {
		let c = rest.chars().next().unwrap_or_default();
		*rest = &rest[c.len_utf8()..];
		if c == '_' {
			TransformedPart::Changed(String::new())
		} else {
			TransformedPart::Unchanged
		}
	})
}

/// Decodes a single escape sequence as lexed inside basic strings, e.g. `\n` or `\u00E9`.
///
/// Returns [`None`] for `\u`/`\U` escapes that aren't Unicode scalar values.
pub fn unescape(escape: &str) -> Option<char> {
	let mut chars = escape.chars();
	if chars.next() != Some('\\') {
		return None;
	}
	match chars.next()? {
		'b' => Some('\u{8}'),
		't' => Some('\t'),
		'n' => Some('\n'),
		'f' => Some('\u{C}'),
		'r' => Some('\r'),
		'"' => Some('"'),
		'\\' => Some('\\'),
		'u' | 'U' => u32::from_str_radix(chars.as_str(), 16)
			.ok()
			.and_then(char::from_u32),
		_ => None,
	}
}

/// Strips a newline directly following the opening delimiter of a multi-line string.
pub fn trim_leading_newline(content: &str) -> &str {
	content
		.strip_prefix("\r\n")
		.or_else(|| content.strip_prefix('\n'))
		.unwrap_or(content)
}
