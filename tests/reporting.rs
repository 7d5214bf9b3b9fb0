use toml_reader::{
	diagnostics::{
		Diagnostic, DiagnosticGroup, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticLevel,
		DiagnosticType, Location,
	},
	read_toml,
};

fn errors(text: &str) -> Vec<Diagnostic> {
	let reading = read_toml(text, false);
	assert_eq!(reading.result, None);
	reading.errors
}

fn location(offset: usize, line: usize, column: usize, length: usize) -> Location {
	Location {
		offset,
		line,
		column,
		length,
	}
}

#[test]
fn unterminated_string() {
	let diagnostics = errors("a = \"unterminated\n");
	assert_eq!(
		diagnostics.as_slice(),
		&[Diagnostic {
			r#type: DiagnosticType::UnrecognizedToken,
			labels: vec![DiagnosticLabel::new(
				"Expected string content, an escape sequence or a closing quote (single-line strings can't contain newlines).",
				location(17, 1, 18, 1),
				DiagnosticLabelPriority::Primary,
			)]
		}]
	);
	assert_eq!(diagnostics[0].code(), "TOML-L0000");
	assert_eq!(diagnostics[0].group(), DiagnosticGroup::Lexing);
	assert_eq!(diagnostics[0].level(), DiagnosticLevel::Error);
}

#[test]
fn key_redefinition() {
	let diagnostics = errors("a = 1\n\n  a = 2\n");
	assert_eq!(
		diagnostics.as_slice(),
		&[Diagnostic {
			r#type: DiagnosticType::KeyAlreadyInitialized,
			labels: vec![DiagnosticLabel::new(
				"This key was assigned before.",
				location(9, 3, 3, 1),
				DiagnosticLabelPriority::Primary,
			)]
		}]
	);
	assert_eq!(diagnostics[0].code(), "TOML-S0001");
	assert_eq!(
		diagnostics[0].message(),
		"Path has already been initialized to some value"
	);
}

#[test]
fn quoted_header_redefinition() {
	let diagnostics = errors("[\"tbl\"]\n[\"tbl\"]\n");
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].r#type, DiagnosticType::TableAlreadyInitialized);
	// Quoted keys are reported including their quotes.
	assert_eq!(diagnostics[0].location(), Some(location(9, 2, 2, 5)));
}

#[test]
fn heterogeneous_array_labels() {
	let diagnostics = errors("arr = [1, \"two\"]\n");
	assert_eq!(
		diagnostics.as_slice(),
		&[Diagnostic {
			r#type: DiagnosticType::HeterogeneousArray,
			labels: vec![
				DiagnosticLabel::new(
					"This array's elements must all share the first element's type...",
					location(6, 1, 7, 1),
					DiagnosticLabelPriority::Primary,
				),
				DiagnosticLabel::new(
					"...but this one doesn't.",
					location(10, 1, 11, 5),
					DiagnosticLabelPriority::Auxiliary,
				),
			]
		}]
	);
	assert_eq!(diagnostics[0].code(), "TOML-S0006");
}

#[test]
fn syntax_errors() {
	let diagnostics = errors("a = 1\nb = ]\n");
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].r#type, DiagnosticType::ExpectedValue);
	assert_eq!(diagnostics[0].group(), DiagnosticGroup::Parsing);
	assert_eq!(diagnostics[0].location(), Some(location(10, 2, 5, 1)));

	let diagnostics = errors("n = 9223372036854775808\n");
	assert_eq!(diagnostics[0].r#type, DiagnosticType::IntegerOutOfRange);
	assert_eq!(diagnostics[0].code(), "TOML-P0010");

	let diagnostics = errors("d = 2021-02-29\n");
	assert_eq!(diagnostics[0].r#type, DiagnosticType::InvalidDateTime);
}

#[test]
fn display() {
	let diagnostics = errors("[x]\n[[x]]\n");
	assert_eq!(
		diagnostics[0].to_string(),
		"2:3: TOML-S0003 Path has already been initialized to a table, not an array table (This path was declared as a table before.)"
	);
}

#[test]
fn columns_count_characters() {
	let diagnostics = errors("\"ä\" = 1\n\"ä\" = 2\n");
	assert_eq!(diagnostics[0].r#type, DiagnosticType::KeyAlreadyInitialized);
	assert_eq!(diagnostics[0].location(), Some(location(9, 2, 1, 4)));
}
