use cervine::Cow;
use indexmap::IndexMap;
use smartstring::alias::String;
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};
use toml_reader::{
	diagnostics::{DiagnosticGroup, DiagnosticType},
	document::{PlainTable, PlainValue, Value},
	parsing::Scalar,
	read_toml,
};

fn plain(text: &str) -> PlainTable {
	let reading = read_toml(text, false);
	assert!(reading.errors.is_empty(), "{:?}: {:?}", text, reading.errors);
	reading.plain().unwrap().clone()
}

fn failure(text: &str) -> Vec<DiagnosticType> {
	let reading = read_toml(text, false);
	assert_eq!(reading.result, None);
	reading.errors.into_iter().map(|error| error.r#type).collect()
}

fn table<'a>(entries: Vec<(&str, PlainValue<'a>)>) -> PlainValue<'a> {
	PlainValue::Table(
		entries
			.into_iter()
			.map(|(key, value)| (String::from(key), value))
			.collect(),
	)
}

fn string(value: &str) -> PlainValue {
	PlainValue::String(Cow::Borrowed(value))
}

#[test]
fn header_and_keys() {
	let document = plain("title = \"x\"\n[a]\nb = 1\n");
	let mut expected = IndexMap::new();
	expected.insert(String::from("title"), string("x"));
	expected.insert(String::from("a"), table(vec![("b", PlainValue::Integer(1))]));
	assert_eq!(document, expected);
}

#[test]
fn table_array_extension() {
	let document = plain("[[p]]\nx=1\n[[p]]\nx=2\n");
	assert_eq!(
		document["p"],
		PlainValue::Array(vec![
			table(vec![("x", PlainValue::Integer(1))]),
			table(vec![("x", PlainValue::Integer(2))]),
		])
	);
}

#[test]
fn dotted_path_through_value() {
	assert_eq!(failure("a = 1\na.b = 2\n"), vec![DiagnosticType::PathContainsValue]);
}

#[test]
fn heterogeneous_array() {
	let errors = failure("arr = [1, \"two\"]\n");
	assert_eq!(errors, vec![DiagnosticType::HeterogeneousArray]);
	assert_eq!(errors[0].title, "Elements in array are not of the same type");
}

#[test]
fn unterminated_string() {
	let reading = read_toml("a = \"unterminated\n", false);
	assert_eq!(reading.result, None);
	assert_eq!(reading.errors.len(), 1);
	assert_eq!(reading.errors[0].group(), DiagnosticGroup::Lexing);
}

#[test]
fn table_then_table_array() {
	let errors = failure("[x]\n[[x]]\n");
	assert_eq!(errors, vec![DiagnosticType::TableNotTableArray]);
	assert_eq!(
		errors[0].title,
		"Path has already been initialized to a table, not an array table"
	);
}

#[test]
fn redefinitions() {
	assert_eq!(failure("a = 1\na = 2\n"), vec![DiagnosticType::KeyAlreadyInitialized]);
	assert_eq!(failure("[tbl]\n[tbl]\n"), vec![DiagnosticType::TableAlreadyInitialized]);
}

#[test]
fn implicit_tables_remain_declarable() {
	assert_eq!(
		plain("a.b = 1\n[a]\nc = 2\n")["a"],
		table(vec![
			("b", PlainValue::Integer(1)),
			("c", PlainValue::Integer(2)),
		])
	);
}

#[test]
fn static_table_array() {
	assert_eq!(failure("arr = [1,2]\n[[arr]]\n"), vec![DiagnosticType::StaticTableArray]);
}

#[test]
fn arrays() {
	let document = plain("a = [1, 2, 3]\nb = []\nc = [\n  \"x\",\n  \"y\", # comment\n]\n");
	assert_eq!(
		document["a"],
		PlainValue::Array(vec![
			PlainValue::Integer(1),
			PlainValue::Integer(2),
			PlainValue::Integer(3),
		])
	);
	assert_eq!(document["b"], PlainValue::Array(vec![]));
	assert_eq!(document["c"], PlainValue::Array(vec![string("x"), string("y")]));
}

#[test]
fn atoms() {
	let document = plain(
		r#"int = +1_000
hex = 0xDEAD_beef
oct = 0o755
bin = 0b1101
float = -6.25e-2
nan = nan
inf = -inf
bool = false
basic = "tab\there \u00E9"
literal = 'C:\Users\nodejs'
multi = """
Roses are red
Violets are blue"""
trimmed = """\
    The quick \
    brown fox."""
raw = '''
first line
  second line'''
odt = 1979-05-27T07:32:00-07:00
ldt = 1979-05-27T07:32:00.5
ld = 1979-05-27
lt = 07:32:00
"#,
	);

	assert_eq!(document["int"], PlainValue::Integer(1000));
	assert_eq!(document["hex"], PlainValue::Integer(0xdead_beef));
	assert_eq!(document["oct"], PlainValue::Integer(0o755));
	assert_eq!(document["bin"], PlainValue::Integer(0b1101));
	assert_eq!(document["float"], PlainValue::Float(-0.0625));
	assert!(matches!(document["nan"], PlainValue::Float(value) if value.is_nan()));
	assert_eq!(document["inf"], PlainValue::Float(f64::NEG_INFINITY));
	assert_eq!(document["bool"], PlainValue::Boolean(false));
	assert_eq!(document["basic"], string("tab\there \u{E9}"));
	assert_eq!(document["literal"], string(r"C:\Users\nodejs"));
	assert_eq!(document["multi"], string("Roses are red\nViolets are blue"));
	assert_eq!(document["trimmed"], string("The quick brown fox."));
	assert_eq!(document["raw"], string("first line\n  second line"));

	let date = Date::from_calendar_date(1979, Month::May, 27).unwrap();
	let time = Time::from_hms(7, 32, 0).unwrap();
	assert_eq!(
		document["odt"],
		PlainValue::OffsetDateTime(
			PrimitiveDateTime::new(date, time).assume_offset(UtcOffset::from_hms(-7, 0, 0).unwrap())
		)
	);
	assert_eq!(
		document["ldt"],
		PlainValue::LocalDateTime(PrimitiveDateTime::new(
			date,
			Time::from_hms_milli(7, 32, 0, 500).unwrap()
		))
	);
	assert_eq!(document["ld"], PlainValue::LocalDate(date));
	assert_eq!(document["lt"], PlainValue::LocalTime(time));
}

#[test]
fn full_values_keep_images() {
	let text = "a = 0x_ff\nb = 1_0\nc = 'x'\nd = { e = [1979-05-27] }\n";
	let reading = read_toml(text, true);
	// `0x_ff` isn't a valid hexadecimal integer.
	assert!(reading.result.is_none());

	let text = "b = 1_0\nc = 'x'\nd = { e = [1979-05-27] }\n";
	let reading = read_toml(text, true);
	let document = reading.full().unwrap();

	let b = document.get("b").and_then(Value::as_atom).unwrap();
	assert_eq!(b.image, "1_0");
	assert_eq!(b.value, Scalar::Integer(10));

	let c = document.get("c").and_then(Value::as_atom).unwrap();
	assert_eq!(c.image, "'x'");

	let e = document.get_path(&["d", "e"]).and_then(Value::as_array).unwrap();
	assert_eq!(e[0].as_atom().unwrap().image, "1979-05-27");
}

#[test]
fn flattened_output_has_no_wrappers() {
	let document = plain("[a]\nb = { c = [{ d = 1 }] }\n");
	fn check(value: &PlainValue) {
		match value {
			PlainValue::Table(table) => {
				assert!(!table.contains_key("type"));
				assert!(!table.contains_key("content"));
				table.values().for_each(check);
			}
			PlainValue::Array(array) => array.iter().for_each(check),
			_ => (),
		}
	}
	document.values().for_each(check);
}

#[test]
fn key_order_is_preserved() {
	let document = plain("z = 1\na = 2\nm = 3\n");
	assert_eq!(
		document.keys().map(|key| key.as_str()).collect::<Vec<_>>(),
		vec!["z", "a", "m"]
	);
}

#[test]
fn readings_are_independent() {
	let first = read_toml("[a]\n", false);
	let second = read_toml("[a]\n", false);
	assert!(first.is_ok());
	assert!(second.is_ok());
}

#[test]
fn atoms_before_comments() {
	let document = plain(
		"d = 1979-05-27 # c\nt = 07:32:00 # c\ns = 1979-05-27 \nldt = 1979-05-27 07:32:00 # c\narr = [1979-05-27 , 1979-05-28]\n",
	);
	let date = Date::from_calendar_date(1979, Month::May, 27).unwrap();
	let time = Time::from_hms(7, 32, 0).unwrap();
	assert_eq!(document["d"], PlainValue::LocalDate(date));
	assert_eq!(document["t"], PlainValue::LocalTime(time));
	assert_eq!(document["s"], PlainValue::LocalDate(date));
	assert_eq!(
		document["ldt"],
		PlainValue::LocalDateTime(PrimitiveDateTime::new(date, time))
	);
	assert_eq!(
		document["arr"],
		PlainValue::Array(vec![
			PlainValue::LocalDate(date),
			PlainValue::LocalDate(Date::from_calendar_date(1979, Month::May, 28).unwrap()),
		])
	);
}

#[test]
fn quotes_in_multi_line_strings() {
	let document = plain(
		r#"a = """a"b"""
b = """"q"""
c = """q""""
d = """x""y"""""
e = '''it's'''
f = ''''q''''
g = ""
h = ''
"#,
	);
	assert_eq!(document["a"], string("a\"b"));
	assert_eq!(document["b"], string("\"q"));
	assert_eq!(document["c"], string("q\""));
	assert_eq!(document["d"], string("x\"\"y\"\""));
	assert_eq!(document["e"], string("it's"));
	assert_eq!(document["f"], string("'q'"));
	assert_eq!(document["g"], string(""));
	assert_eq!(document["h"], string(""));

	assert_eq!(
		failure("a = \"\"\"x\"\"\"\"\"\"\n"),
		vec![DiagnosticType::UnrecognizedToken]
	);
}

#[test]
fn input_ends_inside_string() {
	let reading = read_toml("a = \"unterminated", false);
	assert_eq!(reading.result, None);
	assert_eq!(reading.errors.len(), 1);
	assert_eq!(reading.errors[0].r#type, DiagnosticType::UnrecognizedToken);
	assert_eq!(reading.errors[0].group(), DiagnosticGroup::Lexing);
}

#[test]
fn headers_end_their_line() {
	assert_eq!(failure("[a] b = 1\n"), vec![DiagnosticType::UnrecognizedToken]);
	assert_eq!(failure("[[a]] b = 1\n"), vec![DiagnosticType::UnrecognizedToken]);
	assert_eq!(
		plain("[a] # c\nb = 1\n")["a"],
		table(vec![("b", PlainValue::Integer(1))])
	);
}

#[test]
fn deep_nesting() {
	let text = format!("a = {}", "[".repeat(200_000));
	assert_eq!(failure(&text), vec![DiagnosticType::NestingTooDeep]);

	let text = format!("a = {}{}\n", "[".repeat(100), "]".repeat(100));
	assert!(read_toml(&text, false).is_ok());
}
