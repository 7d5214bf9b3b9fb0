//! Reduction of parsed [`Entry`]s into a nested [`Table`] tree, enforcing TOML's definition rules.
//!
//! Tables and arrays live in arenas while the document is built, so the bookkeeping of which
//! tables were declared directly and which arrays were declared by `[[…]]` headers is keyed by
//! identity (arena index) rather than by content: two empty tables are never the same table.

use crate::{
	diagnostics::{
		Diagnostic, DiagnosticLabel, DiagnosticLabelPriority, DiagnosticType, Location, Reporter,
	},
	parsing::{Atom, Entry, Key, Scalar, ValueNode, ValueType},
	token::Token,
};
use cervine::Cow;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::{collections::HashSet, mem};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use try_match::try_match;

/// A table with its `{ type: "table", content }` shape retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table<'a> {
	pub content: IndexMap<String, Value<'a>>,
}

/// A fully typed value: atoms keep their source image.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
	Atom(Atom<'a>),
	/// Both plain arrays and arrays of tables.
	Array(Vec<Value<'a>>),
	Table(Table<'a>),
}

impl<'a> Value<'a> {
	#[must_use]
	pub fn value_type(&self) -> ValueType {
		match self {
			Value::Atom(atom) => atom.value_type(),
			Value::Array(_) => ValueType::Array,
			Value::Table(_) => ValueType::Table,
		}
	}

	#[must_use]
	pub fn as_atom(&self) -> Option<&Atom<'a>> {
		match self {
			Value::Atom(atom) => Some(atom),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_array(&self) -> Option<&[Value<'a>]> {
		match self {
			Value::Array(array) => Some(array),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_table(&self) -> Option<&Table<'a>> {
		match self {
			Value::Table(table) => Some(table),
			_ => None,
		}
	}

	/// Drops the typed wrappers, leaving only native values.
	#[must_use]
	pub fn into_plain(self) -> PlainValue<'a> {
		match self {
			Value::Atom(atom) => atom.value.into(),
			Value::Array(array) => {
				PlainValue::Array(array.into_iter().map(Value::into_plain).collect())
			}
			Value::Table(table) => PlainValue::Table(table.into_plain()),
		}
	}
}

impl<'a> Table<'a> {
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value<'a>> {
		self.content.get(key)
	}

	/// Follows `path` through nested tables. Arrays are not entered.
	#[must_use]
	pub fn get_path(&self, path: &[&str]) -> Option<&Value<'a>> {
		let (last, init) = path.split_last()?;
		let mut table = self;
		for key in init {
			table = table.get(key)?.as_table()?;
		}
		table.get(last)
	}

	/// Flattens the typed tree into plain nested maps.
	#[must_use]
	pub fn into_plain(self) -> PlainTable<'a> {
		self.content
			.into_iter()
			.map(|(key, value)| (key, value.into_plain()))
			.collect()
	}
}

pub type PlainTable<'a> = IndexMap<String, PlainValue<'a>>;

/// A native value without source information.
#[derive(Debug, Clone, PartialEq)]
pub enum PlainValue<'a> {
	String(Cow<'a, String, str>),
	Integer(i64),
	/// Includes `nan` and `inf`.
	Float(f64),
	Boolean(bool),
	OffsetDateTime(OffsetDateTime),
	LocalDateTime(PrimitiveDateTime),
	LocalDate(Date),
	LocalTime(Time),
	Array(Vec<PlainValue<'a>>),
	Table(PlainTable<'a>),
}

impl<'a> From<Scalar<'a>> for PlainValue<'a> {
	fn from(scalar: Scalar<'a>) -> Self {
		match scalar {
			Scalar::OffsetDateTime(value) => PlainValue::OffsetDateTime(value),
			Scalar::LocalDateTime(value) => PlainValue::LocalDateTime(value),
			Scalar::LocalDate(value) => PlainValue::LocalDate(value),
			Scalar::LocalTime(value) => PlainValue::LocalTime(value),
			Scalar::String(value) => PlainValue::String(value),
			Scalar::Integer(value) => PlainValue::Integer(value),
			Scalar::Float(value) | Scalar::NotANumber(value) | Scalar::Infinity(value) => {
				PlainValue::Float(value)
			}
			Scalar::Boolean(value) => PlainValue::Boolean(value),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TableId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ArrayId(usize);

#[derive(Debug)]
enum Slot<'a> {
	Atom(Atom<'a>),
	Array(ArrayId),
	Table(TableId),
}

/// What a key currently holds, as far as path resolution cares.
#[derive(Debug, Clone, Copy)]
enum Found {
	Table(TableId),
	/// Any array. Only those in `headers_initialized_table_arrays` can be extended.
	Array(ArrayId),
	Value,
}

#[derive(Debug, Default)]
struct Reducer<'a> {
	tables: Vec<IndexMap<String, Slot<'a>>>,
	arrays: Vec<Vec<Slot<'a>>>,
	directly_initialized_tables: HashSet<TableId>,
	headers_initialized_table_arrays: HashSet<ArrayId>,
}

fn fail<T>(
	r#type: DiagnosticType,
	caption: &'static str,
	token: Token,
	reporter: &mut impl Reporter,
) -> Result<T, ()> {
	reporter.report_with(|| Diagnostic {
		r#type,
		labels: vec![DiagnosticLabel::new(
			caption,
			Location::from(token),
			DiagnosticLabelPriority::Primary,
		)],
	});
	Err(())
}

impl<'a> Reducer<'a> {
	fn new_table(&mut self) -> TableId {
		self.tables.push(IndexMap::new());
		TableId(self.tables.len() - 1)
	}

	fn new_array(&mut self, contents: Vec<Slot<'a>>) -> ArrayId {
		self.arrays.push(contents);
		ArrayId(self.arrays.len() - 1)
	}

	fn find(&self, table: TableId, key: &str) -> Option<Found> {
		Some(match self.tables[table.0].get(key)? {
			Slot::Table(id) => Found::Table(*id),
			Slot::Array(id) => Found::Array(*id),
			Slot::Atom(_) => Found::Value,
		})
	}

	/// The table a path continues into when passing through an array.
	fn last_table(&self, array: ArrayId) -> Option<TableId> {
		try_match!(Some(Slot::Table(id)) = self.arrays[array.0].last() => *id).ok()
	}

	fn insert(&mut self, table: TableId, key: &Key<'a>, slot: Slot<'a>) {
		self.tables[table.0].insert(String::from(&**key), slot);
	}

	/// Finds or creates the table at `names` below `parent`.
	///
	/// Intermediate tables are created implicitly and are never marked as directly initialized.
	/// With `is_array`, the last segment must name a table array declared by headers (or
	/// nothing), and a new table is appended to it.
	fn resolve_path(
		&mut self,
		parent: TableId,
		names: &[Key<'a>],
		is_array: bool,
		directly_initialized: bool,
		reporter: &mut impl Reporter,
	) -> Result<TableId, ()> {
		let (last, intermediate) = match names.split_last() {
			Some(split) => split,
			None => unreachable!("Key paths are never empty."),
		};

		let mut table = parent;
		for key in intermediate {
			let next = match self.find(table, key) {
				Some(Found::Table(id)) => Some(id),
				Some(Found::Array(id)) => self.last_table(id),
				Some(Found::Value) => None,
				None => {
					let id = self.new_table();
					self.insert(table, key, Slot::Table(id));
					Some(id)
				}
			};
			table = match next {
				Some(id) => id,
				None => {
					return fail(
						DiagnosticType::PathContainsValue,
						"This key already holds a value that isn't a table.",
						key.token,
						reporter,
					)
				}
			};
		}

		match self.find(table, last) {
			Some(Found::Value) => fail(
				DiagnosticType::PathContainsValue,
				"This key already holds a value that isn't a table.",
				last.token,
				reporter,
			),

			Some(Found::Table(_)) if is_array => fail(
				DiagnosticType::TableNotTableArray,
				"This path was declared as a table before.",
				last.token,
				reporter,
			),
			Some(Found::Table(id)) => {
				if self.directly_initialized_tables.contains(&id) {
					return fail(
						DiagnosticType::TableAlreadyInitialized,
						"This table was defined before.",
						last.token,
						reporter,
					);
				}
				if directly_initialized {
					self.directly_initialized_tables.insert(id);
				}
				Ok(id)
			}

			Some(Found::Array(_)) if !is_array => fail(
				DiagnosticType::TableArrayNotTable,
				"This path was declared as a table array before.",
				last.token,
				reporter,
			),
			Some(Found::Array(id)) => {
				if !self.headers_initialized_table_arrays.contains(&id) {
					return fail(
						DiagnosticType::StaticTableArray,
						"This array of tables was assigned as a value and can't be extended.",
						last.token,
						reporter,
					);
				}
				let table = self.new_table();
				self.arrays[id.0].push(Slot::Table(table));
				self.directly_initialized_tables.insert(table);
				Ok(table)
			}

			None => {
				let id = self.new_table();
				let slot = if is_array {
					let array = self.new_array(vec![Slot::Table(id)]);
					self.headers_initialized_table_arrays.insert(array);
					Slot::Array(array)
				} else {
					Slot::Table(id)
				};
				self.insert(table, last, slot);
				if directly_initialized {
					self.directly_initialized_tables.insert(id);
				}
				Ok(id)
			}
		}
	}

	/// Binds `value` to the dotted `keys` relative to `table`.
	fn assign_key(
		&mut self,
		table: TableId,
		keys: &[Key<'a>],
		value: Slot<'a>,
		reporter: &mut impl Reporter,
	) -> Result<(), ()> {
		let (last, path) = match keys.split_last() {
			Some(split) => split,
			None => unreachable!("Key paths are never empty."),
		};

		let target = if path.is_empty() {
			table
		} else {
			self.resolve_path(table, path, false, false, reporter)?
		};

		if self.tables[target.0].contains_key(&**last) {
			return fail(
				DiagnosticType::KeyAlreadyInitialized,
				"This key was assigned before.",
				last.token,
				reporter,
			);
		}

		if let Slot::Table(id) = value {
			self.directly_initialized_tables.insert(id);
		}
		self.insert(target, last, value);
		Ok(())
	}

	fn normalize(&mut self, value: ValueNode<'a>, reporter: &mut impl Reporter) -> Result<Slot<'a>, ()> {
		match value {
			ValueNode::Atom(atom) => Ok(Slot::Atom(atom)),

			ValueNode::Array(array) => {
				if let Some(first) = array.contents.first() {
					let expected = first.value_type();
					if let Some(mismatch) = array
						.contents
						.iter()
						.find(|element| element.value_type() != expected)
					{
						reporter.report_with(|| Diagnostic {
							r#type: DiagnosticType::HeterogeneousArray,
							labels: vec![
								DiagnosticLabel::new(
									"This array's elements must all share the first element's type...",
									Location::from(array.token),
									DiagnosticLabelPriority::Primary,
								),
								DiagnosticLabel::new(
									"...but this one doesn't.",
									Location::from(mismatch.token()),
									DiagnosticLabelPriority::Auxiliary,
								),
							],
						});
						return Err(());
					}
				}

				let contents = array
					.contents
					.into_iter()
					.map(|element| self.normalize(element, reporter))
					.collect::<Result<Vec<_>, ()>>()?;
				Ok(Slot::Array(self.new_array(contents)))
			}

			ValueNode::InlineTable(inline_table) => {
				let table = self.new_table();
				for binding in inline_table.bindings {
					let value = self.normalize(binding.value, reporter)?;
					self.assign_key(table, &binding.keys, value, reporter)?;
				}
				Ok(Slot::Table(table))
			}
		}
	}

	fn take_table(&mut self, table: TableId) -> Table<'a> {
		let content = mem::take(&mut self.tables[table.0]);
		Table {
			content: content
				.into_iter()
				.map(|(key, slot)| (key, self.take_value(slot)))
				.collect(),
		}
	}

	fn take_value(&mut self, slot: Slot<'a>) -> Value<'a> {
		match slot {
			Slot::Atom(atom) => Value::Atom(atom),
			Slot::Array(array) => {
				let contents = mem::take(&mut self.arrays[array.0]);
				Value::Array(
					contents
						.into_iter()
						.map(|slot| self.take_value(slot))
						.collect(),
				)
			}
			Slot::Table(table) => Value::Table(self.take_table(table)),
		}
	}
}

/// Builds the document tree from `entries`, in order.
///
/// Any errors are reported via `reporter`.
///
/// # Errors
///
/// Iff any entry redefines, overwrites or mistypes part of the document, or an array isn't
/// homogeneous. The first such error ends the reduction; no partial document is returned.
pub fn reduce<'a>(
	entries: impl IntoIterator<Item = Entry<'a>>,
	reporter: &mut impl Reporter,
) -> Result<Table<'a>, ()> {
	let mut reducer = Reducer::default();
	let root = reducer.new_table();
	let mut current = root;

	for entry in entries {
		match entry {
			Entry::KeysValue(keys_value) => {
				let value = reducer.normalize(keys_value.value, reporter)?;
				reducer.assign_key(current, &keys_value.keys, value, reporter)?;
			}
			Entry::TableHeader(header) => {
				log::debug!("[{}]", DisplayPath(&header.headers));
				current = reducer.resolve_path(root, &header.headers, false, true, reporter)?;
			}
			Entry::TableArrayEntryHeader(header) => {
				log::debug!("[[{}]]", DisplayPath(&header.headers));
				current = reducer.resolve_path(root, &header.headers, true, true, reporter)?;
			}
		}
	}

	Ok(reducer.take_table(root))
}

struct DisplayPath<'a, 'b>(&'b [Key<'a>]);

impl<'a, 'b> std::fmt::Display for DisplayPath<'a, 'b> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (i, key) in self.0.iter().enumerate() {
			if i > 0 {
				write!(f, ".")?;
			}
			write!(f, "{}", key.token.image)?;
		}
		Ok(())
	}
}
