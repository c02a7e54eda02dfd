use std::cell::Cell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::column::{ColumnDef, name_index};
use crate::error::{Error, Result};
use crate::value::Value;

/// Something that names a column: a 1-based position or a column name.
pub trait ColumnRef {
	fn column_index(&self, rows: &dyn Rows) -> Result<usize>;
}

impl ColumnRef for usize {
	fn column_index(&self, _rows: &dyn Rows) -> Result<usize> {
		Ok(*self)
	}
}

impl ColumnRef for &str {
	fn column_index(&self, rows: &dyn Rows) -> Result<usize> {
		rows.find_column(self)
	}
}

impl ColumnRef for String {
	fn column_index(&self, rows: &dyn Rows) -> Result<usize> {
		rows.find_column(self)
	}
}

/// Forward-only read interface shared by live statement cursors and buffered
/// result sets.
///
/// Column positions are 1-based. Every getter records whether the cell it read
/// was null; [`Rows::was_null`] reports the most recent access only. Null cells
/// read as the getter's zero or empty value.
pub trait Rows {
	/// Advances to the next row. Returns `false` once the rows are exhausted.
	fn next(&mut self) -> Result<bool>;

	fn column_count(&self) -> Result<usize>;

	fn column_def(&self, index: usize) -> Result<&ColumnDef>;

	/// Resolves a column name case-insensitively to its 1-based position.
	fn find_column(&self, name: &str) -> Result<usize>;

	fn was_null(&self) -> bool;

	fn value_at(&self, index: usize) -> Result<Value>;

	fn i64_at(&self, index: usize) -> Result<i64>;

	fn f64_at(&self, index: usize) -> Result<f64>;

	fn text_at(&self, index: usize) -> Result<String>;

	fn blob_at(&self, index: usize) -> Result<Vec<u8>>;

	fn close(&mut self) -> Result<()>;

	#[expect(clippy::cast_possible_truncation)]
	fn i32_at(&self, index: usize) -> Result<i32> {
		Ok(self.i64_at(index)? as i32)
	}

	/// Reads the cell as milliseconds since the Unix epoch. Null cells read
	/// as `None`.
	fn timestamp_at(&self, index: usize) -> Result<Option<DateTime<Utc>>> {
		let millis = self.i64_at(index)?;
		if self.was_null() {
			return Ok(None);
		}
		DateTime::from_timestamp_millis(millis)
			.map(Some)
			.ok_or_else(|| Error::misuse(format!("{millis} ms is outside the supported timestamp range")))
	}

	fn column_name(&self, index: usize) -> Result<String> {
		Ok(self.column_def(index)?.name.clone())
	}

	fn column_names(&self) -> Result<Vec<String>> {
		(1..=self.column_count()?).map(|index| self.column_name(index)).collect()
	}

	fn previous(&mut self) -> Result<bool> {
		Err(Error::NotSupported("previous()"))
	}

	fn before_first(&mut self) -> Result<()> {
		Err(Error::NotSupported("before_first()"))
	}

	fn absolute(&mut self, _row: usize) -> Result<bool> {
		Err(Error::NotSupported("absolute(row)"))
	}

	fn get_value<C: ColumnRef>(&self, column: C) -> Result<Value>
	where
		Self: Sized,
	{
		self.value_at(column.column_index(self)?)
	}

	fn get_i64<C: ColumnRef>(&self, column: C) -> Result<i64>
	where
		Self: Sized,
	{
		self.i64_at(column.column_index(self)?)
	}

	fn get_i32<C: ColumnRef>(&self, column: C) -> Result<i32>
	where
		Self: Sized,
	{
		self.i32_at(column.column_index(self)?)
	}

	#[expect(clippy::cast_possible_truncation)]
	fn get_i16<C: ColumnRef>(&self, column: C) -> Result<i16>
	where
		Self: Sized,
	{
		Ok(self.i64_at(column.column_index(self)?)? as i16)
	}

	#[expect(clippy::cast_possible_truncation)]
	fn get_i8<C: ColumnRef>(&self, column: C) -> Result<i8>
	where
		Self: Sized,
	{
		Ok(self.i64_at(column.column_index(self)?)? as i8)
	}

	fn get_bool<C: ColumnRef>(&self, column: C) -> Result<bool>
	where
		Self: Sized,
	{
		Ok(self.i64_at(column.column_index(self)?)? != 0)
	}

	fn get_f64<C: ColumnRef>(&self, column: C) -> Result<f64>
	where
		Self: Sized,
	{
		self.f64_at(column.column_index(self)?)
	}

	#[expect(clippy::cast_possible_truncation)]
	fn get_f32<C: ColumnRef>(&self, column: C) -> Result<f32>
	where
		Self: Sized,
	{
		Ok(self.f64_at(column.column_index(self)?)? as f32)
	}

	fn get_string<C: ColumnRef>(&self, column: C) -> Result<String>
	where
		Self: Sized,
	{
		self.text_at(column.column_index(self)?)
	}

	fn get_bytes<C: ColumnRef>(&self, column: C) -> Result<Vec<u8>>
	where
		Self: Sized,
	{
		self.blob_at(column.column_index(self)?)
	}

	fn get_timestamp<C: ColumnRef>(&self, column: C) -> Result<Option<DateTime<Utc>>>
	where
		Self: Sized,
	{
		self.timestamp_at(column.column_index(self)?)
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Position {
	BeforeFirst,
	At(usize),
	AfterLast,
}

/// In-memory rows with a fixed column schema, read through [`Rows`].
///
/// Holds no engine resources, so it can be handed to another thread once
/// built.
#[derive(Debug)]
pub struct BufferedResultSet {
	columns: Vec<ColumnDef>,
	names: HashMap<String, usize>,
	rows: Option<Vec<Vec<Value>>>,
	position: Position,
	was_null: Cell<bool>,
}

impl BufferedResultSet {
	/// Every row must have exactly one value per column.
	pub fn new(columns: Vec<ColumnDef>, rows: Vec<Vec<Value>>) -> Result<Self> {
		if let Some((offset, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns.len())
		{
			return Err(Error::misuse(format!(
				"row {} has {} values but the result set has {} columns",
				offset + 1,
				row.len(),
				columns.len()
			)));
		}

		let names = name_index(&columns);
		Ok(Self { columns, names, rows: Some(rows), position: Position::BeforeFirst, was_null: Cell::new(false) })
	}

	pub fn columns(&self) -> &[ColumnDef] {
		&self.columns
	}

	/// Number of buffered rows, regardless of cursor position.
	pub fn len(&self) -> usize {
		self.rows.as_ref().map_or(0, Vec::len)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub const fn is_closed(&self) -> bool {
		self.rows.is_none()
	}

	/// The current row.
	pub fn row(&self) -> Result<&[Value]> {
		let rows = self.rows.as_ref().ok_or(Error::Closed("result set"))?;
		let Position::At(current) = self.position else {
			return Err(Error::NoCurrentRow);
		};
		rows.get(current).map(Vec::as_slice).ok_or(Error::NoCurrentRow)
	}

	/// Consumes the set, returning every buffered row whatever the cursor
	/// position.
	pub fn into_rows(self) -> Vec<Vec<Value>> {
		self.rows.unwrap_or_default()
	}

	fn cell(&self, index: usize) -> Result<&Value> {
		let rows = self.rows.as_ref().ok_or(Error::Closed("result set"))?;
		if index == 0 || index > self.columns.len() {
			return Err(Error::ColumnIndex { index, count: self.columns.len() });
		}
		let Position::At(current) = self.position else {
			return Err(Error::NoCurrentRow);
		};

		let cell = rows.get(current).and_then(|row| row.get(index - 1)).ok_or(Error::NoCurrentRow)?;
		self.was_null.set(cell.is_null());
		Ok(cell)
	}

	fn ensure_open(&self) -> Result<()> {
		if self.rows.is_none() { Err(Error::Closed("result set")) } else { Ok(()) }
	}
}

impl Rows for BufferedResultSet {
	fn next(&mut self) -> Result<bool> {
		let len = self.rows.as_ref().ok_or(Error::Closed("result set"))?.len();
		self.position = match self.position {
			Position::BeforeFirst if len > 0 => Position::At(0),
			Position::At(current) if current + 1 < len => Position::At(current + 1),
			_ => Position::AfterLast,
		};
		Ok(matches!(self.position, Position::At(_)))
	}

	fn column_count(&self) -> Result<usize> {
		self.ensure_open()?;
		Ok(self.columns.len())
	}

	fn column_def(&self, index: usize) -> Result<&ColumnDef> {
		self.ensure_open()?;
		index
			.checked_sub(1)
			.and_then(|offset| self.columns.get(offset))
			.ok_or(Error::ColumnIndex { index, count: self.columns.len() })
	}

	fn find_column(&self, name: &str) -> Result<usize> {
		self.ensure_open()?;
		self.names.get(&name.to_lowercase()).copied().ok_or_else(|| Error::NoSuchColumn(name.to_string()))
	}

	fn was_null(&self) -> bool {
		self.was_null.get()
	}

	fn value_at(&self, index: usize) -> Result<Value> {
		self.cell(index).cloned()
	}

	fn i64_at(&self, index: usize) -> Result<i64> {
		self.cell(index).map(Value::to_i64)
	}

	fn f64_at(&self, index: usize) -> Result<f64> {
		self.cell(index).map(Value::to_f64)
	}

	fn text_at(&self, index: usize) -> Result<String> {
		self.cell(index).map(Value::to_text)
	}

	fn blob_at(&self, index: usize) -> Result<Vec<u8>> {
		self.cell(index).map(Value::to_bytes)
	}

	fn close(&mut self) -> Result<()> {
		self.rows = None;
		self.position = Position::AfterLast;
		Ok(())
	}
}
