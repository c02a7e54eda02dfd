use core::ffi::{c_char, c_int};
use std::cell::Cell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::ptr::NonNull;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::column::{ColumnDef, name_index};
use crate::connection::Connection;
use crate::consts::{SQLITE_OK, SQLITE_RANGE, SQLITE_ROW, SQLITE_UTF8};
use crate::decode::{self, ColumnType};
use crate::error::{Error, Result, db_error_message};
use crate::ffi;
use crate::result_set::{BufferedResultSet, Rows};
use crate::value::Value;

/// Execution state of a compiled statement.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorState {
	/// Prepared or reset; the next step starts execution.
	Unstepped,
	/// The last step produced a row that can be read.
	HasRow,
	/// Execution finished. Further steps report no row without calling the
	/// engine until the statement is reset.
	Done,
	/// Finalized. Terminal.
	Closed,
}

/// A prepared statement and its step cursor.
///
/// Parameters and columns are addressed from 1. The borrow of the owning
/// [`Connection`] guarantees the connection outlives the cursor.
pub struct Statement<'conn> {
	conn: &'conn Connection,
	stmt: Option<NonNull<ffi::Sqlite3Stmt>>,
	state: CursorState,
	columns: Vec<ColumnDef>,
	names: HashMap<String, usize>,
	was_null: Cell<bool>,
}

impl<'conn> Statement<'conn> {
	pub(crate) fn new(conn: &'conn Connection, stmt: NonNull<ffi::Sqlite3Stmt>) -> Self {
		let count = unsafe { ffi::sqlite3_column_count(stmt.as_ptr()) };
		let columns: Vec<ColumnDef> = (0..count.max(0))
			.map(|col| {
				let name = cstr_to_string(unsafe { ffi::sqlite3_column_name(stmt.as_ptr(), col) });
				ColumnDef::new(usize::try_from(col).unwrap_or_default() + 1, name.unwrap_or_default())
			})
			.collect();
		let names = name_index(&columns);

		Self { conn, stmt: Some(stmt), state: CursorState::Unstepped, columns, names, was_null: Cell::new(false) }
	}

	pub const fn state(&self) -> CursorState {
		self.state
	}

	pub const fn connection(&self) -> &'conn Connection {
		self.conn
	}

	fn handle(&self) -> Result<NonNull<ffi::Sqlite3Stmt>> {
		self.stmt.ok_or(Error::Closed("statement"))
	}

	pub fn parameter_count(&self) -> Result<usize> {
		let n = unsafe { ffi::sqlite3_bind_parameter_count(self.handle()?.as_ptr()) };
		Ok(usize::try_from(n).unwrap_or_default())
	}

	pub fn bind(&mut self, index: usize, value: &Value) -> Result<()> {
		match value {
			Value::Null => self.bind_null(index),
			Value::Integer(v) => self.bind_i64(index, *v),
			Value::Float(v) => self.bind_f64(index, *v),
			Value::Text(v) => self.bind_text(index, v),
			Value::Blob(v) => self.bind_blob(index, v),
		}
	}

	pub fn bind_values(&mut self, values: &[Value]) -> Result<()> {
		let expected = self.parameter_count()?;
		if values.len() != expected {
			return Err(Error::misuse(format!("expected {expected} binding values, got {}", values.len())));
		}

		for (offset, value) in values.iter().enumerate() {
			self.bind(offset + 1, value)?;
		}

		Ok(())
	}

	pub fn bind_named(&mut self, name: &str, value: &Value) -> Result<()> {
		let stmt = self.handle()?;
		for candidate in binding_name_candidates(name) {
			let candidate =
				CString::new(candidate).map_err(|_| Error::misuse("binding name contains a NUL byte"))?;

			let index = unsafe { ffi::sqlite3_bind_parameter_index(stmt.as_ptr(), candidate.as_ptr()) };
			if index > 0 {
				return self.bind(usize::try_from(index).unwrap_or_default(), value);
			}
		}

		Err(Error::misuse(format!("unknown named parameter: {name}")))
	}

	pub fn bind_null(&mut self, index: usize) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let code = unsafe { ffi::sqlite3_bind_null(stmt.as_ptr(), i) };
		self.bind_result(index, code)
	}

	pub fn bind_i32(&mut self, index: usize, value: i32) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let code = unsafe { ffi::sqlite3_bind_int(stmt.as_ptr(), i, value) };
		self.bind_result(index, code)
	}

	pub fn bind_i64(&mut self, index: usize, value: i64) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let code = unsafe { ffi::sqlite3_bind_int64(stmt.as_ptr(), i, value) };
		self.bind_result(index, code)
	}

	pub fn bind_f64(&mut self, index: usize, value: f64) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let code = unsafe { ffi::sqlite3_bind_double(stmt.as_ptr(), i, value) };
		self.bind_result(index, code)
	}

	/// Binds UTF-8 text with its exact byte length, so embedded NULs survive.
	pub fn bind_text(&mut self, index: usize, value: &str) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let len = u64::try_from(value.len()).map_err(|_| Error::misuse("text parameter is too large"))?;

		let code = unsafe {
			ffi::sqlite3_bind_text64(
				stmt.as_ptr(),
				i,
				value.as_ptr().cast::<c_char>(),
				len,
				Some(sqlite_transient()),
				SQLITE_UTF8,
			)
		};
		self.bind_result(index, code)
	}

	pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<()> {
		let (stmt, i) = self.bind_target(index)?;
		let len = u64::try_from(value.len()).map_err(|_| Error::misuse("blob parameter is too large"))?;

		let code = unsafe {
			ffi::sqlite3_bind_blob64(stmt.as_ptr(), i, value.as_ptr().cast(), len, Some(sqlite_transient()))
		};
		self.bind_result(index, code)
	}

	/// Binds `value` as milliseconds since the Unix epoch.
	pub fn bind_timestamp(&mut self, index: usize, value: DateTime<Utc>) -> Result<()> {
		self.bind_i64(index, value.timestamp_millis())
	}

	/// Resets every parameter to NULL. [`Statement::reset`] keeps bindings.
	pub fn clear_bindings(&mut self) -> Result<()> {
		let code = unsafe { ffi::sqlite3_clear_bindings(self.handle()?.as_ptr()) };
		self.conn.check(code).map(|_| ())
	}

	fn bind_target(&self, index: usize) -> Result<(NonNull<ffi::Sqlite3Stmt>, c_int)> {
		let stmt = self.handle()?;
		let i = c_int::try_from(index).map_err(|_| Error::Bind {
			index,
			code: SQLITE_RANGE,
			message: litecursor_sqlite_ffi::sqlite_errstr(SQLITE_RANGE),
		})?;
		Ok((stmt, i))
	}

	fn bind_result(&self, index: usize, code: c_int) -> Result<()> {
		if code == SQLITE_OK {
			return Ok(());
		}
		Err(Error::Bind { index, code, message: db_error_message(self.conn.raw(), code) })
	}

	/// Advances the cursor. Returns `true` when a row is available.
	///
	/// A failed step leaves the state unchanged so the statement can still be
	/// reset.
	pub fn step(&mut self) -> Result<bool> {
		let stmt = match self.state {
			CursorState::Closed => return Err(Error::Closed("statement")),
			CursorState::Done => return Ok(false),
			CursorState::Unstepped | CursorState::HasRow => self.handle()?,
		};

		let code = self.conn.check(unsafe { ffi::sqlite3_step(stmt.as_ptr()) })?;
		self.state = if code == SQLITE_ROW { CursorState::HasRow } else { CursorState::Done };
		trace!(state = ?self.state, "stepped statement");
		Ok(self.state == CursorState::HasRow)
	}

	/// Rewinds to [`CursorState::Unstepped`]. Bindings are kept.
	pub fn reset(&mut self) -> Result<()> {
		let stmt = self.handle()?;
		// The return code repeats the error of the last failed step, which
		// step() has already reported; the rewind itself cannot fail.
		let _ = unsafe { ffi::sqlite3_reset(stmt.as_ptr()) };
		self.state = CursorState::Unstepped;
		Ok(())
	}

	/// Steps to completion and returns the number of rows changed.
	pub fn execute(&mut self) -> Result<u64> {
		while self.step()? {}
		self.conn.changes()
	}

	pub fn column_count(&self) -> Result<usize> {
		self.handle()?;
		Ok(self.columns.len())
	}

	pub fn column_defs(&self) -> Result<&[ColumnDef]> {
		self.handle()?;
		Ok(&self.columns)
	}

	/// The table a result column was read from, or an empty string for
	/// expressions. Resolved on first request and cached.
	pub fn table_name(&self, index: usize) -> Result<String> {
		let stmt = self.handle()?;
		let def = self.def(index)?;
		let col = c_int::try_from(index - 1).map_err(|_| self.out_of_range(index))?;
		let name = def.table_name_or_init(|| {
			cstr_to_string(unsafe { ffi::sqlite3_column_table_name(stmt.as_ptr(), col) })
				.unwrap_or_default()
		});
		Ok(name.to_string())
	}

	/// All columns of the current row.
	pub fn row_values(&self) -> Result<Vec<Value>> {
		(1..=self.columns.len()).map(|index| self.value_at(index)).collect()
	}

	/// Drains the remaining rows into a handle-free result set.
	pub fn buffer(&mut self) -> Result<BufferedResultSet> {
		let mut rows = Vec::new();
		if self.state == CursorState::HasRow {
			rows.push(self.row_values()?);
		}
		while self.step()? {
			rows.push(self.row_values()?);
		}
		BufferedResultSet::new(self.columns.clone(), rows)
	}

	pub fn sql(&self) -> Result<String> {
		let ptr = unsafe { ffi::sqlite3_sql(self.handle()?.as_ptr()) };
		Ok(cstr_to_string(ptr).unwrap_or_default())
	}

	/// Releases the statement handle. Every later call fails with
	/// [`Error::Closed`], including a second finalize.
	pub fn finalize(&mut self) -> Result<()> {
		let stmt = self.stmt.take().ok_or(Error::Closed("statement"))?;
		// Like reset, finalize echoes the last step error; the handle is
		// released regardless.
		let _ = unsafe { ffi::sqlite3_finalize(stmt.as_ptr()) };
		self.state = CursorState::Closed;
		trace!("finalized statement");
		Ok(())
	}

	fn def(&self, index: usize) -> Result<&ColumnDef> {
		index.checked_sub(1).and_then(|offset| self.columns.get(offset)).ok_or_else(|| self.out_of_range(index))
	}

	const fn out_of_range(&self, index: usize) -> Error {
		Error::ColumnIndex { index, count: self.columns.len() }
	}

	/// Validates a 1-based column against the current row and translates it to
	/// the engine's 0-based numbering.
	fn access(&self, index: usize) -> Result<(NonNull<ffi::Sqlite3Stmt>, c_int)> {
		let stmt = self.handle()?;
		if index == 0 || index > self.columns.len() {
			return Err(self.out_of_range(index));
		}
		if self.state != CursorState::HasRow {
			return Err(Error::NoCurrentRow);
		}
		let col = c_int::try_from(index - 1).map_err(|_| self.out_of_range(index))?;
		Ok((stmt, col))
	}

	fn read<T>(&self, index: usize, decode: impl FnOnce(NonNull<ffi::Sqlite3Stmt>, c_int) -> T) -> Result<T> {
		let (stmt, col) = self.access(index)?;
		self.was_null.set(decode::column_type(stmt, col) == ColumnType::Null);
		Ok(decode(stmt, col))
	}
}

impl Rows for Statement<'_> {
	fn next(&mut self) -> Result<bool> {
		self.step()
	}

	fn column_count(&self) -> Result<usize> {
		Statement::column_count(self)
	}

	fn column_def(&self, index: usize) -> Result<&ColumnDef> {
		self.handle()?;
		self.def(index)
	}

	fn find_column(&self, name: &str) -> Result<usize> {
		self.handle()?;
		self.names.get(&name.to_lowercase()).copied().ok_or_else(|| Error::NoSuchColumn(name.to_string()))
	}

	fn was_null(&self) -> bool {
		self.was_null.get()
	}

	fn value_at(&self, index: usize) -> Result<Value> {
		self.read(index, decode::decode_value)
	}

	fn i64_at(&self, index: usize) -> Result<i64> {
		self.read(index, decode::decode_i64)
	}

	fn i32_at(&self, index: usize) -> Result<i32> {
		self.read(index, decode::decode_i32)
	}

	fn f64_at(&self, index: usize) -> Result<f64> {
		self.read(index, decode::decode_f64)
	}

	fn text_at(&self, index: usize) -> Result<String> {
		self.read(index, decode::decode_text)
	}

	fn blob_at(&self, index: usize) -> Result<Vec<u8>> {
		self.read(index, decode::decode_blob)
	}

	fn close(&mut self) -> Result<()> {
		self.finalize()
	}
}

impl Drop for Statement<'_> {
	fn drop(&mut self) {
		if let Some(stmt) = self.stmt.take() {
			let _ = unsafe { ffi::sqlite3_finalize(stmt.as_ptr()) };
		}
	}
}

fn binding_name_candidates(name: &str) -> Vec<String> {
	if name.starts_with(':') || name.starts_with('@') || name.starts_with('$') || name.starts_with('?') {
		vec![name.to_string()]
	} else {
		vec![format!(":{name}"), format!("@{name}"), format!("${name}")]
	}
}

fn sqlite_transient() -> unsafe extern "C" fn(*mut std::ffi::c_void) {
	unsafe { std::mem::transmute::<isize, unsafe extern "C" fn(*mut std::ffi::c_void)>(-1_isize) }
}

pub(crate) fn cstr_to_string(ptr: *const c_char) -> Option<String> {
	if ptr.is_null() {
		None
	} else {
		Some(unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::consts::SQLITE_CONSTRAINT;

	fn open() -> Connection {
		Connection::open_in_memory().expect("open memory database")
	}

	#[test]
	fn starts_unstepped_and_reaches_done() {
		let db = open();
		let mut stmt = db.prepare("select 1 union all select 2").expect("prepare");
		assert_eq!(stmt.state(), CursorState::Unstepped);

		assert!(stmt.step().expect("first row"));
		assert_eq!(stmt.state(), CursorState::HasRow);
		assert!(stmt.step().expect("second row"));
		assert!(!stmt.step().expect("done"));
		assert_eq!(stmt.state(), CursorState::Done);
		assert!(!stmt.step().expect("still done"));
	}

	#[test]
	fn done_does_not_rerun_the_statement() {
		let db = open();
		db.execute("create table hits(n integer)").expect("create table");

		let mut insert = db.prepare("insert into hits values (1)").expect("prepare insert");
		assert!(!insert.step().expect("insert"));
		assert!(!insert.step().expect("no second insert"));
		assert!(!insert.next().expect("no third insert"));

		let count = db.query_row("select count(*) from hits").expect("count");
		assert_eq!(count, Some(vec![Value::Integer(1)]));

		insert.reset().expect("reset");
		assert_eq!(insert.state(), CursorState::Unstepped);
		assert!(!insert.step().expect("insert again"));
		let count = db.query_row("select count(*) from hits").expect("count");
		assert_eq!(count, Some(vec![Value::Integer(2)]));
	}

	#[test]
	fn column_positions_translate_to_engine_positions() {
		let db = open();
		let mut stmt = db.prepare("select 10, 'twenty', 30.5").expect("prepare");
		assert!(stmt.step().expect("row"));

		assert_eq!(stmt.get_i64(1).expect("col 1"), 10);
		assert_eq!(stmt.get_string(2).expect("col 2"), "twenty");
		assert!((stmt.get_f64(3).expect("col 3") - 30.5).abs() < f64::EPSILON);
		assert_eq!(stmt.get_value(0), Err(Error::ColumnIndex { index: 0, count: 3 }));
		assert_eq!(stmt.get_value(4), Err(Error::ColumnIndex { index: 4, count: 3 }));
	}

	#[test]
	fn reading_without_a_row_fails() {
		let db = open();
		let mut stmt = db.prepare("select 1").expect("prepare");
		assert_eq!(stmt.get_i64(1), Err(Error::NoCurrentRow));
		assert!(stmt.step().expect("row"));
		assert!(!stmt.step().expect("done"));
		assert_eq!(stmt.get_i64(1), Err(Error::NoCurrentRow));
	}

	#[test]
	fn null_cells_set_was_null_for_every_getter() {
		let db = open();
		let mut stmt = db.prepare("select null, 5").expect("prepare");
		assert!(stmt.step().expect("row"));

		assert_eq!(stmt.get_i64(1).expect("int"), 0);
		assert!(stmt.was_null());
		assert_eq!(stmt.get_i64(2).expect("int"), 5);
		assert!(!stmt.was_null());
		assert!(stmt.get_f64(1).expect("float").abs() < f64::EPSILON);
		assert!(stmt.was_null());
		assert_eq!(stmt.get_string(1).expect("text"), "");
		assert!(stmt.was_null());
		assert!(stmt.get_bytes(1).expect("blob").is_empty());
		assert!(stmt.was_null());
		assert_eq!(stmt.get_value(1).expect("value"), Value::Null);
		assert!(stmt.was_null());
		assert!(stmt.get_bool(2).expect("bool"));
		assert!(!stmt.was_null());
	}

	#[test]
	fn engine_coerces_text_for_integer_getters() {
		let db = open();
		let mut stmt = db.prepare("select '123', 4.75, x'414243'").expect("prepare");
		assert!(stmt.step().expect("row"));

		assert_eq!(stmt.get_i64(1).expect("text as int"), 123);
		assert_eq!(stmt.get_i32(2).expect("real as int"), 4);
		assert_eq!(stmt.get_string(3).expect("blob as text"), "ABC");
		assert_eq!(stmt.get_value(3).expect("blob"), Value::Blob(b"ABC".to_vec()));
		assert_eq!(stmt.get_value(2).expect("real"), Value::Float(4.75));
	}

	#[test]
	fn getters_resolve_names_case_insensitively() {
		let db = open();
		let mut stmt = db.prepare("select 1 as Id, 'x' as Name").expect("prepare");
		assert!(stmt.step().expect("row"));

		assert_eq!(stmt.find_column("ID").expect("find id"), 1);
		assert_eq!(stmt.get_string("name").expect("name"), "x");
		assert_eq!(stmt.get_i64("nope"), Err(Error::NoSuchColumn("nope".to_string())));
		assert_eq!(stmt.column_names().expect("names"), vec!["Id".to_string(), "Name".to_string()]);
	}

	#[test]
	fn binds_round_trip_through_select() {
		let db = open();
		let mut stmt = db.prepare("select ?, ?, ?").expect("prepare");
		stmt.bind_i64(1, -9_000_000_000).expect("bind int");
		stmt.bind_text(2, "zürich 東京").expect("bind text");
		stmt.bind_null(3).expect("bind null");
		assert!(stmt.step().expect("row"));

		assert_eq!(stmt.get_i64(1).expect("int"), -9_000_000_000);
		assert_eq!(stmt.get_string(2).expect("text"), "zürich 東京");
		assert_eq!(stmt.get_value(3).expect("null"), Value::Null);
		assert!(stmt.was_null());
	}

	#[test]
	fn timestamps_round_trip_as_epoch_millis() {
		let db = open();
		db.execute("create table times(id integer, ts integer)").expect("create table");
		let at = DateTime::from_timestamp_millis(1_224_490_741_123).expect("valid timestamp");

		let mut insert = db.prepare("insert into times values (?, ?)").expect("prepare insert");
		insert.bind_i64(1, 1).expect("bind id");
		insert.bind_timestamp(2, at).expect("bind timestamp");
		insert.execute().expect("insert");
		db.execute("insert into times values (2, null)").expect("insert null");

		let mut stmt = db.prepare("select ts from times order by id").expect("prepare select");
		assert!(stmt.step().expect("first row"));
		assert_eq!(stmt.get_i64(1).expect("raw millis"), 1_224_490_741_123);
		assert_eq!(stmt.get_timestamp("ts").expect("timestamp"), Some(at));
		assert!(!stmt.was_null());

		assert!(stmt.step().expect("second row"));
		assert_eq!(stmt.get_timestamp(1).expect("null timestamp"), None);
		assert!(stmt.was_null());
	}

	#[test]
	fn buffered_reals_read_as_the_same_text() {
		let db = open();
		let sql = "select 1.0, 1e20, 2.5, 100.0";

		let mut live = db.prepare(sql).expect("prepare");
		assert!(live.step().expect("row"));
		let mut buffered = db.query(sql, &[]).expect("query");
		assert!(buffered.next().expect("row"));

		for index in 1..=4 {
			assert_eq!(
				buffered.get_string(index).expect("buffered text"),
				live.get_string(index).expect("live text"),
				"column {index}"
			);
		}
		assert_eq!(buffered.get_string(1).expect("whole real"), "1.0");
		assert_eq!(buffered.get_string(2).expect("large real"), "1.0e+20");
	}

	#[test]
	fn statement_reports_its_connection() {
		let db = open();
		db.execute("create table items(id integer)").expect("create table");
		let mut insert = db.prepare("insert into items values (1), (2)").expect("prepare");
		insert.execute().expect("insert");
		assert_eq!(insert.connection().last_insert_rowid().expect("rowid"), 2);
		assert_eq!(insert.connection().path(), db.path());
	}

	#[test]
	fn narrow_integer_getters_truncate() {
		let db = open();
		let mut stmt = db.prepare("select 70000, -129").expect("prepare");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.get_i16(1).expect("short"), 4464);
		assert_eq!(stmt.get_i8(2).expect("byte"), 127);
	}

	#[test]
	fn text_keeps_embedded_nul_bytes() {
		let db = open();
		let mut stmt = db.prepare("select ?, length(cast(? as blob))").expect("prepare");
		stmt.bind_text(1, "a\0b").expect("bind text");
		stmt.bind_text(2, "a\0b").expect("bind text");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.get_string(1).expect("text"), "a\0b");
		assert_eq!(stmt.get_i64(2).expect("length"), 3);
	}

	#[test]
	fn out_of_range_binding_surfaces_engine_code() {
		let db = open();
		let mut stmt = db.prepare("select ?").expect("prepare");
		assert_eq!(stmt.parameter_count().expect("count"), 1);

		let err = stmt.bind_i64(2, 1).expect_err("index 2 is out of range");
		assert_eq!(err.primary_code(), SQLITE_RANGE);
		assert!(matches!(err, Error::Bind { index: 2, .. }));
		let err = stmt.bind_null(0).expect_err("index 0 is out of range");
		assert_eq!(err.primary_code(), SQLITE_RANGE);
	}

	#[test]
	fn bindings_persist_across_reset_until_cleared() {
		let db = open();
		let mut stmt = db.prepare("select ?").expect("prepare");
		stmt.bind_i64(1, 7).expect("bind");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.get_i64(1).expect("value"), 7);

		stmt.reset().expect("reset");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.get_i64(1).expect("stale binding"), 7);

		stmt.reset().expect("reset");
		stmt.clear_bindings().expect("clear");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.get_value(1).expect("cleared"), Value::Null);
	}

	#[test]
	fn failed_step_keeps_state_and_allows_reset() {
		let db = open();
		db.execute("create table u(id integer primary key)").expect("create table");
		db.execute("insert into u values (1)").expect("seed");

		let mut insert = db.prepare("insert into u values (?)").expect("prepare");
		insert.bind_i64(1, 1).expect("bind duplicate");
		let err = insert.step().expect_err("duplicate key");
		assert_eq!(err.primary_code(), SQLITE_CONSTRAINT);
		assert!(err.to_string().contains("UNIQUE constraint failed"));
		assert_eq!(insert.state(), CursorState::Unstepped);

		insert.reset().expect("reset after failure");
		insert.bind_i64(1, 2).expect("bind fresh key");
		assert_eq!(insert.execute().expect("insert"), 1);
	}

	#[test]
	fn finalize_twice_fails_with_closed() {
		let db = open();
		let mut stmt = db.prepare("select 1").expect("prepare");
		stmt.finalize().expect("finalize");
		assert_eq!(stmt.state(), CursorState::Closed);

		assert_eq!(stmt.finalize(), Err(Error::Closed("statement")));
		assert_eq!(stmt.step(), Err(Error::Closed("statement")));
		assert_eq!(stmt.bind_i64(1, 1), Err(Error::Closed("statement")));
		assert_eq!(stmt.get_i64(1), Err(Error::Closed("statement")));
		assert_eq!(stmt.reset(), Err(Error::Closed("statement")));
		assert!(stmt.column_count().is_err());
	}

	#[test]
	fn buffer_drains_remaining_rows() {
		let db = open();
		let mut stmt = db.prepare("select 1 as n union all select 2 union all select 3").expect("prepare");
		assert!(stmt.step().expect("first row"));

		let mut rs = stmt.buffer().expect("buffer");
		assert_eq!(rs.len(), 3);
		assert_eq!(stmt.state(), CursorState::Done);
		let mut seen = Vec::new();
		while rs.next().expect("next") {
			seen.push(rs.get_i64("n").expect("n"));
		}
		assert_eq!(seen, vec![1, 2, 3]);
	}

	#[test]
	fn named_and_positional_bindings() {
		let db = open();
		let mut stmt = db.prepare("select :name, :qty").expect("prepare");
		stmt.bind_named("name", &Value::from("apples")).expect("bind name");
		stmt.bind_named(":qty", &Value::from(12_i64)).expect("bind qty");
		assert!(stmt.step().expect("row"));
		assert_eq!(stmt.row_values().expect("row"), vec![Value::from("apples"), Value::Integer(12)]);

		let mut positional = db.prepare("select ?, ?").expect("prepare");
		let err = positional.bind_values(&[Value::Null]).expect_err("arity mismatch");
		assert_eq!(err.to_string(), "expected 2 binding values, got 1");
		positional.bind_values(&[Value::Float(1.5), Value::from(vec![1_u8, 2])]).expect("bind");
		assert!(positional.step().expect("row"));
		assert_eq!(positional.get_bytes(2).expect("blob"), vec![1, 2]);
	}

	#[test]
	fn sql_reports_statement_text() {
		let db = open();
		let stmt = db.prepare("select 42").expect("prepare");
		assert_eq!(stmt.sql().expect("sql"), "select 42");
	}
}
