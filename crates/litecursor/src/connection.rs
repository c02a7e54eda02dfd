use core::ffi::{c_char, c_int};
use std::ffi::CString;
use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::consts::{
	SQLITE_DONE, SQLITE_MISUSE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READONLY,
	SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, SQLITE_ROW,
};
use crate::error::{Error, Result, check_ok, db_error_message, engine_error};
use crate::ffi;
use crate::result_set::BufferedResultSet;
use crate::statement::{Statement, cstr_to_string};
use crate::value::Value;

/// How a database is opened.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OpenOptions {
	read_only: bool,
	create: bool,
	uri: bool,
	autocommit: bool,
}

impl Default for OpenOptions {
	fn default() -> Self {
		Self { read_only: false, create: true, uri: true, autocommit: true }
	}
}

impl OpenOptions {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub const fn read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	/// Create the database file when it does not exist. Ignored for read-only
	/// opens.
	#[must_use]
	pub const fn create(mut self, create: bool) -> Self {
		self.create = create;
		self
	}

	#[must_use]
	pub const fn uri(mut self, uri: bool) -> Self {
		self.uri = uri;
		self
	}

	/// Start outside autocommit mode, with a transaction already open.
	#[must_use]
	pub const fn autocommit(mut self, autocommit: bool) -> Self {
		self.autocommit = autocommit;
		self
	}

	const fn flags(&self) -> c_int {
		let mut flags = if self.read_only {
			SQLITE_OPEN_READONLY
		} else if self.create {
			SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE
		} else {
			SQLITE_OPEN_READWRITE
		};
		if self.uri {
			flags |= SQLITE_OPEN_URI;
		}
		flags
	}
}

/// An open database handle.
///
/// Not safe for concurrent use: the handle carries no locking of its own.
pub struct Connection {
	db: Option<NonNull<ffi::Sqlite3>>,
	path: String,
}

impl Connection {
	pub fn open(path: &str) -> Result<Self> {
		Self::open_with(path, &OpenOptions::default())
	}

	pub fn open_in_memory() -> Result<Self> {
		Self::open(":memory:")
	}

	pub fn open_with(path: &str, options: &OpenOptions) -> Result<Self> {
		let path_c = CString::new(path).map_err(|_| Error::Open {
			path: path.to_string(),
			code: SQLITE_MISUSE,
			message: "database path contains a NUL byte".to_string(),
		})?;

		let mut db: *mut ffi::Sqlite3 = std::ptr::null_mut();
		let code = unsafe {
			ffi::sqlite3_open_v2(path_c.as_ptr(), &raw mut db, options.flags(), std::ptr::null())
		};
		if code != SQLITE_OK {
			let message = db_error_message(db, code);
			if !db.is_null() {
				let _ = unsafe { ffi::sqlite3_close_v2(db) };
			}
			return Err(Error::Open { path: path.to_string(), code, message });
		}

		let db = NonNull::new(db).ok_or_else(|| Error::Open {
			path: path.to_string(),
			code: SQLITE_MISUSE,
			message: "SQLite returned a null connection handle".to_string(),
		})?;

		let _ = unsafe { ffi::sqlite3_extended_result_codes(db.as_ptr(), 1) };
		debug!(path, "opened database");

		let conn = Self { db: Some(db), path: path.to_string() };
		if !options.autocommit {
			conn.set_autocommit(false)?;
		}
		Ok(conn)
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub const fn is_closed(&self) -> bool {
		self.db.is_none()
	}

	fn handle(&self) -> Result<NonNull<ffi::Sqlite3>> {
		self.db.ok_or(Error::Closed("connection"))
	}

	/// Raw database pointer for error reporting; null once closed.
	pub(crate) fn raw(&self) -> *mut ffi::Sqlite3 {
		self.db.map_or(std::ptr::null_mut(), NonNull::as_ptr)
	}

	/// Passes the step sentinels (`SQLITE_OK`, `SQLITE_ROW`, `SQLITE_DONE`)
	/// through and turns any other code into an error carrying the engine's
	/// current message.
	pub fn check(&self, code: c_int) -> Result<c_int> {
		match code {
			SQLITE_OK | SQLITE_ROW | SQLITE_DONE => Ok(code),
			_ => Err(engine_error(self.raw(), code)),
		}
	}

	/// Compiles the first statement in `sql`.
	///
	/// On failure the error carries the byte offset where the engine stopped
	/// reading, when it reports one.
	pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
		let db = self.handle()?;
		let len = c_int::try_from(sql.len()).map_err(|_| Error::misuse("SQL text is too large"))?;

		let mut stmt: *mut ffi::Sqlite3Stmt = std::ptr::null_mut();
		let mut tail: *const c_char = std::ptr::null();
		let code = unsafe {
			ffi::sqlite3_prepare_v3(
				db.as_ptr(),
				sql.as_ptr().cast::<c_char>(),
				len,
				0,
				&raw mut stmt,
				&raw mut tail,
			)
		};
		let offset = tail_offset(sql, tail);
		if code != SQLITE_OK {
			return Err(Error::Prepare { code, message: db_error_message(db.as_ptr(), code), offset });
		}

		let stmt = NonNull::new(stmt).ok_or_else(|| Error::Prepare {
			code: SQLITE_MISUSE,
			message: "SQL did not produce a statement".to_string(),
			offset: None,
		})?;

		if let Some(rest) = offset.and_then(|offset| sql.get(offset..)).filter(|rest| !rest.trim().is_empty()) {
			debug!(ignored = rest, "prepare compiled only the first statement");
		}
		debug!(sql, "prepared statement");
		Ok(Statement::new(self, stmt))
	}

	pub fn create_statement(&self, sql: &str) -> Result<Statement<'_>> {
		self.prepare(sql)
	}

	/// Runs a single statement to completion and returns the rows it changed.
	pub fn execute(&self, sql: &str) -> Result<u64> {
		self.prepare(sql)?.execute()
	}

	/// Runs every statement in `script`, in order, through the engine's exec
	/// interface. Stops at the first failure.
	pub fn execute_batch(&self, script: &str) -> Result<()> {
		let db = self.handle()?;
		let script_c = CString::new(script).map_err(|_| Error::misuse("SQL contains a NUL byte"))?;

		let mut errmsg: *mut c_char = std::ptr::null_mut();
		let code = unsafe {
			ffi::sqlite3_exec(db.as_ptr(), script_c.as_ptr(), None, std::ptr::null_mut(), &raw mut errmsg)
		};
		let message = cstr_to_string(errmsg);
		if !errmsg.is_null() {
			unsafe { ffi::sqlite3_free(errmsg.cast()) };
		}
		if code == SQLITE_OK {
			Ok(())
		} else {
			Err(Error::Engine { code, message: message.unwrap_or_else(|| db_error_message(db.as_ptr(), code)) })
		}
	}

	/// Runs `sql` with positional `params` and buffers every row.
	pub fn query(&self, sql: &str, params: &[Value]) -> Result<BufferedResultSet> {
		let mut stmt = self.prepare(sql)?;
		stmt.bind_values(params)?;
		stmt.buffer()
	}

	pub fn query_all(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
		Ok(self.query(sql, &[])?.into_rows())
	}

	pub fn query_row(&self, sql: &str) -> Result<Option<Vec<Value>>> {
		let mut stmt = self.prepare(sql)?;
		if !stmt.step()? {
			return Ok(None);
		}

		let row = stmt.row_values()?;
		if stmt.step()? {
			return Err(Error::misuse("query returned more than one row"));
		}

		Ok(Some(row))
	}

	/// Whether the engine is in autocommit mode. Read from the engine on
	/// every call, so transactions it ends on its own (a `ROLLBACK` conflict
	/// clause, a `COMMIT` run through [`Connection::execute`]) are reflected.
	pub fn autocommit(&self) -> Result<bool> {
		Ok(unsafe { ffi::sqlite3_get_autocommit(self.handle()?.as_ptr()) } != 0)
	}

	/// Switches transaction mode: leaving autocommit issues `BEGIN`, entering
	/// it issues `COMMIT`. Requesting the current mode does nothing.
	pub fn set_autocommit(&self, autocommit: bool) -> Result<()> {
		if self.autocommit()? == autocommit {
			return Ok(());
		}

		self.execute(if autocommit { "COMMIT" } else { "BEGIN" })?;
		debug!(autocommit, "changed transaction mode");
		Ok(())
	}

	/// Commits the open transaction and begins the next one, staying in
	/// manual mode.
	pub fn commit(&self) -> Result<()> {
		self.end_transaction("COMMIT")
	}

	/// Rolls back the open transaction and begins the next one.
	pub fn rollback(&self) -> Result<()> {
		self.end_transaction("ROLLBACK")
	}

	fn end_transaction(&self, sql: &'static str) -> Result<()> {
		if self.autocommit()? {
			return Err(Error::misuse(format!("{sql} is not valid in autocommit mode")));
		}

		self.execute(sql)?;
		self.execute("BEGIN")?;
		debug!(sql, "ended transaction");
		Ok(())
	}

	/// Rows changed by the most recent INSERT, UPDATE or DELETE.
	pub fn changes(&self) -> Result<u64> {
		let n = unsafe { ffi::sqlite3_changes(self.handle()?.as_ptr()) };
		Ok(u64::try_from(n).unwrap_or_default())
	}

	pub fn last_insert_rowid(&self) -> Result<i64> {
		Ok(unsafe { ffi::sqlite3_last_insert_rowid(self.handle()?.as_ptr()) })
	}

	/// The engine's most recent (extended) result code.
	pub fn error_code(&self) -> Result<c_int> {
		Ok(unsafe { ffi::sqlite3_extended_errcode(self.handle()?.as_ptr()) })
	}

	pub fn error_message(&self) -> Result<String> {
		let db = self.handle()?;
		let code = unsafe { ffi::sqlite3_errcode(db.as_ptr()) };
		Ok(db_error_message(db.as_ptr(), code))
	}

	pub fn catalog(&self) -> Result<Catalog<'_>> {
		self.handle()?;
		Ok(Catalog::new(self))
	}

	pub fn savepoint(&self, _name: &str) -> Result<()> {
		Err(Error::NotSupported("savepoint(name)"))
	}

	pub fn set_read_only(&self, _read_only: bool) -> Result<()> {
		Err(Error::NotSupported("set_read_only(bool)"))
	}

	pub fn set_transaction_isolation(&self, _level: i32) -> Result<()> {
		Err(Error::NotSupported("set_transaction_isolation(level)"))
	}

	/// Releases the database handle. A second call, and any later operation,
	/// fails with [`Error::Closed`].
	pub fn close(&mut self) -> Result<()> {
		let db = self.handle()?;
		check_ok(db.as_ptr(), unsafe { ffi::sqlite3_close_v2(db.as_ptr()) })?;

		self.db = None;
		debug!(path = %self.path, "closed database");
		Ok(())
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		if let Some(db) = self.db.take() {
			let code = unsafe { ffi::sqlite3_close_v2(db.as_ptr()) };
			if code != SQLITE_OK {
				warn!(code, path = %self.path, "failed to close database");
			}
		}
	}
}

fn tail_offset(sql: &str, tail: *const c_char) -> Option<usize> {
	if tail.is_null() {
		return None;
	}
	let start = sql.as_ptr() as usize;
	let offset = (tail as usize).checked_sub(start)?;
	(offset <= sql.len()).then_some(offset)
}
