use core::ffi::c_int;
use std::ffi::CStr;

use thiserror::Error;

use crate::consts::{SQLITE_MISUSE, SQLITE_OK};
use crate::ffi;

/// Failures raised by connections, cursors and buffered result sets.
///
/// Variants that originate in the engine keep its result code and message
/// verbatim. Local contract violations report `SQLITE_MISUSE` from
/// [`Error::code`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
	#[error("unable to open database {path}: {message} (code {code})")]
	Open { path: String, code: c_int, message: String },

	#[error("SQL error {code}: {message}")]
	Prepare { code: c_int, message: String, offset: Option<usize> },

	#[error("cannot bind parameter {index}: {message} (code {code})")]
	Bind { index: usize, code: c_int, message: String },

	#[error("SQLite error {code}: {message}")]
	Engine { code: c_int, message: String },

	#[error("{0} is closed")]
	Closed(&'static str),

	#[error("No such column: {0}")]
	NoSuchColumn(String),

	#[error("column index {index} is outside 1..={count}")]
	ColumnIndex { index: usize, count: usize },

	#[error("no current row")]
	NoCurrentRow,

	#[error("Not implemented: {0}")]
	NotSupported(&'static str),

	#[error("no registered driver accepts {0}")]
	NoDriver(String),

	#[error("{0}")]
	Misuse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	/// The engine result code, or `SQLITE_MISUSE` for local conditions.
	pub const fn code(&self) -> c_int {
		match self {
			Self::Open { code, .. }
			| Self::Prepare { code, .. }
			| Self::Bind { code, .. }
			| Self::Engine { code, .. } => *code,
			_ => SQLITE_MISUSE,
		}
	}

	/// The primary result code with any extended bits masked off.
	pub const fn primary_code(&self) -> c_int {
		self.code() & 0xff
	}

	pub const fn is_closed(&self) -> bool {
		matches!(self, Self::Closed(_))
	}

	pub(crate) fn misuse(message: impl Into<String>) -> Self {
		Self::Misuse(message.into())
	}
}

/// Builds an engine error from `code` and the connection's current message.
pub(crate) fn engine_error(db: *mut ffi::Sqlite3, code: c_int) -> Error {
	Error::Engine { code, message: db_error_message(db, code) }
}

pub(crate) fn check_ok(db: *mut ffi::Sqlite3, code: c_int) -> Result<()> {
	if code == SQLITE_OK { Ok(()) } else { Err(engine_error(db, code)) }
}

pub(crate) fn db_error_message(db: *mut ffi::Sqlite3, code: c_int) -> String {
	if db.is_null() {
		return litecursor_sqlite_ffi::sqlite_errstr(code);
	}

	let message_ptr = unsafe { ffi::sqlite3_errmsg(db) };
	if message_ptr.is_null() {
		return litecursor_sqlite_ffi::sqlite_errstr(code);
	}

	unsafe { CStr::from_ptr(message_ptr).to_string_lossy().into_owned() }
}
