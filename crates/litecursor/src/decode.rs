//! Column decoding against a live statement handle.
//!
//! Every function here takes the engine's 0-based column number. Callers are
//! responsible for range checks and for the 1-based translation.

use core::ffi::c_int;
use std::ptr::NonNull;

use crate::consts::{SQLITE_BLOB, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL};
use crate::ffi;
use crate::value::Value;

/// The engine's runtime type tag for a cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColumnType {
	Null,
	Integer,
	Float,
	Text,
	Blob,
}

impl ColumnType {
	/// Unrecognized tags read as text.
	pub const fn from_tag(tag: c_int) -> Self {
		match tag {
			SQLITE_NULL => Self::Null,
			SQLITE_INTEGER => Self::Integer,
			SQLITE_FLOAT => Self::Float,
			SQLITE_BLOB => Self::Blob,
			_ => Self::Text,
		}
	}
}

pub(crate) fn column_type(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> ColumnType {
	ColumnType::from_tag(unsafe { ffi::sqlite3_column_type(stmt.as_ptr(), col) })
}

pub(crate) fn decode_value(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> Value {
	match column_type(stmt, col) {
		ColumnType::Null => Value::Null,
		ColumnType::Integer => Value::Integer(decode_i64(stmt, col)),
		ColumnType::Float => Value::Float(decode_f64(stmt, col)),
		ColumnType::Blob => Value::Blob(decode_blob(stmt, col)),
		ColumnType::Text => Value::Text(decode_text(stmt, col)),
	}
}

pub(crate) fn decode_i64(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> i64 {
	unsafe { ffi::sqlite3_column_int64(stmt.as_ptr(), col) }
}

pub(crate) fn decode_i32(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> i32 {
	unsafe { ffi::sqlite3_column_int(stmt.as_ptr(), col) }
}

pub(crate) fn decode_f64(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> f64 {
	unsafe { ffi::sqlite3_column_double(stmt.as_ptr(), col) }
}

pub(crate) fn decode_text(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> String {
	// The pointer must be fetched before the byte count: column_text may
	// convert the cell, which changes its length.
	let ptr = unsafe { ffi::sqlite3_column_text(stmt.as_ptr(), col) };
	let bytes = unsafe { ffi::sqlite3_column_bytes(stmt.as_ptr(), col) };
	if ptr.is_null() || bytes <= 0 {
		return String::new();
	}

	let slice =
		unsafe { std::slice::from_raw_parts(ptr, usize::try_from(bytes).unwrap_or_default()) };
	String::from_utf8_lossy(slice).into_owned()
}

pub(crate) fn decode_blob(stmt: NonNull<ffi::Sqlite3Stmt>, col: c_int) -> Vec<u8> {
	let ptr = unsafe { ffi::sqlite3_column_blob(stmt.as_ptr(), col) };
	let bytes = unsafe { ffi::sqlite3_column_bytes(stmt.as_ptr(), col) };
	if ptr.is_null() || bytes <= 0 {
		return Vec::new();
	}

	unsafe {
		std::slice::from_raw_parts(ptr.cast::<u8>(), usize::try_from(bytes).unwrap_or_default())
	}
	.to_vec()
}
