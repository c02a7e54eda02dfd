//! A small cursor-oriented client for SQLite.
//!
//! [`Connection`] opens databases and controls transactions, [`Statement`] is
//! a forward-only cursor over one compiled statement, and
//! [`BufferedResultSet`] holds fully materialized rows. Both cursors are read
//! through the [`Rows`] trait with 1-based column positions.

mod catalog;
mod column;
mod connection;
mod decode;
mod driver;
mod error;
mod result_set;
mod statement;
mod value;

pub use catalog::{CATALOG_COLUMNS, Catalog, SCHEMA_COLUMNS, SCHEMA_NAME, TABLE_COLUMNS};
pub use column::{ColumnDef, column_defs};
pub use connection::{Connection, OpenOptions};
pub use decode::ColumnType;
pub use driver::{ConnectionFactory, Driver, DriverRegistry, URL_PREFIX};
pub use error::{Error, Result};
pub use litecursor_sqlite_ffi::{consts, ffi};
pub use result_set::{BufferedResultSet, ColumnRef, Rows};
pub use statement::{CursorState, Statement};
pub use value::Value;

pub fn sqlite_lib_version() -> String {
	litecursor_sqlite_ffi::sqlite_lib_version()
}

pub fn sqlite_lib_version_number() -> i32 {
	litecursor_sqlite_ffi::sqlite_lib_version_number()
}

pub fn sqlite_source_id() -> String {
	litecursor_sqlite_ffi::sqlite_source_id()
}

pub fn sqlite_compile_option_used(name: &str) -> bool {
	litecursor_sqlite_ffi::sqlite_compile_option_used(name)
}

pub fn sqlite_compile_options() -> Vec<String> {
	litecursor_sqlite_ffi::sqlite_compile_options()
}
