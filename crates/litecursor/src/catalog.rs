//! Schema enumeration over the attached databases of a connection.
//!
//! Every listing is materialized into a [`BufferedResultSet`] with a fixed
//! column layout, so callers read catalog data with the same getters they use
//! for query results.

use tracing::debug;

use crate::column::column_defs;
use crate::connection::Connection;
use crate::error::Result;
use crate::result_set::BufferedResultSet;
use crate::value::Value;

pub const SCHEMA_COLUMNS: [&str; 2] = ["TABLE_SCHEM", "TABLE_CAT"];

pub const CATALOG_COLUMNS: [&str; 1] = ["TABLE_CAT"];

pub const TABLE_COLUMNS: [&str; 10] = [
	"TABLE_CAT",
	"TABLE_SCHEM",
	"TABLE_NAME",
	"TABLE_TYPE",
	"REMARKS",
	"TYPE_CAT",
	"TYPE_SCHEM",
	"TYPE_NAME",
	"SELF_REFERENCING_COL_NAME",
	"REF_GENERATION",
];

/// The schema name reported for every database.
pub const SCHEMA_NAME: &str = "sqlite";

/// Catalog queries against one connection.
pub struct Catalog<'conn> {
	conn: &'conn Connection,
}

impl<'conn> Catalog<'conn> {
	pub(crate) const fn new(conn: &'conn Connection) -> Self {
		Self { conn }
	}

	/// Names of the attached databases, without `temp`, in ascending order.
	pub fn databases(&self) -> Result<Vec<String>> {
		let rows = self.conn.query_all("PRAGMA database_list")?;
		let mut names: Vec<String> = rows
			.into_iter()
			.filter_map(|row| row.get(1).map(Value::to_text))
			.filter(|name| name != "temp")
			.collect();
		names.sort();
		Ok(names)
	}

	/// One `(TABLE_SCHEM, TABLE_CAT)` row per database.
	pub fn list_schemas(&self) -> Result<BufferedResultSet> {
		let rows = self
			.databases()?
			.into_iter()
			.map(|name| vec![Value::from(SCHEMA_NAME), Value::Text(name)])
			.collect();
		BufferedResultSet::new(column_defs(SCHEMA_COLUMNS), rows)
	}

	pub fn list_catalogs(&self) -> Result<BufferedResultSet> {
		let rows = self.databases()?.into_iter().map(|name| vec![Value::Text(name)]).collect();
		BufferedResultSet::new(column_defs(CATALOG_COLUMNS), rows)
	}

	/// Tables and views across every database, plus temporary ones under the
	/// `temp` catalog, ordered by type, catalog and name.
	///
	/// Each supplied filter narrows the listing: `catalog` must match exactly,
	/// `schema_pattern` and `name_pattern` are `LIKE` patterns, and `types`
	/// restricts `TABLE_TYPE`. The filter text is spliced into the query
	/// without escaping, so it must not come from untrusted input.
	pub fn list_tables(
		&self,
		catalog: Option<&str>,
		schema_pattern: Option<&str>,
		name_pattern: Option<&str>,
		types: Option<&[&str]>,
	) -> Result<BufferedResultSet> {
		let sql = tables_sql(&self.databases()?, catalog, schema_pattern, name_pattern, types);
		debug!(%sql, "listing tables");
		let rows = self.conn.query_all(&sql)?;
		BufferedResultSet::new(column_defs(TABLE_COLUMNS), rows)
	}

	pub const fn product_name(&self) -> &'static str {
		"sqlite"
	}

	pub fn product_version(&self) -> String {
		litecursor_sqlite_ffi::sqlite_lib_version()
	}

	pub fn major_version(&self) -> i32 {
		litecursor_sqlite_ffi::sqlite_lib_version_number() / 1_000_000
	}

	pub fn minor_version(&self) -> i32 {
		litecursor_sqlite_ffi::sqlite_lib_version_number() / 1000 % 1000
	}

	pub const fn schema_term(&self) -> &'static str {
		"schema"
	}

	pub const fn catalog_term(&self) -> &'static str {
		"catalog"
	}
}

fn tables_sql(
	databases: &[String],
	catalog: Option<&str>,
	schema_pattern: Option<&str>,
	name_pattern: Option<&str>,
	types: Option<&[&str]>,
) -> String {
	let mut arms = vec![
		"SELECT 'temp' AS TABLE_CAT, 'sqlite' AS TABLE_SCHEM, name AS TABLE_NAME, \
		 CASE type WHEN 'table' THEN 'TEMPORARY TABLE' ELSE 'TEMPORARY VIEW' END AS TABLE_TYPE \
		 FROM sqlite_temp_master WHERE type IN ('table', 'view')"
			.to_string(),
	];
	for db in databases {
		arms.push(format!(
			"SELECT '{literal}', 'sqlite', name, \
			 CASE type WHEN 'table' THEN 'TABLE' ELSE 'VIEW' END \
			 FROM {ident}.sqlite_master WHERE type IN ('table', 'view')",
			literal = db.replace('\'', "''"),
			ident = quote_ident(db),
		));
	}

	let mut filters = Vec::new();
	if let Some(types) = types {
		filters.push(format!("(TABLE_TYPE IN ('{}'))", types.join("','")));
	}
	if let Some(pattern) = name_pattern {
		filters.push(format!("(TABLE_NAME LIKE '{pattern}')"));
	}
	if let Some(catalog) = catalog {
		filters.push(format!("(TABLE_CAT = '{catalog}')"));
	}
	if let Some(pattern) = schema_pattern {
		filters.push(format!("(TABLE_SCHEM LIKE '{pattern}')"));
	}

	let where_clause =
		if filters.is_empty() { String::new() } else { format!(" WHERE {}", filters.join(" AND ")) };

	format!(
		"SELECT TABLE_CAT, TABLE_SCHEM, TABLE_NAME, TABLE_TYPE, \
		 NULL AS REMARKS, NULL AS TYPE_CAT, NULL AS TYPE_SCHEM, NULL AS TYPE_NAME, \
		 NULL AS SELF_REFERENCING_COL_NAME, NULL AS REF_GENERATION \
		 FROM ({}){where_clause} ORDER BY TABLE_TYPE, TABLE_CAT, TABLE_NAME",
		arms.join(" UNION ALL ")
	)
}

fn quote_ident(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}
