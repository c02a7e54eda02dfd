use std::cell::OnceCell;
use std::collections::HashMap;

/// Description of one result column. `index` is 1-based.
///
/// The source table name is filled in at most once, the first time a cursor
/// is asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
	pub index: usize,
	pub name: String,
	table_name: OnceCell<String>,
}

impl ColumnDef {
	pub fn new(index: usize, name: impl Into<String>) -> Self {
		Self { index, name: name.into(), table_name: OnceCell::new() }
	}

	/// The cached source table name, if it has been resolved.
	pub fn table_name(&self) -> Option<&str> {
		self.table_name.get().map(String::as_str)
	}

	pub(crate) fn table_name_or_init(&self, resolve: impl FnOnce() -> String) -> &str {
		self.table_name.get_or_init(resolve)
	}
}

/// Builds `ColumnDef`s for `names`, numbered from 1.
pub fn column_defs<I, S>(names: I) -> Vec<ColumnDef>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	names.into_iter().enumerate().map(|(offset, name)| ColumnDef::new(offset + 1, name)).collect()
}

/// Case-insensitive name to 1-based index map; the first duplicate wins.
pub(crate) fn name_index(columns: &[ColumnDef]) -> HashMap<String, usize> {
	let mut map = HashMap::with_capacity(columns.len());
	for column in columns {
		map.entry(column.name.to_lowercase()).or_insert(column.index);
	}
	map
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defs_are_one_based() {
		let defs = column_defs(["TABLE_CAT", "TABLE_NAME"]);
		assert_eq!(defs[0].index, 1);
		assert_eq!(defs[1].index, 2);
		assert_eq!(defs[1].name, "TABLE_NAME");
	}

	#[test]
	fn table_name_is_resolved_once() {
		let def = ColumnDef::new(1, "id");
		assert_eq!(def.table_name(), None);

		let mut calls = 0;
		assert_eq!(
			def.table_name_or_init(|| {
				calls += 1;
				"items".to_string()
			}),
			"items"
		);
		assert_eq!(def.table_name_or_init(|| "other".to_string()), "items");
		assert_eq!(calls, 1);
		assert_eq!(def.table_name(), Some("items"));
	}

	#[test]
	fn name_index_is_case_insensitive_and_keeps_first() {
		let defs = column_defs(["Id", "NAME", "id"]);
		let map = name_index(&defs);
		assert_eq!(map.get("id"), Some(&1));
		assert_eq!(map.get("name"), Some(&2));
	}
}
