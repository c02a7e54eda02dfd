use litecursor::{Connection, Rows, TABLE_COLUMNS, Value};
use tempfile::TempDir;

fn attached_fixture() -> (TempDir, Connection) {
	let dir = tempfile::tempdir().expect("create temp dir");
	let main_path = dir.path().join("main.db");
	let at_path = dir.path().join("at.db");

	let db = Connection::open(main_path.to_str().expect("utf-8 path")).expect("open main database");
	db.execute(&format!("attach database '{}' as at", at_path.display())).expect("attach");
	db.execute_batch(
		"create table MT1(id integer);
		 create table MT2(id integer);
		 create view MV2 as select * from MT2;
		 create table at.AT1(id integer);
		 create table at.AT2(id integer);
		 create view at.AV1 as select * from AT1;
		 create index MT1_id on MT1(id);",
	)
	.expect("build schema");

	(dir, db)
}

fn qualified_names(mut rs: impl Rows) -> Vec<String> {
	let mut names = Vec::new();
	while rs.next().expect("next table") {
		names.push(format!(
			"{}.{}",
			rs.get_string("TABLE_CAT").expect("catalog"),
			rs.get_string("TABLE_NAME").expect("name")
		));
	}
	names
}

#[test]
fn catalogs_list_attached_databases_sorted() {
	let (_dir, db) = attached_fixture();
	let catalog = db.catalog().expect("catalog");

	assert_eq!(catalog.databases().expect("databases"), vec!["at".to_string(), "main".to_string()]);

	let mut rs = catalog.list_catalogs().expect("catalogs");
	let mut seen = Vec::new();
	while rs.next().expect("next catalog") {
		seen.push(rs.get_string("TABLE_CAT").expect("catalog"));
	}
	assert_eq!(seen, vec!["at", "main"]);
}

#[test]
fn schemas_pair_fixed_schema_with_each_catalog() {
	let (_dir, db) = attached_fixture();
	let rows = db.catalog().expect("catalog").list_schemas().expect("schemas").into_rows();
	assert_eq!(
		rows,
		vec![
			vec![Value::from("sqlite"), Value::from("at")],
			vec![Value::from("sqlite"), Value::from("main")],
		]
	);
}

#[test]
fn tables_are_ordered_by_type_catalog_and_name() {
	let (_dir, db) = attached_fixture();
	let rs = db.catalog().expect("catalog").list_tables(None, None, None, None).expect("tables");

	assert_eq!(rs.columns().iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), TABLE_COLUMNS);
	assert_eq!(qualified_names(rs), vec!["at.AT1", "at.AT2", "main.MT1", "main.MT2", "at.AV1", "main.MV2"]);
}

#[test]
fn name_pattern_narrows_listing() {
	let (_dir, db) = attached_fixture();
	let rs = db.catalog().expect("catalog").list_tables(None, None, Some("M%"), None).expect("tables");
	assert_eq!(qualified_names(rs), vec!["main.MT1", "main.MT2", "main.MV2"]);
}

#[test]
fn type_and_name_filters_combine() {
	let (_dir, db) = attached_fixture();
	let rs = db
		.catalog()
		.expect("catalog")
		.list_tables(None, None, Some("%1%"), Some(&["VIEW"]))
		.expect("tables");
	assert_eq!(qualified_names(rs), vec!["at.AV1"]);
}

#[test]
fn catalog_and_schema_filters() {
	let (_dir, db) = attached_fixture();
	let catalog = db.catalog().expect("catalog");

	let rs = catalog.list_tables(Some("at"), None, None, None).expect("tables");
	assert_eq!(qualified_names(rs), vec!["at.AT1", "at.AT2", "at.AV1"]);

	let rs = catalog.list_tables(None, Some("sql%"), Some("MT%"), None).expect("tables");
	assert_eq!(qualified_names(rs), vec!["main.MT1", "main.MT2"]);

	let rs = catalog.list_tables(None, Some("other"), None, None).expect("tables");
	assert!(rs.is_empty());
}

#[test]
fn metadata_columns_are_null() {
	let (_dir, db) = attached_fixture();
	let mut rs = db.catalog().expect("catalog").list_tables(Some("main"), None, Some("MT1"), None).expect("tables");
	assert!(rs.next().expect("row"));
	assert_eq!(rs.get_string(2).expect("schema"), "sqlite");
	assert_eq!(rs.get_string(4).expect("type"), "TABLE");
	for index in 5..=10 {
		assert_eq!(rs.get_value(index).expect("metadata column"), Value::Null);
		assert!(rs.was_null());
	}
	assert!(!rs.next().expect("single table"));
}

#[test]
fn closed_connection_has_no_catalog() {
	let (_dir, mut db) = attached_fixture();
	db.close().expect("close");
	assert!(db.catalog().is_err());
}
