use std::env;
use std::path::PathBuf;

fn main() {
	println!("cargo:rerun-if-env-changed=SQLITE3_LIB_DIR");

	let bundled = env::var_os("CARGO_FEATURE_BUNDLED_SQLITE").is_some();

	match bundled {
		true => build_bundled(),
		false => link_system(),
	}
}

fn build_bundled() {
	let manifest_dir =
		PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
	let sqlite_dir = manifest_dir.join("..").join("..").join("sqlite3");
	let sqlite_c = sqlite_dir.join("sqlite3.c");

	assert!(
		sqlite_c.exists(),
		"missing bundled SQLite amalgamation at {} (download sqlite-amalgamation into sqlite3/)",
		sqlite_c.display()
	);

	println!("cargo:rerun-if-changed={}", sqlite_c.display());
	println!("cargo:rerun-if-env-changed=LIBSQLITE3_FLAGS");

	let mut build = cc::Build::new();
	build.file(&sqlite_c).include(&sqlite_dir).warnings(false);

	// Column metadata backs lazy source-table resolution on result columns.
	for (name, value) in [
		("SQLITE_CORE", None),
		("SQLITE_DEFAULT_FOREIGN_KEYS", Some("1")),
		("SQLITE_ENABLE_API_ARMOR", None),
		("SQLITE_ENABLE_COLUMN_METADATA", None),
		("SQLITE_ENABLE_FTS5", None),
		("SQLITE_ENABLE_JSON1", None),
		("SQLITE_ENABLE_RTREE", None),
		("SQLITE_THREADSAFE", Some("1")),
		("SQLITE_USE_URI", None),
		("HAVE_ISNAN", None),
		("HAVE_USLEEP", Some("1")),
	] {
		build.define(name, value);
	}

	if !env::var("CARGO_CFG_WINDOWS").is_ok_and(|v| !v.is_empty()) {
		build.define("HAVE_LOCALTIME_R", None);
	}

	if let Ok(extras) = env::var("LIBSQLITE3_FLAGS") {
		for extra in extras.split_whitespace() {
			if let Some(rest) = extra.strip_prefix("-D") {
				define_flag(&mut build, rest);
			} else if let Some(rest) = extra.strip_prefix("SQLITE_") {
				define_flag(&mut build, &format!("SQLITE_{rest}"));
			}
		}
	}

	build.compile("sqlite3");
}

fn link_system() {
	if let Ok(dir) = env::var("SQLITE3_LIB_DIR") {
		println!("cargo:rustc-link-search=native={dir}");
		println!("cargo:rustc-link-lib=dylib=sqlite3");
		return;
	}

	let linked = pkg_config::Config::new()
		.atleast_version("3.34.1")
		.print_system_libs(false)
		.probe("sqlite3")
		.is_ok();

	if !linked {
		println!("cargo:rustc-link-lib=dylib=sqlite3");
	}
}

fn define_flag(build: &mut cc::Build, define: &str) {
	if let Some((name, value)) = define.split_once('=') {
		build.define(name, Some(value));
	} else {
		build.define(define, None);
	}
}
