//! URL based connection factories.
//!
//! A target looks like `sqlite:<path>[?<options>]`. The only option understood
//! is `autocommit`; anything else after the `?` is ignored.

use tracing::debug;

use crate::connection::{Connection, OpenOptions};
use crate::error::{Error, Result};

pub const URL_PREFIX: &str = "sqlite:";

/// Something that can turn a connection URL into an open [`Connection`].
pub trait ConnectionFactory {
	fn name(&self) -> &str;

	fn accepts_url(&self, url: &str) -> bool;

	/// Returns `Ok(None)` for URLs this factory does not handle.
	fn connect(&self, url: &str) -> Result<Option<Connection>>;
}

/// Factory for `sqlite:` URLs.
#[derive(Debug, Default, Copy, Clone)]
pub struct Driver;

impl Driver {
	/// Splits an accepted URL into the database path and the options it
	/// requests.
	pub fn parse_url(url: &str) -> Option<(String, OpenOptions)> {
		let rest = strip_prefix_ignore_case(url, URL_PREFIX)?;
		let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

		let mut options = OpenOptions::new();
		for pair in query.to_lowercase().split('&') {
			if let Some(("autocommit", value)) = pair.split_once('=') {
				options = options.autocommit(matches!(value, "1" | "true" | "yes"));
			}
		}

		Some((path.to_string(), options))
	}
}

impl ConnectionFactory for Driver {
	fn name(&self) -> &str {
		"sqlite"
	}

	fn accepts_url(&self, url: &str) -> bool {
		strip_prefix_ignore_case(url, URL_PREFIX).is_some()
	}

	fn connect(&self, url: &str) -> Result<Option<Connection>> {
		let Some((path, options)) = Self::parse_url(url) else {
			return Ok(None);
		};
		debug!(url, "connecting through driver");
		Connection::open_with(&path, &options).map(Some)
	}
}

fn strip_prefix_ignore_case<'a>(url: &'a str, prefix: &str) -> Option<&'a str> {
	let head = url.get(..prefix.len())?;
	if head.eq_ignore_ascii_case(prefix) { url.get(prefix.len()..) } else { None }
}

/// An ordered set of factories, consulted in registration order.
#[derive(Default)]
pub struct DriverRegistry {
	factories: Vec<Box<dyn ConnectionFactory>>,
}

impl DriverRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry with [`Driver`] already registered.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(Driver);
		registry
	}

	pub fn register(&mut self, factory: impl ConnectionFactory + 'static) {
		debug!(name = factory.name(), "registered connection factory");
		self.factories.push(Box::new(factory));
	}

	pub fn names(&self) -> Vec<&str> {
		self.factories.iter().map(|factory| factory.name()).collect()
	}

	/// Opens `url` with the first factory that accepts it.
	pub fn connect(&self, url: &str) -> Result<Connection> {
		for factory in self.factories.iter().filter(|factory| factory.accepts_url(url)) {
			if let Some(conn) = factory.connect(url)? {
				return Ok(conn);
			}
		}
		Err(Error::NoDriver(url.to_string()))
	}
}
