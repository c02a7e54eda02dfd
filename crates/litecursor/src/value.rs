use std::fmt;

use chrono::{DateTime, Utc};

/// A single decoded cell, shaped after the engine's fundamental datatypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Integer(i64),
	Float(f64),
	Text(String),
	Blob(Vec<u8>),
}

impl Value {
	pub const fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Integer view using the engine's coercion rules: null is zero, reals
	/// truncate toward zero, text contributes its leading numeric prefix.
	#[expect(clippy::cast_possible_truncation)]
	pub fn to_i64(&self) -> i64 {
		match self {
			Self::Null => 0,
			Self::Integer(v) => *v,
			Self::Float(v) => *v as i64,
			Self::Text(v) => text_to_i64(v),
			Self::Blob(v) => text_to_i64(&String::from_utf8_lossy(v)),
		}
	}

	#[expect(clippy::cast_precision_loss)]
	pub fn to_f64(&self) -> f64 {
		match self {
			Self::Null => 0.0,
			Self::Integer(v) => *v as f64,
			Self::Float(v) => *v,
			Self::Text(v) => text_to_f64(v),
			Self::Blob(v) => text_to_f64(&String::from_utf8_lossy(v)),
		}
	}

	pub fn to_text(&self) -> String {
		match self {
			Self::Null => String::new(),
			Self::Integer(v) => v.to_string(),
			Self::Float(v) => format_real(*v),
			Self::Text(v) => v.clone(),
			Self::Blob(v) => String::from_utf8_lossy(v).into_owned(),
		}
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		match self {
			Self::Null => Vec::new(),
			Self::Blob(v) => v.clone(),
			other => other.to_text().into_bytes(),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("NULL"),
			Self::Integer(v) => write!(f, "{v}"),
			Self::Float(v) => f.write_str(&format_real(*v)),
			Self::Text(v) => f.write_str(v),
			Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
		}
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Integer(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Integer(i64::from(value))
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Integer(i64::from(value))
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

/// Stored as milliseconds since the Unix epoch.
impl From<DateTime<Utc>> for Value {
	fn from(value: DateTime<Utc>) -> Self {
		Self::Integer(value.timestamp_millis())
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<&[u8]> for Value {
	fn from(value: &[u8]) -> Self {
		Self::Blob(value.to_vec())
	}
}

impl From<Vec<u8>> for Value {
	fn from(value: Vec<u8>) -> Self {
		Self::Blob(value)
	}
}

impl<T: Into<Self>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Renders a real the way the engine does: 15 significant digits, always
/// with a decimal point, exponent form outside `1e-4..1e15`.
pub(crate) fn format_real(v: f64) -> String {
	if v.is_nan() {
		return "NaN".to_string();
	}
	if v.is_infinite() {
		return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
	}

	let scientific = format!("{v:.14e}");
	let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
	let exponent: i32 = exponent.parse().unwrap_or_default();

	if !(-4..15).contains(&exponent) {
		let sign = if exponent < 0 { '-' } else { '+' };
		return format!("{}e{sign}{:02}", with_point(mantissa), exponent.unsigned_abs());
	}

	let decimals = usize::try_from(14 - exponent).unwrap_or_default();
	with_point(&format!("{v:.decimals$}"))
}

/// Drops trailing fractional zeros but keeps at least one digit after the
/// point.
fn with_point(digits: &str) -> String {
	let Some((whole, fraction)) = digits.split_once('.') else {
		return format!("{digits}.0");
	};
	let fraction = fraction.trim_end_matches('0');
	if fraction.is_empty() { format!("{whole}.0") } else { format!("{whole}.{fraction}") }
}

/// Longest prefix of `text` (after leading whitespace) that reads as a number.
fn numeric_prefix(text: &str) -> (&str, bool) {
	let text = text.trim_start();
	let bytes = text.as_bytes();
	let mut end = 0;
	let mut digits = 0;
	let mut real = false;

	if matches!(bytes.first(), Some(b'+' | b'-')) {
		end += 1;
	}
	while bytes.get(end).is_some_and(u8::is_ascii_digit) {
		end += 1;
		digits += 1;
	}
	if bytes.get(end) == Some(&b'.') {
		let mut scan = end + 1;
		while bytes.get(scan).is_some_and(u8::is_ascii_digit) {
			scan += 1;
			digits += 1;
		}
		if scan > end + 1 || digits > 0 {
			real = true;
			end = scan;
		}
	}
	if digits > 0 && matches!(bytes.get(end), Some(b'e' | b'E')) {
		let mut scan = end + 1;
		if matches!(bytes.get(scan), Some(b'+' | b'-')) {
			scan += 1;
		}
		let exponent_start = scan;
		while bytes.get(scan).is_some_and(u8::is_ascii_digit) {
			scan += 1;
		}
		if scan > exponent_start {
			real = true;
			end = scan;
		}
	}

	if digits == 0 { ("", false) } else { (text.get(..end).unwrap_or_default(), real) }
}

#[expect(clippy::cast_possible_truncation)]
fn text_to_i64(text: &str) -> i64 {
	match numeric_prefix(text) {
		("", _) => 0,
		(prefix, false) => {
			prefix.parse::<i64>().unwrap_or_else(|_| prefix.parse::<f64>().unwrap_or_default() as i64)
		}
		(prefix, true) => prefix.parse::<f64>().unwrap_or_default() as i64,
	}
}

fn text_to_f64(text: &str) -> f64 {
	let (prefix, _) = numeric_prefix(text);
	prefix.parse::<f64>().unwrap_or_default()
}
