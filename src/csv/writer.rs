// SPDX-License-Identifier: Apache-2.0

//! The CSV writer (spec §4.9): string mode accumulates into an owned
//! `String`, stream mode writes through an [`EncodedStreamWriter`]. Both
//! share the same escaping and row-width-enforcement logic.

use std::borrow::Cow;
use std::io::Write;
use crate::error::{Error, Result};
use crate::io::EncodedStreamWriter;
use crate::options::{CsvOptions, StreamOptions};

pub trait TextSink {
	fn write_str(&mut self, s: &str) -> Result<()>;
}

pub struct StringSink(String);

impl TextSink for StringSink {
	fn write_str(&mut self, s: &str) -> Result<()> {
		self.0.push_str(s);
		Ok(())
	}
}

pub struct StreamSink<W>(EncodedStreamWriter<W>);

impl<W: Write> TextSink for StreamSink<W> {
	fn write_str(&mut self, s: &str) -> Result<()> { self.0.write_str(s) }
}

pub type CsvStringWriter = CsvWriter<StringSink>;
pub type CsvStreamWriter<W> = CsvWriter<StreamSink<W>>;

/// Wraps `value` in `"…"` with inner `"` doubled, if it contains the
/// separator, a quote, or a line break (spec §4.9 "Escaping").
fn escape_field(separator: u8, value: &str) -> Cow<'_, str> {
	let needs_quoting = value.bytes().any(|b| b == separator || b == b'"' || b == b'\n' || b == b'\r');
	if !needs_quoting {
		return Cow::Borrowed(value);
	}
	let mut escaped = String::with_capacity(value.len() + 2);
	escaped.push('"');
	for ch in value.chars() {
		if ch == '"' { escaped.push('"') }
		escaped.push(ch);
	}
	escaped.push('"');
	Cow::Owned(escaped)
}

pub struct CsvWriter<S> {
	sink: S,
	separator: u8,
	with_header: bool,
	header_fields: Vec<String>,
	current_row: Vec<String>,
	expected_width: Option<usize>,
	first_row: bool,
}

impl<S: TextSink> CsvWriter<S> {
	fn construct(sink: S, options: CsvOptions) -> Self {
		Self {
			sink,
			separator: options.separator.as_byte(),
			with_header: options.with_header,
			header_fields: Vec::new(),
			current_row: Vec::new(),
			expected_width: None,
			first_row: true,
		}
	}

	/// Accumulates a header key. Only meaningful during the first row, and
	/// only if `with_header` was set (spec §4.9).
	pub fn write_header_field(&mut self, key: &str) -> Result<()> {
		if !self.first_row {
			return Err(Error::invalid_options("headers can only be written before the first row"));
		}
		self.header_fields.push(escape_field(self.separator, key).into_owned());
		Ok(())
	}

	pub fn write_field(&mut self, value: &str) -> Result<()> {
		self.current_row.push(escape_field(self.separator, value).into_owned());
		Ok(())
	}

	fn join_row(&self, fields: &[String]) -> String {
		let separator = self.separator as char;
		let mut line = String::new();
		for (i, field) in fields.iter().enumerate() {
			if i > 0 { line.push(separator) }
			line.push_str(field);
		}
		line.push_str("\r\n");
		line
	}

	/// Flushes the accumulated row (and, on the first row, the header row
	/// first) and starts a new one (spec §4.9).
	pub fn next_line(&mut self) -> Result<()> {
		if self.first_row {
			if self.with_header && !self.header_fields.is_empty() {
				let header_line = self.join_row(&self.header_fields);
				self.sink.write_str(&header_line)?;
			}
			self.expected_width = Some(self.current_row.len());
			self.first_row = false;
		} else if let Some(expected) = self.expected_width {
			if self.current_row.len() != expected {
				return Err(Error::out_of_range(format!(
					"row has {} columns, expected {expected}",
					self.current_row.len()
				)));
			}
		}

		let line = self.join_row(&self.current_row);
		self.sink.write_str(&line)?;
		self.current_row.clear();
		Ok(())
	}
}

impl CsvWriter<StringSink> {
	pub fn new(options: CsvOptions) -> Self { Self::construct(StringSink(String::new()), options) }

	/// Reserves capacity in the output buffer (spec §4.9 `set_estimated_size`).
	pub fn set_estimated_size(&mut self, n: usize) { self.sink.0.reserve(n); }

	pub fn into_string(self) -> String { self.sink.0 }
}

impl<W: Write> CsvWriter<StreamSink<W>> {
	pub fn from_stream(inner: W, options: CsvOptions, stream_options: StreamOptions) -> Result<Self> {
		let sink = StreamSink(EncodedStreamWriter::new(inner, stream_options)?);
		Ok(Self::construct(sink, options))
	}

	pub fn into_inner(self) -> W { self.sink.0.into_inner() }
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn writes_header_then_rows() {
		let mut w = CsvWriter::new(CsvOptions::default());
		w.write_header_field("a").unwrap();
		w.write_header_field("b").unwrap();
		w.write_field("1").unwrap();
		w.write_field("2").unwrap();
		w.next_line().unwrap();
		w.write_field("3").unwrap();
		w.write_field("4").unwrap();
		w.next_line().unwrap();
		assert_eq!(w.into_string(), "a,b\r\n1,2\r\n3,4\r\n");
	}

	#[test]
	fn escapes_fields_needing_quoting() {
		let mut w = CsvWriter::new(CsvOptions::default());
		w.write_field("Smith, John").unwrap();
		w.write_field("plain").unwrap();
		w.write_field("has \"quote\"").unwrap();
		w.next_line().unwrap();
		assert_eq!(w.into_string(), "\"Smith, John\",plain,\"has \"\"quote\"\"\"\r\n");
	}

	#[test]
	fn row_width_mismatch_is_out_of_range() {
		let mut w = CsvWriter::new(CsvOptions::default());
		w.write_field("1").unwrap();
		w.write_field("2").unwrap();
		w.next_line().unwrap();
		w.write_field("3").unwrap();
		assert!(w.next_line().is_err());
	}

	#[quickcheck_macros::quickcheck]
	fn write_then_read_field_is_identity(value: String) -> bool {
		use crate::csv::reader::CsvReader;

		let mut w = CsvWriter::new(CsvOptions::default());
		w.write_field(&value).unwrap();
		w.next_line().unwrap();
		let text = w.into_string();

		let mut r = CsvReader::from_str(&text, CsvOptions::default()).unwrap();
		r.parse_next_row().unwrap() && r.read_value().unwrap() == value
	}
}
