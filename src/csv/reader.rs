// SPDX-License-Identifier: Apache-2.0

//! The CSV reader (spec §4.8): string mode borrows a `&str` outright, stream
//! mode decodes through an [`EncodedStreamReader`] into a growing text
//! buffer. Both modes share one row-scanning state machine; only how more
//! text becomes available differs, which is exactly what [`TextSource`]
//! abstracts.

use std::io::Read;
use crate::error::{Error, Result};
use crate::io::EncodedStreamReader;
use crate::options::{CsvOptions, UtfEncodingErrorPolicy};
use crate::csv::row::Row;

/// Supplies more decoded text to the row scanner on demand (spec §4.8
/// "Buffer management").
pub trait TextSource {
	/// Text from the current cursor to the end of what's buffered so far.
	fn remaining(&self) -> &str;
	/// True once no further text will ever become available.
	fn is_complete(&self) -> bool;
	/// Attempts to buffer more text. Returns `false` if the source turned
	/// out to already be complete.
	fn pull_more(&mut self) -> Result<bool>;
	/// Consumes `n` bytes (a full row, including its terminator) from the
	/// front of [`remaining`](Self::remaining).
	fn consume(&mut self, n: usize);
}

pub struct StringSource<'a> {
	text: &'a str,
	pos: usize,
}

impl<'a> StringSource<'a> {
	pub fn new(text: &'a str) -> Self { Self { text, pos: 0 } }
}

impl<'a> TextSource for StringSource<'a> {
	fn remaining(&self) -> &str { &self.text[self.pos..] }
	fn is_complete(&self) -> bool { true }
	fn pull_more(&mut self) -> Result<bool> { Ok(false) }
	fn consume(&mut self, n: usize) { self.pos += n; }
}

pub struct StreamSource<R, const N: usize = 256> {
	inner: EncodedStreamReader<R, N>,
	buffer: String,
	pos: usize,
	eof: bool,
}

impl<R: Read, const N: usize> StreamSource<R, N> {
	pub fn new(inner: R, utf_policy: UtfEncodingErrorPolicy) -> Result<Self> {
		Ok(Self {
			inner: EncodedStreamReader::new(inner, true, utf_policy)?,
			buffer: String::new(),
			pos: 0,
			eof: false,
		})
	}
}

impl<R: Read, const N: usize> TextSource for StreamSource<R, N> {
	fn remaining(&self) -> &str { &self.buffer[self.pos..] }
	fn is_complete(&self) -> bool { self.eof }
	fn pull_more(&mut self) -> Result<bool> {
		if self.eof { return Ok(false) }
		match self.inner.read_chunk(&mut self.buffer)? {
			crate::io::ReadResult::Success => Ok(true),
			crate::io::ReadResult::EndFile => { self.eof = true; Ok(false) }
			crate::io::ReadResult::DecodeError => Err(Error::utf("invalid encoding in CSV input")),
		}
	}
	fn consume(&mut self, n: usize) {
		self.pos += n;
		// Squeeze once half the working buffer lies before the cursor
		// (spec §4.8).
		if self.pos * 2 >= self.buffer.len() {
			self.buffer.drain(..self.pos);
			self.pos = 0;
		}
	}
}

pub type CsvStringReader<'a> = CsvReader<StringSource<'a>>;
pub type CsvStreamReader<R, const N: usize = 256> = CsvReader<StreamSource<R, N>>;

enum ScanOutcome {
	Row(Vec<String>, usize),
	NeedMoreData,
	End,
}

/// Scans one row out of `available`. Byte-level scanning for the ASCII
/// delimiters (`"`, separator, `\n`, `\r`) is safe on arbitrary UTF-8 text:
/// continuation bytes always have the high bit set, so they can never match
/// an ASCII delimiter, which means every offset this function slices at is
/// already a char boundary.
fn scan_row(available: &str, separator: u8, complete: bool) -> Result<ScanOutcome> {
	let bytes = available.as_bytes();
	if bytes.is_empty() {
		return Ok(if complete { ScanOutcome::End } else { ScanOutcome::NeedMoreData });
	}

	let mut fields = Vec::new();
	let mut i = 0usize;

	loop {
		let field_start = i;
		let value = if bytes.get(i) == Some(&b'"') {
			let mut j = i + 1;
			let mut value = String::new();
			let mut plain_start = j;
			loop {
				match bytes.get(j) {
					None => {
						if complete {
							return Err(Error::parsing("unterminated quoted CSV field"));
						}
						return Ok(ScanOutcome::NeedMoreData);
					}
					Some(b'"') => {
						if bytes.get(j + 1) == Some(&b'"') {
							value.push_str(&available[plain_start..=j]);
							j += 2;
							plain_start = j;
						} else if j + 1 == bytes.len() && !complete {
							return Ok(ScanOutcome::NeedMoreData);
						} else {
							value.push_str(&available[plain_start..j]);
							j += 1;
							break;
						}
					}
					Some(_) => j += 1,
				}
			}
			i = j;
			value
		} else {
			let mut j = i;
			loop {
				match bytes.get(j) {
					None => {
						if !complete { return Ok(ScanOutcome::NeedMoreData) }
						break;
					}
					Some(&b) if b == separator || b == b'\n' || b == b'\r' => break,
					Some(b'"') if j != field_start => {
						return Err(Error::parsing("unexpected quote inside an unquoted CSV field"));
					}
					Some(_) => j += 1,
				}
			}
			let value = available[field_start..j].to_string();
			i = j;
			value
		};

		fields.push(value);

		match bytes.get(i) {
			None => return Ok(ScanOutcome::Row(fields, i)),
			Some(&b) if b == separator => { i += 1; continue }
			Some(b'\n') => return Ok(ScanOutcome::Row(fields, i + 1)),
			Some(b'\r') => {
				if bytes.get(i + 1) == Some(&b'\n') {
					return Ok(ScanOutcome::Row(fields, i + 2));
				} else if i + 1 == bytes.len() && !complete {
					return Ok(ScanOutcome::NeedMoreData);
				} else {
					return Ok(ScanOutcome::Row(fields, i + 1));
				}
			}
			Some(_) => {
				return Err(Error::parsing("closing quote not immediately followed by a separator or line end"));
			}
		}
	}
}

pub struct CsvReader<T> {
	source: T,
	separator: u8,
	headers: Option<Row>,
	current: Option<Row>,
	expected_width: Option<usize>,
	cursor: usize,
	line: usize,
}

impl<T: TextSource> CsvReader<T> {
	fn construct(source: T, options: CsvOptions) -> Result<Self> {
		let mut reader = Self {
			source,
			separator: options.separator.as_byte(),
			headers: None,
			current: None,
			expected_width: None,
			cursor: 0,
			line: 0,
		};
		if options.with_header {
			if !reader.parse_next_row()? {
				return Err(Error::parsing("CSV input is empty but a header row was requested"));
			}
			let header_fields = reader.current.take().unwrap().fields;
			reader.expected_width = Some(header_fields.len());
			reader.headers = Some(Row::from(header_fields));
			reader.line = 1;
		}
		Ok(reader)
	}

	pub fn headers(&self) -> Option<&Row> { self.headers.as_ref() }

	pub fn current_row(&self) -> Option<&Row> { self.current.as_ref() }

	pub fn line(&self) -> usize { self.line }

	/// Parses the next row, making it the current row (spec §4.8).
	pub fn parse_next_row(&mut self) -> Result<bool> {
		loop {
			match scan_row(self.source.remaining(), self.separator, self.source.is_complete())? {
				ScanOutcome::Row(fields, consumed) => {
					self.source.consume(consumed);
					self.line += 1;
					if let Some(expected) = self.expected_width {
						if fields.len() != expected {
							return Err(Error::with_detail(
								crate::error::ErrorKind::ParsingError,
								format!("line {}: expected {} columns, found {}", self.line, expected, fields.len()),
							));
						}
					} else {
						self.expected_width = Some(fields.len());
					}
					self.current = Some(Row::from(fields));
					self.cursor = 0;
					return Ok(true);
				}
				ScanOutcome::NeedMoreData => {
					self.source.pull_more()?;
				}
				ScanOutcome::End => {
					self.current = None;
					return Ok(false);
				}
			}
		}
	}

	/// Reads the next value in declaration order (spec §4.8).
	pub fn read_value(&mut self) -> Result<&str> {
		let row = self.current.as_ref().ok_or_else(|| Error::parsing("no current CSV row"))?;
		let value = row.field(self.cursor).ok_or_else(|| Error::out_of_range("read past the last CSV column"))?;
		self.cursor += 1;
		Ok(value)
	}

	/// Reads the value for `key`, preferring the current cursor position
	/// (the common case of reading in header order) before falling back to
	/// a linear scan (spec §4.8).
	pub fn read_value_by_key(&mut self, key: &str) -> Result<&str> {
		let headers = self.headers.as_ref().ok_or_else(|| Error::invalid_options("reader has no headers"))?;
		let index = if headers.field(self.cursor) == Some(key) {
			self.cursor
		} else {
			headers.position_of(key).ok_or_else(|| Error::parsing(format!("unknown column \"{key}\"")))?
		};
		let row = self.current.as_ref().ok_or_else(|| Error::parsing("no current CSV row"))?;
		let value = row.field(index).ok_or_else(|| Error::out_of_range("read past the last CSV column"))?;
		self.cursor = index + 1;
		Ok(value)
	}

	/// Sets the read cursor to `index`, returning that column's header
	/// (spec §4.8).
	pub fn seek_to_header(&mut self, index: usize) -> Result<&str> {
		let headers = self.headers.as_ref().ok_or_else(|| Error::invalid_options("reader has no headers"))?;
		let header = headers.field(index).ok_or_else(|| Error::out_of_range("header index out of range"))?;
		self.cursor = index;
		Ok(header)
	}
}

impl<'a> CsvReader<StringSource<'a>> {
	pub fn from_str(text: &'a str, options: CsvOptions) -> Result<Self> {
		Self::construct(StringSource::new(text), options)
	}
}

impl<R: Read, const N: usize> CsvReader<StreamSource<R, N>> {
	pub fn from_stream(inner: R, options: CsvOptions, utf_policy: UtfEncodingErrorPolicy) -> Result<Self> {
		Self::construct(StreamSource::new(inner, utf_policy)?, options)
	}
}
