// SPDX-License-Identifier: Apache-2.0

//! The MessagePack writer (spec §4.7): always picks the smallest legal
//! encoding for a value (fixint over `uint 8` over `uint 16`, etc.), mirroring
//! the reader's tagged-enum classification in reverse.

use std::io::Write;
use crate::error::{Error, Result};
use crate::msgpack::value::{Timestamp, TIMESTAMP_EXT_TYPE};

/// Where encoded bytes go: either appended to an in-memory buffer, or
/// written straight through to a [`Write`] sink.
pub trait ByteSink {
	fn put(&mut self, bytes: &[u8]) -> Result<()>;
}

pub struct BufferSink(Vec<u8>);

impl ByteSink for BufferSink {
	fn put(&mut self, bytes: &[u8]) -> Result<()> {
		self.0.extend_from_slice(bytes);
		Ok(())
	}
}

pub struct StreamSink<W>(W);

impl<W: Write> ByteSink for StreamSink<W> {
	fn put(&mut self, bytes: &[u8]) -> Result<()> {
		self.0.write_all(bytes)?;
		Ok(())
	}
}

pub type MsgPackStringWriter = MsgPackWriter<BufferSink>;
pub type MsgPackStreamWriter<W> = MsgPackWriter<StreamSink<W>>;

/// A nesting scope opened by `begin_array`/`begin_map`, tracked only to
/// assert the caller doesn't exceed the declared element count (spec §4.7,
/// §9's "scope guard" redesign note).
struct Scope {
	remaining: usize,
}

pub struct MsgPackWriter<S> {
	sink: S,
	scopes: Vec<Scope>,
}

impl MsgPackWriter<BufferSink> {
	pub fn new() -> Self {
		Self { sink: BufferSink(Vec::new()), scopes: Vec::new() }
	}

	pub fn into_bytes(self) -> Vec<u8> { self.sink.0 }
}

impl Default for MsgPackWriter<BufferSink> {
	fn default() -> Self { Self::new() }
}

impl<W: Write> MsgPackWriter<StreamSink<W>> {
	pub fn from_stream(inner: W) -> Self {
		Self { sink: StreamSink(inner), scopes: Vec::new() }
	}

	pub fn into_inner(self) -> W { self.sink.0 }
}

impl<S: ByteSink> MsgPackWriter<S> {
	fn put(&mut self, bytes: &[u8]) -> Result<()> { self.sink.put(bytes) }

	/// Decrements the innermost open scope's remaining count, erroring if
	/// the value would overrun a declared array/map size (spec §4.7).
	fn consume_scope_slot(&mut self) -> Result<()> {
		if let Some(scope) = self.scopes.last_mut() {
			if scope.remaining == 0 {
				return Err(Error::out_of_range("write exceeded the declared container size"));
			}
			scope.remaining -= 1;
		}
		Ok(())
	}

	pub fn write_nil(&mut self) -> Result<()> {
		self.consume_scope_slot()?;
		self.put(&[0xC0])
	}

	pub fn write_bool(&mut self, value: bool) -> Result<()> {
		self.consume_scope_slot()?;
		self.put(&[if value { 0xC3 } else { 0xC2 }])
	}

	pub fn write_u64(&mut self, value: u64) -> Result<()> {
		self.consume_scope_slot()?;
		if value <= 0x7F {
			self.put(&[value as u8])
		} else if value <= u8::MAX as u64 {
			self.put(&[0xCC, value as u8])
		} else if value <= u16::MAX as u64 {
			let mut buf = [0xCD; 3];
			buf[1..].copy_from_slice(&(value as u16).to_be_bytes());
			self.put(&buf)
		} else if value <= u32::MAX as u64 {
			let mut buf = [0xCE; 5];
			buf[1..].copy_from_slice(&(value as u32).to_be_bytes());
			self.put(&buf)
		} else {
			let mut buf = [0xCF; 9];
			buf[1..].copy_from_slice(&value.to_be_bytes());
			self.put(&buf)
		}
	}

	pub fn write_i64(&mut self, value: i64) -> Result<()> {
		if value >= 0 {
			return self.write_u64(value as u64);
		}
		self.consume_scope_slot()?;
		if value >= -32 {
			self.put(&[value as i8 as u8])
		} else if value >= i8::MIN as i64 {
			self.put(&[0xD0, value as i8 as u8])
		} else if value >= i16::MIN as i64 {
			let mut buf = [0xD1; 3];
			buf[1..].copy_from_slice(&(value as i16).to_be_bytes());
			self.put(&buf)
		} else if value >= i32::MIN as i64 {
			let mut buf = [0xD2; 5];
			buf[1..].copy_from_slice(&(value as i32).to_be_bytes());
			self.put(&buf)
		} else {
			let mut buf = [0xD3; 9];
			buf[1..].copy_from_slice(&value.to_be_bytes());
			self.put(&buf)
		}
	}

	pub fn write_u8(&mut self, value: u8) -> Result<()> { self.write_u64(value as u64) }
	pub fn write_u16(&mut self, value: u16) -> Result<()> { self.write_u64(value as u64) }
	pub fn write_u32(&mut self, value: u32) -> Result<()> { self.write_u64(value as u64) }
	pub fn write_i8(&mut self, value: i8) -> Result<()> { self.write_i64(value as i64) }
	pub fn write_i16(&mut self, value: i16) -> Result<()> { self.write_i64(value as i64) }
	pub fn write_i32(&mut self, value: i32) -> Result<()> { self.write_i64(value as i64) }

	pub fn write_f32(&mut self, value: f32) -> Result<()> {
		self.consume_scope_slot()?;
		let mut buf = [0xCA; 5];
		buf[1..].copy_from_slice(&value.to_be_bytes());
		self.put(&buf)
	}

	pub fn write_f64(&mut self, value: f64) -> Result<()> {
		self.consume_scope_slot()?;
		let mut buf = [0xCB; 9];
		buf[1..].copy_from_slice(&value.to_be_bytes());
		self.put(&buf)
	}

	pub fn write_string(&mut self, value: &str) -> Result<()> {
		self.consume_scope_slot()?;
		let bytes = value.as_bytes();
		let len = bytes.len();
		if len <= 31 {
			self.put(&[0xA0 | len as u8])?;
		} else if len <= u8::MAX as usize {
			self.put(&[0xD9, len as u8])?;
		} else if len <= u16::MAX as usize {
			let mut head = [0xDA; 3];
			head[1..].copy_from_slice(&(len as u16).to_be_bytes());
			self.put(&head)?;
		} else {
			let mut head = [0xDB; 5];
			head[1..].copy_from_slice(&(len as u32).to_be_bytes());
			self.put(&head)?;
		}
		self.put(bytes)
	}

	pub fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
		self.consume_scope_slot()?;
		let len = bytes.len();
		if len <= u8::MAX as usize {
			self.put(&[0xC4, len as u8])?;
		} else if len <= u16::MAX as usize {
			let mut head = [0xC5; 3];
			head[1..].copy_from_slice(&(len as u16).to_be_bytes());
			self.put(&head)?;
		} else {
			let mut head = [0xC6; 5];
			head[1..].copy_from_slice(&(len as u32).to_be_bytes());
			self.put(&head)?;
		}
		self.put(bytes)
	}

	pub fn write_timestamp(&mut self, ts: Timestamp) -> Result<()> {
		self.consume_scope_slot()?;
		let payload = ts.encode_payload();
		match payload.len() {
			4 => {
				self.put(&[0xD6, TIMESTAMP_EXT_TYPE as u8])?;
				self.put(&payload)
			}
			8 => {
				self.put(&[0xD7, TIMESTAMP_EXT_TYPE as u8])?;
				self.put(&payload)
			}
			12 => {
				self.put(&[0xC7, 12, TIMESTAMP_EXT_TYPE as u8])?;
				self.put(&payload)
			}
			_ => unreachable!("Timestamp::encode_payload only produces 4, 8, or 12 bytes"),
		}
	}

	/// Opens an array scope of `len` elements (spec §4.7): every following
	/// write up to the matching count is tracked against overrun.
	pub fn begin_array(&mut self, len: usize) -> Result<()> {
		self.consume_scope_slot()?;
		self.write_container_header(len, 0x90, 0xDC, 0xDD)?;
		self.scopes.push(Scope { remaining: len });
		Ok(())
	}

	/// Opens a map scope of `len` key/value pairs (spec §4.7); each pair
	/// counts as two writes against the scope.
	pub fn begin_map(&mut self, len: usize) -> Result<()> {
		self.consume_scope_slot()?;
		self.write_container_header(len, 0x80, 0xDE, 0xDF)?;
		self.scopes.push(Scope { remaining: len * 2 });
		Ok(())
	}

	/// Closes the innermost scope, erroring if it was left short (spec §4.7).
	pub fn end_container(&mut self) -> Result<()> {
		match self.scopes.pop() {
			Some(scope) if scope.remaining != 0 => {
				Err(Error::out_of_range("container closed before its declared size was written"))
			}
			Some(_) => Ok(()),
			None => Err(Error::out_of_range("no open container to close")),
		}
	}

	fn write_container_header(&mut self, len: usize, fix_base: u8, tag16: u8, tag32: u8) -> Result<()> {
		if len <= 15 {
			self.put(&[fix_base | len as u8])
		} else if len <= u16::MAX as usize {
			let mut head = [tag16; 3];
			head[1..].copy_from_slice(&(len as u16).to_be_bytes());
			self.put(&head)
		} else if len <= u32::MAX as usize {
			let mut head = [tag32; 5];
			head[1..].copy_from_slice(&(len as u32).to_be_bytes());
			self.put(&head)
		} else {
			Err(Error::out_of_range("container size exceeds 2^32 - 1"))
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn picks_smallest_integer_encoding() {
		let mut w = MsgPackWriter::new();
		w.write_u64(5).unwrap();
		w.write_u64(200).unwrap();
		assert_eq!(w.into_bytes(), vec![0x05, 0xCC, 200]);
	}

	#[test]
	fn negative_values_use_signed_forms() {
		let mut w = MsgPackWriter::new();
		w.write_i64(-1).unwrap();
		w.write_i64(-100).unwrap();
		assert_eq!(w.into_bytes(), vec![0xFF, 0xD0, (-100i8) as u8]);
	}

	#[test]
	fn array_scope_rejects_overrun() {
		let mut w = MsgPackWriter::new();
		w.begin_array(1).unwrap();
		w.write_bool(true).unwrap();
		assert!(w.write_bool(false).is_err());
	}

	#[test]
	fn container_close_rejects_short_write() {
		let mut w = MsgPackWriter::new();
		w.begin_array(2).unwrap();
		w.write_bool(true).unwrap();
		assert!(w.end_container().is_err());
	}

	#[test]
	fn timestamp_round_trips_through_bytes() {
		let mut w = MsgPackWriter::new();
		w.write_timestamp(Timestamp::new(5, 0)).unwrap();
		assert_eq!(w.into_bytes(), vec![0xD6, 0xFF, 0, 0, 0, 5]);
	}
}
