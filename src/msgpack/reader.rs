// SPDX-License-Identifier: Apache-2.0

//! The MessagePack reader (spec §4.6): one generic implementation over a
//! [`ByteSource`], instantiated as [`MsgPackStringReader`] (borrows a byte
//! slice) and [`MsgPackStreamReader`] (reads through a
//! [`crate::io::BinaryStreamReader`]). Per spec §9's guidance, this avoids
//! runtime dispatch on the hot byte-classification path — both instances
//! monomorphize to the same code with `S` inlined.
//!
//! String views are returned as owned [`String`]s for both instantiations.
//! The spec's reference design returns a borrowed view for the string
//! reader; doing the same here would need a generic associated type on
//! [`ByteSource`] to express "the peeked slice may outlive one read-side
//! call only for the string-reader instantiation". We traded that
//! zero-copy optimization for one concrete, monomorphic reader type — see
//! `DESIGN.md`.

use std::io::{Read, Seek};
use crate::error::{Error, Result};
use crate::io::BinaryStreamReader;
use crate::options::{MismatchedTypesPolicy, OverflowNumberPolicy, SerializationOptions};
use crate::msgpack::value::{classify, read_size_prefix, Header, Timestamp, ValueType, TIMESTAMP_EXT_TYPE};

/// The byte-level operations the MessagePack reader needs: peek ahead
/// without consuming, consume, and (for random access) reposition.
pub trait ByteSource {
	fn position(&self) -> u64;
	fn is_end(&mut self) -> bool;
	/// Peeks up to `n` bytes ahead without consuming. Returns fewer than
	/// `n` if the source has fewer remaining.
	fn peek(&mut self, n: usize) -> &[u8];
	/// Consumes `n` previously-peeked bytes.
	fn advance(&mut self, n: usize);
	fn set_position(&mut self, pos: u64) -> bool;
}

pub struct SliceSource<'a> {
	data: &'a [u8],
	pos: usize,
}

impl<'a> SliceSource<'a> {
	pub fn new(data: &'a [u8]) -> Self { Self { data, pos: 0 } }
}

impl<'a> ByteSource for SliceSource<'a> {
	fn position(&self) -> u64 { self.pos as u64 }
	fn is_end(&mut self) -> bool { self.pos >= self.data.len() }
	fn peek(&mut self, n: usize) -> &[u8] {
		let end = (self.pos + n).min(self.data.len());
		&self.data[self.pos..end]
	}
	fn advance(&mut self, n: usize) {
		debug_assert!(self.pos + n <= self.data.len());
		self.pos += n;
	}
	fn set_position(&mut self, pos: u64) -> bool {
		if pos as usize > self.data.len() { return false }
		self.pos = pos as usize;
		true
	}
}

impl<R: Read + Seek, const N: usize> ByteSource for BinaryStreamReader<R, N> {
	fn position(&self) -> u64 { self.get_position() }
	fn is_end(&mut self) -> bool { BinaryStreamReader::is_end(self) }
	fn peek(&mut self, n: usize) -> &[u8] { self.peek_solid_block(n) }
	fn advance(&mut self, n: usize) { BinaryStreamReader::advance(self, n) }
	fn set_position(&mut self, pos: u64) -> bool { BinaryStreamReader::set_position(self, pos) }
}

pub type MsgPackStringReader<'a> = MsgPackReader<SliceSource<'a>>;
pub type MsgPackStreamReader<R, const N: usize = 256> = MsgPackReader<BinaryStreamReader<R, N>>;

pub struct MsgPackReader<S> {
	source: S,
	options: SerializationOptions,
}

impl<'a> MsgPackReader<SliceSource<'a>> {
	pub fn from_slice(data: &'a [u8], options: SerializationOptions) -> Self {
		Self { source: SliceSource::new(data), options }
	}
}

impl<R: Read + Seek, const N: usize> MsgPackReader<BinaryStreamReader<R, N>> {
	pub fn from_stream(inner: R, options: SerializationOptions) -> Self {
		Self { source: BinaryStreamReader::new(inner), options }
	}
}

/// A value's leading byte(s) plus the value type they resolve to (after the
/// `Ext{-1}` ⇒ `Timestamp` special case).
struct Peeked {
	header: Header,
	value_type: ValueType,
	/// Bytes consumed by the header itself (leading byte + size prefix +
	/// optional ext type byte), NOT including the payload.
	header_len: usize,
}

impl<S: ByteSource> MsgPackReader<S> {
	pub fn get_position(&self) -> u64 { self.source.position() }

	pub fn set_position(&mut self, pos: u64) -> bool { self.source.set_position(pos) }

	pub fn is_end(&mut self) -> bool { self.source.is_end() }

	fn peek(&mut self) -> Result<Peeked> {
		let lead = self.source.peek(1);
		let Some(&byte) = lead.first() else {
			return Err(Error::parsing("unexpected end of MessagePack stream"));
		};
		let header = classify(byte);
		if matches!(header, Header::Reserved) {
			return Err(Error::parsing("reserved byte 0xC1 is never a valid MessagePack value"));
		}

		let size_prefix_len = header.size_prefix_len();
		if header.has_ext_type_byte() {
			let window = self.source.peek(1 + size_prefix_len + 1);
			if window.len() < 1 + size_prefix_len + 1 {
				return Err(Error::parsing("truncated ext header"));
			}
			let type_byte = window[1 + size_prefix_len] as i8;
			let value_type = if type_byte == TIMESTAMP_EXT_TYPE { ValueType::Timestamp } else { ValueType::Ext };
			Ok(Peeked { header, value_type, header_len: 1 + size_prefix_len + 1 })
		} else {
			Ok(Peeked { header, value_type: header.value_type(), header_len: 1 + size_prefix_len })
		}
	}

	/// Reads the value type at the cursor without consuming it (spec §4.6).
	pub fn read_value_type(&mut self) -> Result<ValueType> {
		Ok(self.peek()?.value_type)
	}

	fn container_count(&mut self, peeked: &Peeked) -> usize {
		match peeked.header {
			Header::FixArray(n) | Header::FixMap(n) | Header::FixStr(n) => n,
			Header::ArrayN { size_bytes } | Header::MapN { size_bytes } |
			Header::Str { size_bytes } | Header::Bin { size_bytes } => {
				let window = self.source.peek(peeked.header_len);
				read_size_prefix(&window[1..], size_bytes)
			}
			Header::ExtSized { size_bytes } => {
				let window = self.source.peek(1 + size_bytes as usize);
				read_size_prefix(&window[1..], size_bytes)
			}
			Header::ExtFixed { len } => len,
			_ => 0,
		}
	}

	/// Recursively skips the value at the cursor (spec §4.6 skip-value
	/// algorithm).
	pub fn skip_value(&mut self) -> Result<()> {
		let peeked = self.peek()?;
		match peeked.header {
			Header::FixArray(_) | Header::ArrayN { .. } => {
				let n = self.container_count(&peeked);
				self.source.advance(peeked.header_len);
				for _ in 0..n { self.skip_value()?; }
			}
			Header::FixMap(_) | Header::MapN { .. } => {
				let n = self.container_count(&peeked);
				self.source.advance(peeked.header_len);
				for _ in 0..n {
					self.skip_value()?; // key
					self.skip_value()?; // value
				}
			}
			Header::FixStr(n) => self.source.advance(peeked.header_len + n),
			Header::Str { .. } | Header::Bin { .. } => {
				let n = self.container_count(&peeked);
				self.source.advance(peeked.header_len);
				self.skip_payload(n)?;
			}
			Header::ExtFixed { len } => {
				self.source.advance(peeked.header_len);
				self.skip_payload(len)?;
			}
			Header::ExtSized { .. } => {
				let n = self.container_count(&peeked);
				self.source.advance(peeked.header_len);
				self.skip_payload(n)?;
			}
			Header::Float32 => self.source.advance(peeked.header_len + 4),
			Header::Float64 => self.source.advance(peeked.header_len + 8),
			Header::Uint { size_bytes } | Header::Int { size_bytes } => {
				self.source.advance(peeked.header_len + size_bytes as usize);
			}
			Header::PosFixint(_) | Header::NegFixint(_) | Header::Nil | Header::Bool(_) => {
				self.source.advance(peeked.header_len);
			}
			Header::Reserved => unreachable!("filtered out in peek()"),
		}
		Ok(())
	}

	/// Applies the mismatched-types/nil-exemption protocol shared by every
	/// typed read: nil always degrades silently; a type mismatch degrades
	/// under `Skip` (after skipping the value) or raises under `ThrowError`.
	fn expect(&mut self, accepts: impl Fn(ValueType) -> bool, expected_name: &str) -> Result<Option<Peeked>> {
		let peeked = self.peek()?;
		if peeked.value_type == ValueType::Nil {
			self.source.advance(peeked.header_len);
			return Ok(None);
		}
		if !accepts(peeked.value_type) {
			return match self.options.mismatched_types_policy {
				MismatchedTypesPolicy::Skip => {
					self.skip_value()?;
					Ok(None)
				}
				MismatchedTypesPolicy::ThrowError => {
					Err(Error::mismatched_types(expected_name, peeked.value_type.name()))
				}
			};
		}
		Ok(Some(peeked))
	}

	fn read_raw_integer(&mut self, peeked: &Peeked) -> i128 {
		let value = match peeked.header {
			Header::PosFixint(v) => v as i128,
			Header::NegFixint(v) => v as i128,
			Header::Uint { size_bytes } => {
				let window = self.source.peek(peeked.header_len + size_bytes as usize);
				let bytes = &window[1..1 + size_bytes as usize];
				read_be_unsigned(bytes)
			}
			Header::Int { size_bytes } => {
				let window = self.source.peek(peeked.header_len + size_bytes as usize);
				let bytes = &window[1..1 + size_bytes as usize];
				read_be_signed(bytes)
			}
			Header::Bool(b) => b as i128,
			_ => unreachable!("non-numeric header reached read_raw_integer"),
		};
		let total_len = peeked.header_len + match peeked.header {
			Header::Uint { size_bytes } | Header::Int { size_bytes } => size_bytes as usize,
			_ => 0,
		};
		self.source.advance(total_len);
		value
	}

	/// Narrows the raw integer value to `T`, applying `overflow_number_policy`
	/// on failure. One generic body serves every integer width via
	/// `num_traits::NumCast`, rather than repeating a `TryFrom` closure per
	/// width (spec §9's macro-generated-codec-method guidance, adapted to a
	/// single generic function instead of a declarative macro since the
	/// per-width bodies are otherwise identical). Also accepts a boolean byte,
	/// read as 0/1 (spec §4.6).
	fn read_number<T: num_traits::NumCast>(&mut self) -> Result<Option<T>> {
		let accepts = |vt: ValueType| matches!(vt, ValueType::UnsignedInteger | ValueType::SignedInteger | ValueType::Boolean);
		let Some(peeked) = self.expect(accepts, "integer")? else { return Ok(None) };
		let raw = self.read_raw_integer(&peeked);
		match num_traits::cast(raw) {
			Some(v) => Ok(Some(v)),
			None => match self.options.overflow_number_policy {
				OverflowNumberPolicy::Skip => Ok(None),
				OverflowNumberPolicy::ThrowError => Err(Error::overflow(format!("value {raw} does not fit the target type"))),
			},
		}
	}

	pub fn read_bool(&mut self) -> Result<Option<bool>> {
		let Some(peeked) = self.expect(|vt| vt == ValueType::Boolean, "boolean")? else { return Ok(None) };
		let value = matches!(peeked.header, Header::Bool(true));
		self.source.advance(peeked.header_len);
		Ok(Some(value))
	}

	pub fn read_u8(&mut self) -> Result<Option<u8>> { self.read_number() }
	pub fn read_u16(&mut self) -> Result<Option<u16>> { self.read_number() }
	pub fn read_u32(&mut self) -> Result<Option<u32>> { self.read_number() }
	pub fn read_u64(&mut self) -> Result<Option<u64>> { self.read_number() }
	pub fn read_i8(&mut self) -> Result<Option<i8>> { self.read_number() }
	pub fn read_i16(&mut self) -> Result<Option<i16>> { self.read_number() }
	pub fn read_i32(&mut self) -> Result<Option<i32>> { self.read_number() }
	pub fn read_i64(&mut self) -> Result<Option<i64>> { self.read_number() }

	pub fn read_f32(&mut self) -> Result<Option<f32>> {
		let accepts = |vt: ValueType| matches!(vt, ValueType::Float | ValueType::Double);
		let Some(peeked) = self.expect(accepts, "float")? else { return Ok(None) };
		match peeked.header {
			Header::Float32 => {
				let window = self.source.peek(peeked.header_len + 4);
				let v = f32::from_be_bytes(window[1..5].try_into().unwrap());
				self.source.advance(peeked.header_len + 4);
				Ok(Some(v))
			}
			Header::Float64 => {
				let window = self.source.peek(peeked.header_len + 8);
				let v = f64::from_be_bytes(window[1..9].try_into().unwrap());
				self.source.advance(peeked.header_len + 8);
				// Only magnitude out-of-range is an overflow; precision loss
				// from narrowing a double to a float is expected and allowed
				// (spec §4.6, matching the original's `SafeNumberCast`).
				if !v.is_finite() || v.abs() <= f32::MAX as f64 {
					Ok(Some(v as f32))
				} else {
					match self.options.overflow_number_policy {
						OverflowNumberPolicy::Skip => Ok(None),
						OverflowNumberPolicy::ThrowError => Err(Error::overflow("double does not fit in a float")),
					}
				}
			}
			_ => unreachable!(),
		}
	}

	pub fn read_f64(&mut self) -> Result<Option<f64>> {
		let accepts = |vt: ValueType| matches!(vt, ValueType::Float | ValueType::Double);
		let Some(peeked) = self.expect(accepts, "double")? else { return Ok(None) };
		match peeked.header {
			Header::Float32 => {
				let window = self.source.peek(peeked.header_len + 4);
				let v = f32::from_be_bytes(window[1..5].try_into().unwrap());
				self.source.advance(peeked.header_len + 4);
				Ok(Some(v as f64))
			}
			Header::Float64 => {
				let window = self.source.peek(peeked.header_len + 8);
				let v = f64::from_be_bytes(window[1..9].try_into().unwrap());
				self.source.advance(peeked.header_len + 8);
				Ok(Some(v))
			}
			_ => unreachable!(),
		}
	}

	pub fn read_string(&mut self) -> Result<Option<String>> {
		let accepts = |vt: ValueType| vt == ValueType::String;
		let Some(peeked) = self.expect(accepts, "string")? else { return Ok(None) };
		let n = self.container_count(&peeked);
		self.source.advance(peeked.header_len);
		let bytes = self.read_payload(n)?;
		String::from_utf8(bytes)
			.map(Some)
			.map_err(|e| Error::parsing(format!("string payload is not valid UTF-8: {e}")))
	}

	/// Reads `n` payload bytes by repeatedly peeking/advancing rather than
	/// one contiguous window. A stream source's `peek` caps its returned
	/// slice at its backing chunk size, so a payload larger than one chunk
	/// (a long string, or a ts96 timestamp over a short chunk size) would
	/// otherwise slice past a short window instead of being read in full.
	fn read_payload(&mut self, n: usize) -> Result<Vec<u8>> {
		let mut bytes = Vec::with_capacity(n.min(1 << 16));
		let mut remaining = n;
		while remaining > 0 {
			let chunk = self.source.peek(remaining);
			if chunk.is_empty() {
				return Err(Error::parsing("unexpected end of MessagePack stream"));
			}
			let take = chunk.len().min(remaining);
			bytes.extend_from_slice(&chunk[..take]);
			self.source.advance(take);
			remaining -= take;
		}
		Ok(bytes)
	}

	/// Like [`read_payload`](Self::read_payload), but discards the bytes
	/// instead of collecting them — used by `skip_value` for payloads that
	/// may exceed one backing chunk.
	fn skip_payload(&mut self, n: usize) -> Result<()> {
		let mut remaining = n;
		while remaining > 0 {
			let take = self.source.peek(remaining).len().min(remaining);
			if take == 0 {
				return Err(Error::parsing("unexpected end of MessagePack stream"));
			}
			self.source.advance(take);
			remaining -= take;
		}
		Ok(())
	}

	pub fn read_array_size(&mut self) -> Result<Option<usize>> {
		let accepts = |vt: ValueType| vt == ValueType::Array;
		let Some(peeked) = self.expect(accepts, "array")? else { return Ok(None) };
		let n = self.container_count(&peeked);
		self.source.advance(peeked.header_len);
		Ok(Some(n))
	}

	pub fn read_map_size(&mut self) -> Result<Option<usize>> {
		let accepts = |vt: ValueType| vt == ValueType::Map;
		let Some(peeked) = self.expect(accepts, "map")? else { return Ok(None) };
		let n = self.container_count(&peeked);
		self.source.advance(peeked.header_len);
		Ok(Some(n))
	}

	pub fn read_binary_size(&mut self) -> Result<Option<usize>> {
		let accepts = |vt: ValueType| vt == ValueType::BinaryArray;
		let Some(peeked) = self.expect(accepts, "binary")? else { return Ok(None) };
		let n = self.container_count(&peeked);
		self.source.advance(peeked.header_len);
		Ok(Some(n))
	}

	/// Reads exactly one raw byte of a binary payload (spec §4.6); the
	/// caller loops this `read_binary_size()` times.
	pub fn read_binary(&mut self) -> Result<u8> {
		let window = self.source.peek(1);
		let Some(&b) = window.first() else {
			return Err(Error::parsing("unexpected end of binary payload"));
		};
		self.source.advance(1);
		Ok(b)
	}

	pub fn read_timestamp(&mut self) -> Result<Option<Timestamp>> {
		let accepts = |vt: ValueType| vt == ValueType::Timestamp;
		let Some(peeked) = self.expect(accepts, "timestamp")? else { return Ok(None) };
		let n = self.container_count(&peeked);
		self.source.advance(peeked.header_len);
		let payload = self.read_payload(n)?;
		let ts = Timestamp::decode_payload(&payload)?;
		Ok(Some(ts))
	}
}

fn read_be_signed(bytes: &[u8]) -> i128 {
	match bytes.len() {
		1 => bytes[0] as i8 as i128,
		2 => i16::from_be_bytes(bytes.try_into().unwrap()) as i128,
		4 => i32::from_be_bytes(bytes.try_into().unwrap()) as i128,
		8 => i64::from_be_bytes(bytes.try_into().unwrap()) as i128,
		_ => unreachable!("signed integer width is always 1, 2, 4, or 8"),
	}
}

fn read_be_unsigned(bytes: &[u8]) -> i128 {
	match bytes.len() {
		1 => bytes[0] as i128,
		2 => u16::from_be_bytes(bytes.try_into().unwrap()) as i128,
		4 => u32::from_be_bytes(bytes.try_into().unwrap()) as i128,
		8 => u64::from_be_bytes(bytes.try_into().unwrap()) as i128,
		_ => unreachable!("unsigned integer width is always 1, 2, 4, or 8"),
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::msgpack::writer::MsgPackStringWriter;

	fn options() -> SerializationOptions { SerializationOptions::default() }

	#[test]
	fn scenario_integer_promotion() {
		// spec §8 scenario 3.
		let bytes = [0xD2, 0xFF, 0xFF, 0xFF, 0xCF]; // int32 = -49
		let mut r = MsgPackReader::from_slice(&bytes, options());
		assert_eq!(r.read_i8().unwrap(), Some(-49));

		let bytes = [0xD2, 0x80, 0x00, 0x00, 0x00]; // int32 = INT32_MIN
		let mut opts = options();
		opts.overflow_number_policy = OverflowNumberPolicy::Skip;
		let mut r = MsgPackReader::from_slice(&bytes, opts);
		assert_eq!(r.read_i16().unwrap(), None);

		let mut opts = options();
		opts.overflow_number_policy = OverflowNumberPolicy::ThrowError;
		let mut r = MsgPackReader::from_slice(&bytes, opts);
		assert!(r.read_i16().is_err());
	}

	#[test]
	fn scenario_skip_nested_map() {
		// spec §8 scenario 5.
		let mut bytes = vec![0x82, 0x01, 0xC3, 0x02, 0x92, 0xC0, 0xC0];
		bytes.push(0xC3);
		let mut r = MsgPackReader::from_slice(&bytes, options());
		r.skip_value().unwrap();
		assert_eq!(r.read_bool().unwrap(), Some(true));
	}

	#[test]
	fn write_then_read_round_trips_values() {
		let mut w = MsgPackStringWriter::new();
		w.write_u64(42).unwrap();
		w.write_string("hello").unwrap();
		w.begin_array(2).unwrap();
		w.write_bool(true).unwrap();
		w.write_i32(-7).unwrap();
		let bytes = w.into_bytes();

		let mut r = MsgPackReader::from_slice(&bytes, options());
		assert_eq!(r.read_u64().unwrap(), Some(42));
		assert_eq!(r.read_string().unwrap(), Some("hello".to_string()));
		assert_eq!(r.read_array_size().unwrap(), Some(2));
		assert_eq!(r.read_bool().unwrap(), Some(true));
		assert_eq!(r.read_i32().unwrap(), Some(-7));
	}

	#[test]
	fn nil_degrades_silently_regardless_of_policy() {
		let bytes = [0xC0]; // nil
		let mut opts = options();
		opts.mismatched_types_policy = MismatchedTypesPolicy::ThrowError;
		let mut r = MsgPackReader::from_slice(&bytes, opts);
		assert_eq!(r.read_u32().unwrap(), None);
	}

	#[test]
	fn integer_reads_accept_boolean_bytes() {
		let mut r = MsgPackReader::from_slice(&[0xC3], options()); // true
		assert_eq!(r.read_u32().unwrap(), Some(1));

		let mut r = MsgPackReader::from_slice(&[0xC2], options()); // false
		assert_eq!(r.read_i8().unwrap(), Some(0));
	}

	#[test]
	fn f32_read_allows_precision_loss_but_not_overflow() {
		let mut w = MsgPackStringWriter::new();
		w.write_f64(0.1).unwrap();
		let bytes = w.into_bytes();
		let mut r = MsgPackReader::from_slice(&bytes, options());
		assert_eq!(r.read_f32().unwrap(), Some(0.1_f64 as f32));

		let mut w = MsgPackStringWriter::new();
		w.write_f64(f64::MAX).unwrap();
		let bytes = w.into_bytes();
		let mut opts = options();
		opts.overflow_number_policy = OverflowNumberPolicy::ThrowError;
		let mut r = MsgPackReader::from_slice(&bytes, opts);
		assert!(r.read_f32().is_err());
	}

	#[test]
	fn stream_reader_reads_a_string_longer_than_the_chunk_size() {
		use std::io::Cursor;

		let long = "x".repeat(500);
		let mut w = MsgPackStringWriter::new();
		w.write_string(&long).unwrap();
		let bytes = w.into_bytes();

		let mut r: MsgPackStreamReader<_, 64> = MsgPackReader::from_stream(Cursor::new(bytes), options());
		assert_eq!(r.read_string().unwrap(), Some(long));
	}

	#[test]
	fn stream_reader_skips_a_binary_value_longer_than_the_chunk_size() {
		use std::io::Cursor;

		let mut w = MsgPackStringWriter::new();
		w.write_binary(&vec![7u8; 500]).unwrap();
		w.write_bool(true).unwrap();
		let bytes = w.into_bytes();

		let mut r: MsgPackStreamReader<_, 64> = MsgPackReader::from_stream(Cursor::new(bytes), options());
		r.skip_value().unwrap();
		assert_eq!(r.read_bool().unwrap(), Some(true));
	}

	#[quickcheck_macros::quickcheck]
	fn write_then_read_i64_is_identity(value: i64) -> bool {
		let mut w = MsgPackStringWriter::new();
		w.write_i64(value).unwrap();
		let bytes = w.into_bytes();
		let mut r = MsgPackReader::from_slice(&bytes, options());
		r.read_i64().unwrap() == Some(value)
	}

	#[quickcheck_macros::quickcheck]
	fn write_then_read_string_is_identity(value: String) -> bool {
		let mut w = MsgPackStringWriter::new();
		w.write_string(&value).unwrap();
		let bytes = w.into_bytes();
		let mut r = MsgPackReader::from_slice(&bytes, options());
		r.read_string().unwrap() == Some(value)
	}
}
