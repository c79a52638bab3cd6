// SPDX-License-Identifier: Apache-2.0

//! MessagePack value classification (spec §4.6): the discoverable
//! [`ValueType`] family, the reserved timestamp extension type, and a
//! `classify` function over the leading byte(s) of a value. Per the
//! re-architecture guidance in spec §9, this is a tagged enum dispatched
//! over at the entry points rather than a runtime byte-code table; the
//! compiler lowers the `match` to the same kind of jump table the spec's
//! reference design builds by hand.

use arrayvec::ArrayVec;
use crate::error::{Error, Result};

/// A leaf error for [`Timestamp::decode_payload`], wrapped into the
/// crate-wide [`Error`] at the call site rather than surfaced directly —
/// the same layering `orio` uses for its stream-level error enums.
#[derive(thiserror::Error, Debug)]
#[error("invalid timestamp ext payload size {0} (expected 4, 8, or 12)")]
pub struct InvalidTimestampPayload(usize);

/// The reserved ext type id that the reader resolves to [`ValueType::Timestamp`]
/// (spec §3, §6.1).
pub const TIMESTAMP_EXT_TYPE: i8 = -1;

/// The closed set of value kinds discoverable at the stream cursor without
/// consuming it (spec §3).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ValueType {
	Nil,
	Boolean,
	UnsignedInteger,
	SignedInteger,
	Float,
	Double,
	String,
	Array,
	BinaryArray,
	Map,
	Ext,
	Timestamp,
	Unknown,
}

impl ValueType {
	pub fn name(self) -> &'static str {
		match self {
			ValueType::Nil => "nil",
			ValueType::Boolean => "boolean",
			ValueType::UnsignedInteger => "unsigned integer",
			ValueType::SignedInteger => "signed integer",
			ValueType::Float => "float",
			ValueType::Double => "double",
			ValueType::String => "string",
			ValueType::Array => "array",
			ValueType::BinaryArray => "binary array",
			ValueType::Map => "map",
			ValueType::Ext => "ext",
			ValueType::Timestamp => "timestamp",
			ValueType::Unknown => "unknown",
		}
	}
}

/// A timestamp value (spec §3): `Timestamp`, the interpreted form of
/// `Ext{type_id = -1}`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Timestamp {
	pub seconds: i64,
	pub nanoseconds: i32,
}

impl Timestamp {
	pub fn new(seconds: i64, nanoseconds: i32) -> Self {
		debug_assert!((0..=999_999_999).contains(&nanoseconds));
		Self { seconds, nanoseconds }
	}

	/// Whether this fits the 4-byte `timestamp 32` payload (unsigned 32-bit
	/// seconds, zero nanoseconds).
	fn fits_ts32(self) -> bool {
		self.nanoseconds == 0 && self.seconds >= 0 && self.seconds <= u32::MAX as i64
	}

	/// Whether this fits the 8-byte `timestamp 64` payload (34-bit seconds,
	/// 30-bit nanoseconds, both unsigned).
	fn fits_ts64(self) -> bool {
		self.seconds >= 0 && self.seconds <= 0x3_FFFF_FFFF
	}

	/// Encodes into the smallest legal payload (spec §4.2 Timestamp / §4.7).
	pub fn encode_payload(self) -> Vec<u8> {
		let mut buf: ArrayVec<u8, 12> = ArrayVec::new();
		if self.fits_ts32() {
			buf.try_extend_from_slice(&(self.seconds as u32).to_be_bytes()).unwrap();
		} else if self.fits_ts64() {
			let packed = ((self.nanoseconds as u64) << 34) | (self.seconds as u64);
			buf.try_extend_from_slice(&packed.to_be_bytes()).unwrap();
		} else {
			buf.try_extend_from_slice(&self.seconds.to_be_bytes()).unwrap();
			buf.try_extend_from_slice(&(self.nanoseconds as u32).to_be_bytes()).unwrap();
		}
		buf.to_vec()
	}

	/// Decodes from a 4/8/12-byte ext payload, selected by length (spec §4.6).
	pub fn decode_payload(bytes: &[u8]) -> Result<Self> {
		match bytes.len() {
			4 => {
				let seconds = u32::from_be_bytes(bytes.try_into().unwrap());
				Ok(Self::new(seconds as i64, 0))
			}
			8 => {
				let packed = u64::from_be_bytes(bytes.try_into().unwrap());
				let nanoseconds = (packed >> 34) as i32;
				let seconds = (packed & 0x3_FFFF_FFFF) as i64;
				Ok(Self::new(seconds, nanoseconds))
			}
			12 => {
				let seconds = i64::from_be_bytes(bytes[..8].try_into().unwrap());
				let nanoseconds = u32::from_be_bytes(bytes[8..].try_into().unwrap()) as i32;
				Ok(Self::new(seconds, nanoseconds))
			}
			n => Err(Error::with_source(
				crate::error::ErrorKind::ParsingError,
				"invalid timestamp ext payload".to_string(),
				InvalidTimestampPayload(n),
			)),
		}
	}
}

/// The decoded shape of a value's leading byte(s), enough to read or skip
/// its payload (spec §4.6 byte-code table).
#[derive(Copy, Clone, Debug)]
pub enum Header {
	PosFixint(u8),
	NegFixint(i8),
	Nil,
	Bool(bool),
	Reserved,
	FixMap(usize),
	FixArray(usize),
	FixStr(usize),
	Bin { size_bytes: u8 },
	ExtFixed { len: usize },
	ExtSized { size_bytes: u8 },
	Float32,
	Float64,
	Uint { size_bytes: u8 },
	Int { size_bytes: u8 },
	Str { size_bytes: u8 },
	ArrayN { size_bytes: u8 },
	MapN { size_bytes: u8 },
}

impl Header {
	/// The un-interpreted value type for this header (before resolving the
	/// `Ext{-1}` ⇒ `Timestamp` special case, which needs the type byte).
	pub fn value_type(self) -> ValueType {
		match self {
			Header::PosFixint(_) | Header::Uint { .. } => ValueType::UnsignedInteger,
			Header::NegFixint(_) | Header::Int { .. } => ValueType::SignedInteger,
			Header::Nil => ValueType::Nil,
			Header::Bool(_) => ValueType::Boolean,
			Header::Reserved => ValueType::Unknown,
			Header::FixMap(_) | Header::MapN { .. } => ValueType::Map,
			Header::FixArray(_) | Header::ArrayN { .. } => ValueType::Array,
			Header::FixStr(_) | Header::Str { .. } => ValueType::String,
			Header::Bin { .. } => ValueType::BinaryArray,
			Header::ExtFixed { .. } | Header::ExtSized { .. } => ValueType::Ext,
			Header::Float32 => ValueType::Float,
			Header::Float64 => ValueType::Double,
		}
	}

	/// Number of size-prefix bytes following the leading byte (0, 1, 2, or 4).
	pub fn size_prefix_len(self) -> usize {
		match self {
			Header::Bin { size_bytes } |
			Header::ExtSized { size_bytes } |
			Header::Uint { size_bytes } |
			Header::Int { size_bytes } |
			Header::Str { size_bytes } |
			Header::ArrayN { size_bytes } |
			Header::MapN { size_bytes } => size_bytes as usize,
			_ => 0,
		}
	}

	/// Whether an ext type-id byte follows the size prefix.
	pub fn has_ext_type_byte(self) -> bool {
		matches!(self, Header::ExtFixed { .. } | Header::ExtSized { .. })
	}
}

/// Classifies a leading byte into a [`Header`] (spec §4.6 byte-code table).
pub fn classify(byte: u8) -> Header {
	match byte {
		0x00..=0x7F => Header::PosFixint(byte),
		0x80..=0x8F => Header::FixMap((byte & 0x0F) as usize),
		0x90..=0x9F => Header::FixArray((byte & 0x0F) as usize),
		0xA0..=0xBF => Header::FixStr((byte & 0x1F) as usize),
		0xC0 => Header::Nil,
		0xC1 => Header::Reserved,
		0xC2 => Header::Bool(false),
		0xC3 => Header::Bool(true),
		0xC4 => Header::Bin { size_bytes: 1 },
		0xC5 => Header::Bin { size_bytes: 2 },
		0xC6 => Header::Bin { size_bytes: 4 },
		0xC7 => Header::ExtSized { size_bytes: 1 },
		0xC8 => Header::ExtSized { size_bytes: 2 },
		0xC9 => Header::ExtSized { size_bytes: 4 },
		0xCA => Header::Float32,
		0xCB => Header::Float64,
		0xCC => Header::Uint { size_bytes: 1 },
		0xCD => Header::Uint { size_bytes: 2 },
		0xCE => Header::Uint { size_bytes: 4 },
		0xCF => Header::Uint { size_bytes: 8 },
		0xD0 => Header::Int { size_bytes: 1 },
		0xD1 => Header::Int { size_bytes: 2 },
		0xD2 => Header::Int { size_bytes: 4 },
		0xD3 => Header::Int { size_bytes: 8 },
		0xD4 => Header::ExtFixed { len: 1 },
		0xD5 => Header::ExtFixed { len: 2 },
		0xD6 => Header::ExtFixed { len: 4 },
		0xD7 => Header::ExtFixed { len: 8 },
		0xD8 => Header::ExtFixed { len: 16 },
		0xD9 => Header::Str { size_bytes: 1 },
		0xDA => Header::Str { size_bytes: 2 },
		0xDB => Header::Str { size_bytes: 4 },
		0xDC => Header::ArrayN { size_bytes: 2 },
		0xDD => Header::ArrayN { size_bytes: 4 },
		0xDE => Header::MapN { size_bytes: 2 },
		0xDF => Header::MapN { size_bytes: 4 },
		0xE0..=0xFF => Header::NegFixint(byte as i8),
	}
}

/// Reads a big-endian size-prefix of `size_bytes` (1, 2, or 4) from the
/// front of `bytes`.
pub fn read_size_prefix(bytes: &[u8], size_bytes: u8) -> usize {
	match size_bytes {
		1 => bytes[0] as usize,
		2 => u16::from_be_bytes([bytes[0], bytes[1]]) as usize,
		4 => u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
		_ => unreachable!("size prefix is always 1, 2, or 4 bytes"),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn timestamp_picks_smallest_representation() {
		assert_eq!(Timestamp::new(5, 0).encode_payload().len(), 4);
		assert_eq!(Timestamp::new(5, 100).encode_payload().len(), 8);
		assert_eq!(Timestamp::new(-1, 0).encode_payload().len(), 12);
	}

	#[test]
	fn timestamp_ts96_round_trip() {
		// spec §8 scenario 4.
		let ts = Timestamp::new(0x0102030405060708, 0x090A0B0C);
		let payload = ts.encode_payload();
		assert_eq!(
			payload,
			vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C]
		);
		assert_eq!(Timestamp::decode_payload(&payload).unwrap(), ts);
	}

	#[test]
	fn classifies_fixints_and_reserved_byte() {
		assert!(matches!(classify(0x05), Header::PosFixint(5)));
		assert!(matches!(classify(0xFF), Header::NegFixint(-1)));
		assert_eq!(classify(0xC1).value_type(), ValueType::Unknown);
	}
}
