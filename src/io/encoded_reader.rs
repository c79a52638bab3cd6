// SPDX-License-Identifier: Apache-2.0

//! Buffered UTF transcoding on top of a byte stream (spec §4.3): detects
//! the encoding on construction, decodes chunk by chunk into a `String`,
//! and "squeezes" any undecoded tail (a multi-byte sequence split across a
//! chunk boundary) to the front of the working buffer before the next read.

use std::io::Read;
use crate::error::{Error, Result};
use crate::options::UtfEncodingErrorPolicy;
use crate::utf::{self, UtfType, ErrorCode};

/// Minimum working-buffer size (spec §4.3): at least 32 bytes, a multiple
/// of 4 so every codec's unit width divides it evenly.
pub const MIN_BUFFER_SIZE: usize = 32;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ReadResult {
	Success,
	EndFile,
	DecodeError,
}

pub struct EncodedStreamReader<R, const N: usize = 256> {
	inner: R,
	buffer: Vec<u8>,
	len: usize,
	encoding: UtfType,
	eof: bool,
	policy: UtfEncodingErrorPolicy,
	error_mark: Option<char>,
	invalid_sequences_count: usize,
}

impl<R: Read, const N: usize> EncodedStreamReader<R, N> {
	pub fn new(inner: R, skip_bom: bool, policy: UtfEncodingErrorPolicy) -> Result<Self> {
		debug_assert!(N >= MIN_BUFFER_SIZE && N % 4 == 0, "working buffer must be ≥32 bytes and a multiple of 4");

		let mut reader = Self {
			inner,
			buffer: vec![0; N],
			len: 0,
			encoding: UtfType::Utf8,
			eof: false,
			policy,
			error_mark: Some(crate::options::DEFAULT_ERROR_MARK),
			invalid_sequences_count: 0,
		};
		reader.fill_from_inner()?;

		let (kind, bom_len) = utf::detect_encoding(&reader.buffer[..reader.len]);
		reader.encoding = kind;
		if skip_bom && bom_len > 0 {
			reader.buffer.copy_within(bom_len..reader.len, 0);
			reader.len -= bom_len;
		}

		Ok(reader)
	}

	pub fn with_error_mark(mut self, mark: Option<char>) -> Self {
		self.error_mark = mark;
		self
	}

	/// The encoding detected (or defaulted to UTF-8) on construction.
	pub fn encoding(&self) -> UtfType { self.encoding }

	/// Total invalid sequences observed so far, surfaced even though
	/// `Skip` silently degrades them in the decoded text (spec §7).
	pub fn invalid_sequences_count(&self) -> usize { self.invalid_sequences_count }

	fn fill_from_inner(&mut self) -> Result<()> {
		if self.eof || self.len == N { return Ok(()) }
		let read = self.inner.read(&mut self.buffer[self.len..N])?;
		if read == 0 {
			self.eof = true;
		} else {
			self.len += read;
		}
		Ok(())
	}

	/// Decodes the next chunk of bytes into `out`.
	pub fn read_chunk(&mut self, out: &mut String) -> Result<ReadResult> {
		self.fill_from_inner()?;

		if self.len == 0 {
			return Ok(ReadResult::EndFile);
		}

		let result = match self.encoding {
			UtfType::Utf8 => utf::utf8::decode(&self.buffer[..self.len], out, self.policy, self.error_mark),
			UtfType::Utf16Le => utf::utf16::decode(&self.buffer[..self.len], false, out, self.policy, self.error_mark),
			UtfType::Utf16Be => utf::utf16::decode(&self.buffer[..self.len], true, out, self.policy, self.error_mark),
			UtfType::Utf32Le => utf::utf32::decode(&self.buffer[..self.len], false, out, self.policy, self.error_mark),
			UtfType::Utf32Be => utf::utf32::decode(&self.buffer[..self.len], true, out, self.policy, self.error_mark),
		};
		self.invalid_sequences_count += result.invalid_sequences_count;

		match result.error_code {
			ErrorCode::Success => {
				self.len = 0;
				Ok(ReadResult::Success)
			}
			ErrorCode::InvalidSequence => {
				// Only reachable under ThrowError/Fail; Skip is absorbed
				// inside `decode`.
				Err(Error::utf(format!("invalid sequence at byte {}", result.consumed)))
			}
			ErrorCode::UnexpectedEnd if self.eof => {
				// A genuinely truncated sequence at true end-of-file.
				match self.policy {
					UtfEncodingErrorPolicy::Skip => {
						self.invalid_sequences_count += 1;
						self.len = 0;
						Ok(ReadResult::Success)
					}
					_ => Ok(ReadResult::DecodeError),
				}
			}
			ErrorCode::UnexpectedEnd => {
				// Squeeze the undecoded tail to the buffer head and try
				// again once more bytes arrive.
				self.buffer.copy_within(result.consumed..self.len, 0);
				self.len -= result.consumed;
				self.fill_from_inner()?;
				self.read_chunk(out)
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn detects_and_decodes_utf8_bom() {
		let mut data = utf::UtfType::Utf8.bom().to_vec();
		data.extend_from_slice(b"hello");
		let mut reader: EncodedStreamReader<_, 32> =
			EncodedStreamReader::new(Cursor::new(data), true, UtfEncodingErrorPolicy::Skip).unwrap();
		assert_eq!(reader.encoding(), UtfType::Utf8);
		let mut out = String::new();
		assert_eq!(reader.read_chunk(&mut out).unwrap(), ReadResult::Success);
		assert_eq!(out, "hello");
	}

	#[test]
	fn squeezes_partial_sequence_across_chunks() {
		// A 3-byte UTF-8 char split by a 4-byte working buffer.
		let s = "ab\u{2610}cd"; // 2 + 3 + 2 = 7 bytes
		let mut reader: EncodedStreamReader<_, 4> =
			EncodedStreamReader::new(Cursor::new(s.as_bytes().to_vec()), false, UtfEncodingErrorPolicy::Skip).unwrap();
		let mut out = String::new();
		loop {
			match reader.read_chunk(&mut out).unwrap() {
				ReadResult::Success => continue,
				ReadResult::EndFile => break,
				ReadResult::DecodeError => panic!("unexpected decode error"),
			}
		}
		assert_eq!(out, s);
	}
}
