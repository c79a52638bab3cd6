// SPDX-License-Identifier: Apache-2.0

//! UTF-8 decode/encode (spec §4.2). `encode` is the identity operation since
//! a Rust `&str` is already valid UTF-8; `decode` is a permissive validator
//! that degrades invalid sequences per [`UtfEncodingErrorPolicy`].

use crate::options::UtfEncodingErrorPolicy;
use crate::utf::{is_surrogate, should_skip, CodecResult, ErrorCode};

/// Classifies a UTF-8 start byte, returning the expected total sequence
/// length. Continuation bytes and the reserved 5/6-byte lead bytes return
/// their own (always-invalid) lengths so the caller can still compute how
/// many bytes to skip.
fn start_len(byte: u8) -> usize {
	match byte {
		0x00..=0x7F => 1,
		0xC0..=0xDF => 2,
		0xE0..=0xEF => 3,
		0xF0..=0xF7 => 4,
		0xF8..=0xFB => 5,
		0xFC..=0xFD => 6,
		_ => 1, // stray continuation byte or 0xFE/0xFF
	}
}

fn is_continuation(byte: u8) -> bool { byte & 0xC0 == 0x80 }

/// Decodes UTF-8 `bytes` into `out`, appending `mark` (if any) in place of
/// each invalid sequence under [`UtfEncodingErrorPolicy::Skip`].
pub fn decode(
	bytes: &[u8],
	out: &mut String,
	policy: UtfEncodingErrorPolicy,
	mark: Option<char>,
) -> CodecResult {
	// Fast path: most input is well-formed. simdutf8 validates the whole
	// chunk in one pass; only malformed input falls through to the
	// byte-at-a-time recovery loop below, which needs to locate exactly
	// where validation failed.
	if let Ok(s) = simdutf8::basic::from_utf8(bytes) {
		out.push_str(s);
		return CodecResult::success(bytes.len(), 0);
	}

	let mut i = 0;
	let mut invalid = 0;

	while i < bytes.len() {
		let b = bytes[i];
		let len = start_len(b);
		let always_invalid = matches!(b, 0xF8..=0xFD) || is_continuation(b) || matches!(b, 0xFE | 0xFF);

		if i + len > bytes.len() {
			// Not enough bytes left for the expected sequence.
			if always_invalid {
				// A malformed lead byte with a truncated tail is still an
				// invalid sequence, not an unexpected end: it could never
				// have completed validly.
			} else {
				return CodecResult::stopped(ErrorCode::UnexpectedEnd, i, invalid);
			}
		}

		if always_invalid {
			let consume = len.min(bytes.len() - i);
			if should_skip(policy) {
				if let Some(m) = mark { out.push(m); }
				invalid += 1;
				i += consume.max(1);
				continue;
			} else {
				return CodecResult::stopped(ErrorCode::InvalidSequence, i, invalid);
			}
		}

		if len == 1 {
			out.push(b as char);
			i += 1;
			continue;
		}

		// Multi-byte sequence: validate continuation bytes.
		let mut malformed = false;
		for k in 1..len {
			if !is_continuation(bytes[i + k]) {
				malformed = true;
				break;
			}
		}

		if malformed {
			let consume = len.min(bytes.len() - i);
			if should_skip(policy) {
				if let Some(m) = mark { out.push(m); }
				invalid += 1;
				i += consume;
				continue;
			} else {
				return CodecResult::stopped(ErrorCode::InvalidSequence, i, invalid);
			}
		}

		let cp = decode_scalar(&bytes[i..i + len], len);
		if is_surrogate(cp) || char::from_u32(cp).is_none() || overlong(cp, len) {
			if should_skip(policy) {
				if let Some(m) = mark { out.push(m); }
				invalid += 1;
				i += len;
				continue;
			} else {
				return CodecResult::stopped(ErrorCode::InvalidSequence, i, invalid);
			}
		}

		out.push(char::from_u32(cp).unwrap());
		i += len;
	}

	CodecResult::success(i, invalid)
}

fn decode_scalar(bytes: &[u8], len: usize) -> u32 {
	let mut cp = match len {
		2 => (bytes[0] & 0x1F) as u32,
		3 => (bytes[0] & 0x0F) as u32,
		4 => (bytes[0] & 0x07) as u32,
		_ => unreachable!(),
	};
	for &b in &bytes[1..len] {
		cp = (cp << 6) | (b & 0x3F) as u32;
	}
	cp
}

fn overlong(cp: u32, len: usize) -> bool {
	match len {
		2 => cp < 0x80,
		3 => cp < 0x800,
		4 => cp < 0x10000 || cp > 0x10FFFF,
		_ => false,
	}
}

/// Encodes `s` as UTF-8 bytes. Always succeeds: a Rust `&str` is already
/// valid UTF-8.
pub fn encode(s: &str, out: &mut Vec<u8>) -> CodecResult {
	out.extend_from_slice(s.as_bytes());
	CodecResult::success(s.len(), 0)
}
