// SPDX-License-Identifier: Apache-2.0

//! UTF-32LE/BE decode/encode (spec §4.2): each 4-byte unit is one scalar
//! value, so decode is "validate and copy" and encode is "widen and copy".

use crate::options::UtfEncodingErrorPolicy;
use crate::utf::{should_skip, CodecResult, ErrorCode};

fn read_unit(bytes: &[u8], big_endian: bool) -> u32 {
	let arr = [bytes[0], bytes[1], bytes[2], bytes[3]];
	if big_endian { u32::from_be_bytes(arr) } else { u32::from_le_bytes(arr) }
}

/// Decodes UTF-32 `bytes` (in the given byte order) into `out`.
pub fn decode(
	bytes: &[u8],
	big_endian: bool,
	out: &mut String,
	policy: UtfEncodingErrorPolicy,
	mark: Option<char>,
) -> CodecResult {
	let mut i = 0;
	let mut invalid = 0;

	while i < bytes.len() {
		if bytes.len() - i < 4 {
			return CodecResult::stopped(ErrorCode::UnexpectedEnd, i, invalid);
		}

		let unit = read_unit(&bytes[i..], big_endian);
		match char::from_u32(unit) {
			Some(c) => {
				out.push(c);
				i += 4;
			}
			None => {
				if should_skip(policy) {
					if let Some(m) = mark { out.push(m); }
					invalid += 1;
					i += 4;
				} else {
					return CodecResult::stopped(ErrorCode::InvalidSequence, i, invalid);
				}
			}
		}
	}

	CodecResult::success(i, invalid)
}

/// Encodes `s` as UTF-32 bytes in the given byte order. Always succeeds.
pub fn encode(s: &str, big_endian: bool, out: &mut Vec<u8>) -> CodecResult {
	for c in s.chars() {
		let bytes = if big_endian { (c as u32).to_be_bytes() } else { (c as u32).to_le_bytes() };
		out.extend_from_slice(&bytes);
	}
	CodecResult::success(s.len(), 0)
}
