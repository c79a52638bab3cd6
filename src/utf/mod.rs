// SPDX-License-Identifier: Apache-2.0

//! The UTF transcoding engine (spec §4.2): five codec kinds, each exposing a
//! pure `decode`/`encode` pair, BOM detection, and the shared
//! [`DecodeResult`]/[`EncodeResult`] outcome types.
//!
//! This crate collapses the source spec's "arbitrary char-type" output
//! parameter to Rust's native text type: `decode` always writes into a
//! [`String`] (Rust strings are UTF-8 by construction, so the UTF-8 codec's
//! decode is the identity validator and every other codec's decode is a
//! transcode-to-UTF-8), and `encode` always reads from a `&str`. Because a
//! `&str` can only ever hold valid Unicode scalar values, `encode` never
//! fails — the error paths the spec describes for "encoding from a
//! surrogate-bearing UTF-16/32 source" are all exercised through the
//! corresponding codec's `decode`, which is where a BOM-carrying wire buffer
//! actually enters the system. See `DESIGN.md` for the full rationale.

pub mod utf8;
pub mod utf16;
pub mod utf32;

use crate::options::UtfEncodingErrorPolicy;

/// The five UTF codec kinds (spec §4.2).
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum UtfType {
	Utf8,
	Utf16Le,
	Utf16Be,
	Utf32Le,
	Utf32Be,
}

impl UtfType {
	/// The byte-order-mark for this codec kind (spec §6.1).
	pub const fn bom(self) -> &'static [u8] {
		match self {
			UtfType::Utf8 => &[0xEF, 0xBB, 0xBF],
			UtfType::Utf16Le => &[0xFF, 0xFE],
			UtfType::Utf16Be => &[0xFE, 0xFF],
			UtfType::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
			UtfType::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
		}
	}

	/// The minimum number of bytes one code unit occupies in this encoding.
	pub const fn unit_width(self) -> usize {
		match self {
			UtfType::Utf8 => 1,
			UtfType::Utf16Le | UtfType::Utf16Be => 2,
			UtfType::Utf32Le | UtfType::Utf32Be => 4,
		}
	}
}

/// The outcome of a codec operation (spec §4.2 `Result`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorCode {
	Success,
	InvalidSequence,
	UnexpectedEnd,
}

/// The result of a [`decode`](utf8::decode)/[`encode`](utf8::encode) call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CodecResult {
	pub ok: bool,
	pub error_code: ErrorCode,
	/// The index of the first input byte NOT consumed.
	pub consumed: usize,
	pub invalid_sequences_count: usize,
}

impl CodecResult {
	fn success(consumed: usize, invalid_sequences_count: usize) -> Self {
		Self { ok: true, error_code: ErrorCode::Success, consumed, invalid_sequences_count }
	}

	fn stopped(error_code: ErrorCode, consumed: usize, invalid_sequences_count: usize) -> Self {
		Self { ok: false, error_code, consumed, invalid_sequences_count }
	}
}

/// Whether an invalid sequence should be skipped (continuing, optionally
/// emitting `mark`) or should stop the operation immediately. `Fail` is
/// treated identically to `ThrowError` at this layer — the distinction
/// between the two only matters to [`crate::io::EncodedStreamReader`], which
/// decides whether to keep pulling chunks after a stop.
pub(crate) fn should_skip(policy: UtfEncodingErrorPolicy) -> bool {
	matches!(policy, UtfEncodingErrorPolicy::Skip)
}

pub(crate) const fn is_surrogate(cp: u32) -> bool {
	cp >= 0xD800 && cp <= 0xDFFF
}

/// Tries each codec's BOM, longest/most-specific first (UTF-32 before
/// UTF-16, since the UTF-16LE BOM is a byte-prefix of the UTF-32LE BOM),
/// then falls back to a heuristic scan of up to 32 bytes, then UTF-8.
///
/// Returns the detected kind and the number of bytes the BOM (if any)
/// occupies.
pub fn detect_encoding(bytes: &[u8]) -> (UtfType, usize) {
	const ORDER: [UtfType; 5] = [
		UtfType::Utf8,
		UtfType::Utf32Le,
		UtfType::Utf32Be,
		UtfType::Utf16Le,
		UtfType::Utf16Be,
	];

	for kind in ORDER {
		if bytes.starts_with(kind.bom()) {
			return (kind, kind.bom().len());
		}
	}

	(heuristic_detect(bytes), 0)
}

/// Returns true iff `bytes` begins with `kind`'s BOM.
pub fn starts_with_bom(kind: UtfType, bytes: &[u8]) -> bool {
	bytes.starts_with(kind.bom())
}

fn heuristic_detect(bytes: &[u8]) -> UtfType {
	let scan = &bytes[..bytes.len().min(32)];

	for chunk in scan.chunks_exact(4) {
		if chunk == [0, 0, 0, 0] { continue }
		if chunk[2] == 0 && chunk[3] == 0 {
			return UtfType::Utf32Le;
		}
		if chunk[0] == 0 && chunk[1] == 0 {
			return UtfType::Utf32Be;
		}
	}

	for chunk in scan.chunks_exact(2) {
		if chunk == [0, 0] { continue }
		if chunk[1] == 0 {
			return UtfType::Utf16Le;
		}
		if chunk[0] == 0 {
			return UtfType::Utf16Be;
		}
	}

	UtfType::Utf8
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn bom_idempotence() {
		for kind in [UtfType::Utf8, UtfType::Utf16Le, UtfType::Utf16Be, UtfType::Utf32Le, UtfType::Utf32Be] {
			let (detected, offset) = detect_encoding(kind.bom());
			assert_eq!(detected, kind);
			assert_eq!(offset, kind.bom().len());
		}
	}

	#[test]
	fn detects_utf16le_heuristically() {
		// "A" in UTF-16LE, no BOM.
		let bytes = [0x41, 0x00, 0x42, 0x00];
		assert_eq!(detect_encoding(&bytes), (UtfType::Utf16Le, 0));
	}

	#[test]
	fn defaults_to_utf8() {
		assert_eq!(detect_encoding(b"hello"), (UtfType::Utf8, 0));
	}
}
