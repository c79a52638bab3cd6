// SPDX-License-Identifier: Apache-2.0

//! A fixed-size chunk buffer over a byte input stream (spec §3 "Stream
//! reader state", §4.5), grounded on `orio`'s buffered-source idiom of
//! owning a cache and refilling it from an upstream [`Read`] on a miss.
//! Unlike `orio`'s pooled-segment buffer, this cache is a single flat
//! array: the spec's invariant (`buffer ≤ start ≤ end ≤ buffer + N`) maps
//! directly onto a `Vec<u8>` with two cursors, which is the natural,
//! allocation-light shape for a read-only sliding window.

use std::io::{Read, Seek, SeekFrom};
use crate::error::{Error, Result};

/// Default cache size, in bytes (spec §4.5).
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// A buffered binary reader with peek/read/seek over a fixed-size cache
/// (spec §4.5). `N` must be a multiple of 8.
pub struct BinaryStreamReader<R, const N: usize = DEFAULT_CHUNK_SIZE> {
	inner: R,
	buffer: Vec<u8>,
	start: usize,
	end: usize,
	/// Logical position of the upstream cursor, i.e. the stream position
	/// just past `buffer[..end]` (spec §3: `streamPos`).
	stream_pos: u64,
	eof: bool,
	failed: bool,
}

impl<R: Read, const N: usize> BinaryStreamReader<R, N> {
	pub fn new(inner: R) -> Self {
		debug_assert!(N % 8 == 0, "chunk size must be a multiple of 8");
		Self {
			inner,
			buffer: vec![0; N],
			start: 0,
			end: 0,
			stream_pos: 0,
			eof: false,
			failed: false,
		}
	}

	/// The logical cursor position: bytes consumed from the upstream source,
	/// minus what remains cached (spec §3: `GetPosition`).
	pub fn get_position(&self) -> u64 {
		self.stream_pos - (self.end - self.start) as u64
	}

	/// True iff the cache is empty and the upstream source is known to be at
	/// EOF. May trigger a refill to find out.
	pub fn is_end(&mut self) -> bool {
		if self.start < self.end { return false }
		if !self.eof { self.refill(); }
		self.start == self.end && self.eof
	}

	/// True iff the upstream source has signalled an I/O failure.
	pub fn is_failed(&self) -> bool { self.failed }

	fn cached(&self) -> &[u8] { &self.buffer[self.start..self.end] }

	/// Moves the unconsumed tail to the buffer head and reads more bytes in
	/// after it. Returns the number of bytes newly read.
	fn refill(&mut self) -> usize {
		if self.failed || self.eof { return 0 }

		let remaining = self.end - self.start;
		self.buffer.copy_within(self.start..self.end, 0);
		self.start = 0;
		self.end = remaining;

		// The cache is already full of unconsumed bytes (only possible when
		// a caller peeks more than `N` bytes at once): there is no room to
		// read more, and reading into an empty slice would return `Ok(0)`
		// and wrongly flag the upstream source as exhausted.
		if self.end == N { return 0 }

		match self.inner.read(&mut self.buffer[self.end..N]) {
			Ok(0) => { self.eof = true; 0 }
			Ok(read) => {
				self.end += read;
				self.stream_pos += read as u64;
				read
			}
			Err(_) => { self.failed = true; 0 }
		}
	}

	/// Returns the next byte without consuming it, refilling the cache if
	/// exhausted.
	pub fn peek_byte(&mut self) -> Option<u8> {
		if self.start == self.end {
			self.refill();
		}
		self.cached().first().copied()
	}

	/// Advances past the current byte, refilling the cache if it is now
	/// empty.
	pub fn goto_next_byte(&mut self) {
		if self.start < self.end {
			self.start += 1;
		}
		if self.start == self.end {
			self.refill();
		}
	}

	/// Reads and consumes the next byte.
	pub fn read_byte(&mut self) -> Option<u8> {
		let byte = self.peek_byte()?;
		self.goto_next_byte();
		Some(byte)
	}

	/// Returns a view of exactly `n` cached bytes (`n ≤ N`), refilling as
	/// needed. Returns an empty slice if fewer than `n` bytes are available
	/// before EOF or failure.
	pub fn read_solid_block(&mut self, n: usize) -> &[u8] {
		debug_assert!(n <= N, "solid block larger than the chunk size");

		while self.end - self.start < n && !self.eof && !self.failed {
			if self.refill() == 0 { break }
		}

		if self.end - self.start < n {
			return &[];
		}

		let block_start = self.start;
		self.start += n;
		if self.start == self.end {
			// Peek upstream so `is_end` transitions correctly.
			self.refill();
		}
		&self.buffer[block_start..block_start + n]
	}

	/// Returns a view of up to `n` cached bytes without consuming them,
	/// refilling as needed. Used by the MessagePack reader to look ahead
	/// at a value's header before deciding whether to consume it.
	pub fn peek_solid_block(&mut self, n: usize) -> &[u8] {
		while self.end - self.start < n && !self.eof && !self.failed {
			if self.refill() == 0 { break }
		}
		let available = (self.end - self.start).min(n);
		&self.buffer[self.start..self.start + available]
	}

	/// Consumes `n` previously-peeked bytes.
	pub fn advance(&mut self, n: usize) {
		all_asserts::debug_assert_le!(self.start + n, self.end);
		self.start += n;
		if self.start == self.end {
			self.refill();
		}
	}

	/// Returns a view of up to `n` bytes, triggering at most one refill.
	pub fn read_up_to(&mut self, n: usize) -> &[u8] {
		if self.start == self.end {
			self.refill();
		}
		let available = (self.end - self.start).min(n);
		let block_start = self.start;
		self.start += available;
		&self.buffer[block_start..block_start + available]
	}
}

impl<R: Read + Seek, const N: usize> BinaryStreamReader<R, N> {
	/// Sets the logical cursor position. `O(1)` if `pos` lies within the
	/// cached window; otherwise invalidates the cache and seeks upstream.
	/// Returns `false` (leaving the cursor unchanged) if the upstream seek
	/// fails.
	pub fn set_position(&mut self, pos: u64) -> bool {
		let window_start = self.get_position();
		let window_end = self.stream_pos;

		if pos >= window_start && pos <= window_end {
			self.start += (pos - window_start) as usize;
			return true;
		}

		match self.inner.seek(SeekFrom::Start(pos)) {
			Ok(actual) => {
				self.start = 0;
				self.end = 0;
				self.stream_pos = actual;
				self.eof = false;
				self.failed = false;
				true
			}
			Err(_) => {
				self.failed = true;
				false
			}
		}
	}
}

impl<R, const N: usize> BinaryStreamReader<R, N> {
	/// Converts a failed/exhausted state into an [`Error`], for callers that
	/// want to distinguish "ran out of input" from "the stream broke".
	pub fn check(&self) -> Result<()> {
		if self.failed {
			Err(Error::io(std::io::Error::new(std::io::ErrorKind::Other, "upstream stream failed")))
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn reads_bytes_sequentially() {
		let mut r: BinaryStreamReader<_, 8> = BinaryStreamReader::new(Cursor::new(b"hello world".to_vec()));
		let mut out = Vec::new();
		while let Some(b) = r.read_byte() { out.push(b) }
		assert_eq!(out, b"hello world");
		assert!(r.is_end());
	}

	#[test]
	fn position_tracks_consumption() {
		let mut r: BinaryStreamReader<_, 8> = BinaryStreamReader::new(Cursor::new(b"0123456789".to_vec()));
		for _ in 0..5 { r.read_byte(); }
		assert_eq!(r.get_position(), 5);
	}

	#[test]
	fn solid_block_spans_refills() {
		let mut r: BinaryStreamReader<_, 4> = BinaryStreamReader::new(Cursor::new(b"abcdefgh".to_vec()));
		let block = r.read_solid_block(4).to_vec();
		assert_eq!(block, b"abcd");
		let block = r.read_solid_block(4).to_vec();
		assert_eq!(block, b"efgh");
	}

	#[test]
	fn solid_block_short_returns_empty() {
		let mut r: BinaryStreamReader<_, 8> = BinaryStreamReader::new(Cursor::new(b"ab".to_vec()));
		assert_eq!(r.read_solid_block(4), &[] as &[u8]);
	}

	#[test]
	fn set_position_seeks_outside_window() {
		let mut r: BinaryStreamReader<_, 4> = BinaryStreamReader::new(Cursor::new(b"0123456789".to_vec()));
		r.read_solid_block(4);
		assert!(r.set_position(8));
		assert_eq!(r.get_position(), 8);
		assert_eq!(r.read_byte(), Some(b'8'));
	}

	#[test]
	fn set_position_within_window_is_cheap() {
		let mut r: BinaryStreamReader<_, 8> = BinaryStreamReader::new(Cursor::new(b"0123456789".to_vec()));
		r.peek_byte(); // cache [0,8)
		assert!(r.set_position(3));
		assert_eq!(r.read_byte(), Some(b'3'));
	}

	#[test]
	fn peek_solid_block_past_chunk_size_does_not_mark_eof() {
		// A peek larger than N fills the cache to capacity; refill() must
		// not treat the resulting empty read as end-of-stream.
		let mut r: BinaryStreamReader<_, 4> = BinaryStreamReader::new(Cursor::new(b"abcdefgh".to_vec()));
		let block = r.peek_solid_block(8).to_vec();
		assert_eq!(block, b"abcd");
		assert!(!r.is_end());
		r.advance(4);
		assert_eq!(r.read_solid_block(4).to_vec(), b"efgh");
	}
}
