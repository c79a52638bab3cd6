// SPDX-License-Identifier: Apache-2.0

//! Buffered UTF transcoding from `&str` to bytes in a chosen encoding
//! (spec §4.4). The identity case (UTF-8 in, UTF-8 out) passes bytes
//! through without re-encoding, since [`utf::utf8::encode`] is a copy.

use std::io::Write;
use crate::error::Result;
use crate::options::StreamOptions;
use crate::utf::{self, UtfType};

pub struct EncodedStreamWriter<W> {
	inner: W,
	options: StreamOptions,
	scratch: Vec<u8>,
}

impl<W: Write> EncodedStreamWriter<W> {
	pub fn new(mut inner: W, options: StreamOptions) -> Result<Self> {
		if options.write_bom {
			inner.write_all(options.encoding.bom())?;
		}
		Ok(Self { inner, options, scratch: Vec::new() })
	}

	pub fn encoding(&self) -> UtfType { self.options.encoding }

	/// Encodes `s` and writes it to the underlying sink.
	pub fn write_str(&mut self, s: &str) -> Result<()> {
		self.scratch.clear();
		match self.options.encoding {
			UtfType::Utf8 => { utf::utf8::encode(s, &mut self.scratch); }
			UtfType::Utf16Le => { utf::utf16::encode(s, false, &mut self.scratch); }
			UtfType::Utf16Be => { utf::utf16::encode(s, true, &mut self.scratch); }
			UtfType::Utf32Le => { utf::utf32::encode(s, false, &mut self.scratch); }
			UtfType::Utf32Be => { utf::utf32::encode(s, true, &mut self.scratch); }
		}
		self.inner.write_all(&self.scratch)?;
		Ok(())
	}

	pub fn flush(&mut self) -> Result<()> {
		self.inner.flush()?;
		Ok(())
	}

	pub fn into_inner(self) -> W { self.inner }
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn writes_bom_then_content() {
		let mut buf = Vec::new();
		{
			let mut writer = EncodedStreamWriter::new(
				&mut buf,
				StreamOptions::default().with_encoding(UtfType::Utf16Le).with_write_bom(true),
			).unwrap();
			writer.write_str("Hi").unwrap();
		}
		let mut expected = UtfType::Utf16Le.bom().to_vec();
		expected.extend_from_slice(&[b'H', 0, b'i', 0]);
		assert_eq!(buf, expected);
	}

	#[test]
	fn utf8_identity_passes_through() {
		let mut buf = Vec::new();
		{
			let mut writer = EncodedStreamWriter::new(&mut buf, StreamOptions::default()).unwrap();
			writer.write_str("héllo").unwrap();
		}
		assert_eq!(buf, "héllo".as_bytes());
	}
}
