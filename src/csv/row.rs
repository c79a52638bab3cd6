// SPDX-License-Identifier: Apache-2.0

//! A parsed CSV row (spec §3 "CSV row"): an ordered sequence of field
//! values. The reference design stores each field as an `(offset, size,
//! inOriginalData)` view into either the source buffer or a decode buffer;
//! this crate collapses that to owned [`String`]s, the same zero-copy
//! trade-off already made for the MessagePack reader's string values (see
//! `DESIGN.md`).

/// One parsed CSV row: either a data row or the header row.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Row {
	pub(crate) fields: Vec<String>,
}

impl Row {
	pub fn len(&self) -> usize { self.fields.len() }

	pub fn is_empty(&self) -> bool { self.fields.is_empty() }

	pub fn field(&self, index: usize) -> Option<&str> {
		self.fields.get(index).map(String::as_str)
	}

	pub fn fields(&self) -> &[String] { &self.fields }

	pub fn position_of(&self, key: &str) -> Option<usize> {
		self.fields.iter().position(|f| f == key)
	}
}

impl From<Vec<String>> for Row {
	fn from(fields: Vec<String>) -> Self { Self { fields } }
}
