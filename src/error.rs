// SPDX-License-Identifier: Apache-2.0

//! The crate-wide error taxonomy (spec §7). A single closed [`ErrorKind`]
//! paired with optional contextual detail and a boxed source error, in the
//! shape of a typical `orio`-style error: a small `Display`-able kind plus
//! an optional cause.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use amplify_derive::Display;

/// The closed set of error kinds produced by this crate (spec §7).
#[derive(Copy, Clone, Debug, Display)]
pub enum ErrorKind {
	/// A structural violation of the input format.
	#[display("parsing error")]
	ParsingError,
	/// An invalid UTF byte or code-unit sequence under a non-skip policy.
	#[display("UTF encoding error")]
	UtfEncodingError,
	/// A typed read landed on a different value kind under `ThrowError`.
	#[display("mismatched types")]
	MismatchedTypes,
	/// Numeric narrowing failed under `ThrowError`.
	#[display("numeric overflow")]
	Overflow,
	/// A write scope overflowed, or a read ran past the end of a row.
	#[display("out of range")]
	OutOfRange,
	/// An unsupported separator, encoding, or other configuration value.
	#[display("invalid options")]
	InvalidOptions,
	/// The upstream byte stream failed.
	#[display("input/output error")]
	InputOutputError,
}

/// A crate error: a closed [`ErrorKind`] plus optional human-readable detail
/// and a boxed source.
#[derive(Debug)]
pub struct Error {
	kind: ErrorKind,
	detail: Option<String>,
	source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.kind, self.detail_suffix())
	}
}

impl Error {
	pub fn new(kind: ErrorKind) -> Self {
		Self { kind, detail: None, source: None }
	}

	pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
		Self { kind, detail: Some(detail.into()), source: None }
	}

	pub fn with_source(
		kind: ErrorKind,
		detail: impl Into<String>,
		source: impl StdError + Send + Sync + 'static,
	) -> Self {
		Self { kind, detail: Some(detail.into()), source: Some(Box::new(source)) }
	}

	pub fn kind(&self) -> ErrorKind { self.kind }

	pub fn detail(&self) -> Option<&str> { self.detail.as_deref() }

	fn detail_suffix(&self) -> String {
		match &self.detail {
			Some(d) => format!(": {d}"),
			None => String::new(),
		}
	}

	pub fn parsing(detail: impl Into<String>) -> Self {
		Self::with_detail(ErrorKind::ParsingError, detail)
	}

	pub fn utf(detail: impl Into<String>) -> Self {
		Self::with_detail(ErrorKind::UtfEncodingError, detail)
	}

	pub fn mismatched_types(expected: &str, found: &str) -> Self {
		Self::with_detail(
			ErrorKind::MismatchedTypes,
			format!("expected {expected}, found {found}"),
		)
	}

	pub fn overflow(detail: impl Into<String>) -> Self {
		Self::with_detail(ErrorKind::Overflow, detail)
	}

	pub fn out_of_range(detail: impl Into<String>) -> Self {
		Self::with_detail(ErrorKind::OutOfRange, detail)
	}

	pub fn invalid_options(detail: impl Into<String>) -> Self {
		Self::with_detail(ErrorKind::InvalidOptions, detail)
	}

	pub fn io(source: io::Error) -> Self {
		Self::with_source(ErrorKind::InputOutputError, source.to_string(), source)
	}
}

impl StdError for Error {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
	}
}

impl From<io::Error> for Error {
	fn from(value: io::Error) -> Self { Self::io(value) }
}

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Adds a cheap contextual prefix to an error, mirroring `orio`'s
/// `ResultExt::context` without the operation-kind generic parameter (this
/// crate's `ErrorKind` already carries enough information at the call
/// site).
pub trait ResultExt<T> {
	fn context(self, detail: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
	fn context(self, detail: impl FnOnce() -> String) -> Result<T> {
		self.map_err(|mut e| {
			e.detail = Some(match e.detail.take() {
				Some(d) => format!("{}: {d}", detail()),
				None => detail(),
			});
			e
		})
	}
}
