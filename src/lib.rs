// SPDX-License-Identifier: Apache-2.0

//! A format-agnostic serialization core: a UTF transcoding engine, a
//! MessagePack codec, and an RFC 4180-style CSV codec, sharing one error
//! taxonomy and one binary stream reader.
//!
//! - [`utf`] — UTF-8/16/32 decode/encode, BOM detection.
//! - [`io`] — the buffered binary stream reader and the encoded
//!   stream reader/writer built on it.
//! - [`msgpack`] — MessagePack value classification, reader, writer.
//! - [`csv`] — the CSV reader/writer.
//! - [`options`] — shared error-handling policies and per-codec config.
//! - [`error`] — the crate-wide [`error::Error`] and [`error::Result`].

pub mod error;
pub mod options;
pub mod endian;
pub mod utf;
pub mod io;
pub mod msgpack;
pub mod csv;

pub use error::{Error, Result};
