// SPDX-License-Identifier: Apache-2.0

//! The MessagePack codec (spec §4.6, §4.7): [`value`] classifies the wire
//! format, [`reader`] and [`writer`] read and write values against it.

pub mod value;
pub mod reader;
pub mod writer;

pub use value::{Header, Timestamp, ValueType, TIMESTAMP_EXT_TYPE};
pub use reader::{ByteSource, MsgPackReader, MsgPackStreamReader, MsgPackStringReader, SliceSource};
pub use writer::{ByteSink, MsgPackStreamWriter, MsgPackStringWriter, MsgPackWriter};
