// SPDX-License-Identifier: Apache-2.0

//! The RFC 4180-style CSV codec (spec §4.8, §4.9).

pub mod row;
pub mod reader;
pub mod writer;

pub use row::Row;
pub use reader::{CsvReader, CsvStreamReader, CsvStringReader, StreamSource, StringSource, TextSource};
pub use writer::{CsvStreamWriter, CsvStringWriter, CsvWriter, StreamSink, StringSink, TextSink};
