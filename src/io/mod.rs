// SPDX-License-Identifier: Apache-2.0

//! Stream-level I/O: the binary stream reader (spec §4.5) and the encoded
//! stream reader/writer (spec §4.3/§4.4) built on top of it.

mod binary_reader;
mod encoded_reader;
mod encoded_writer;

pub use binary_reader::*;
pub use encoded_reader::*;
pub use encoded_writer::*;
