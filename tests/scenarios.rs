// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios and cross-module invariants (spec §8), exercised
//! through the crate's public API rather than internal codec functions.

use bitcodec::csv::{CsvReader, CsvWriter, StreamSource};
use bitcodec::msgpack::{MsgPackReader, MsgPackWriter};
use bitcodec::options::{CsvOptions, MismatchedTypesPolicy, OverflowNumberPolicy, SerializationOptions, UtfEncodingErrorPolicy};
use bitcodec::utf::{self, UtfType};
use pretty_assertions::assert_eq;

#[test]
fn utf_round_trip_across_all_codec_pairs() {
	let s = "plain ascii, héllo, \u{1F600}, \u{2610}";
	for kind in [UtfType::Utf8, UtfType::Utf16Le, UtfType::Utf16Be, UtfType::Utf32Le, UtfType::Utf32Be] {
		let mut bytes = Vec::new();
		let encode_result = match kind {
			UtfType::Utf8 => utf::utf8::encode(s, &mut bytes),
			UtfType::Utf16Le => utf::utf16::encode(s, false, &mut bytes),
			UtfType::Utf16Be => utf::utf16::encode(s, true, &mut bytes),
			UtfType::Utf32Le => utf::utf32::encode(s, false, &mut bytes),
			UtfType::Utf32Be => utf::utf32::encode(s, true, &mut bytes),
		};
		assert!(encode_result.ok);

		let mut out = String::new();
		let decode_result = match kind {
			UtfType::Utf8 => utf::utf8::decode(&bytes, &mut out, Default::default(), None),
			UtfType::Utf16Le => utf::utf16::decode(&bytes, false, &mut out, Default::default(), None),
			UtfType::Utf16Be => utf::utf16::decode(&bytes, true, &mut out, Default::default(), None),
			UtfType::Utf32Le => utf::utf32::decode(&bytes, false, &mut out, Default::default(), None),
			UtfType::Utf32Be => utf::utf32::decode(&bytes, true, &mut out, Default::default(), None),
		};
		assert!(decode_result.ok, "{kind:?} round-trip failed to decode");
		assert_eq!(out, s, "{kind:?} round-trip changed the text");
	}
}

#[test]
fn msgpack_write_then_read_round_trips_a_mixed_document() {
	let mut w = MsgPackWriter::new();
	w.begin_map(3).unwrap();
	w.write_string("name").unwrap();
	w.write_string("Ada").unwrap();
	w.write_string("age").unwrap();
	w.write_u32(36).unwrap();
	w.write_string("tags").unwrap();
	w.begin_array(2).unwrap();
	w.write_string("math").unwrap();
	w.write_string("computing").unwrap();
	w.end_container().unwrap();
	w.end_container().unwrap();
	let bytes = w.into_bytes();

	let mut r = MsgPackReader::from_slice(&bytes, SerializationOptions::default());
	assert_eq!(r.read_map_size().unwrap(), Some(3));
	assert_eq!(r.read_string().unwrap(), Some("name".to_string()));
	assert_eq!(r.read_string().unwrap(), Some("Ada".to_string()));
	assert_eq!(r.read_string().unwrap(), Some("age".to_string()));
	assert_eq!(r.read_u32().unwrap(), Some(36));
	assert_eq!(r.read_string().unwrap(), Some("tags".to_string()));
	assert_eq!(r.read_array_size().unwrap(), Some(2));
	assert_eq!(r.read_string().unwrap(), Some("math".to_string()));
	assert_eq!(r.read_string().unwrap(), Some("computing".to_string()));
	assert!(r.is_end());
}

#[test]
fn msgpack_skip_equals_reading_past_a_value() {
	let mut w = MsgPackWriter::new();
	w.begin_array(2).unwrap();
	w.write_u32(1).unwrap();
	w.write_u32(2).unwrap();
	w.end_container().unwrap();
	w.write_bool(true).unwrap();
	let bytes = w.into_bytes();

	let mut skipper = MsgPackReader::from_slice(&bytes, SerializationOptions::default());
	skipper.skip_value().unwrap();
	assert_eq!(skipper.read_bool().unwrap(), Some(true));

	let mut reader = MsgPackReader::from_slice(&bytes, SerializationOptions::default());
	assert_eq!(reader.read_array_size().unwrap(), Some(2));
	assert_eq!(reader.read_u32().unwrap(), Some(1));
	assert_eq!(reader.read_u32().unwrap(), Some(2));
	assert_eq!(reader.read_bool().unwrap(), Some(true));
}

#[test]
fn msgpack_mismatched_types_policy_controls_degrade_vs_throw() {
	let mut w = MsgPackWriter::new();
	w.write_string("not a number").unwrap();
	let bytes = w.into_bytes();

	let skip_options = SerializationOptions::default().with_mismatched_types_policy(MismatchedTypesPolicy::Skip);
	let mut r = MsgPackReader::from_slice(&bytes, skip_options);
	assert_eq!(r.read_u32().unwrap(), None);
	assert!(r.is_end());

	let throw_options = SerializationOptions::default().with_mismatched_types_policy(MismatchedTypesPolicy::ThrowError);
	let mut r = MsgPackReader::from_slice(&bytes, throw_options);
	assert!(r.read_u32().is_err());
}

#[test]
fn msgpack_overflow_policy_controls_degrade_vs_throw() {
	let mut w = MsgPackWriter::new();
	w.write_u64(1000).unwrap();
	let bytes = w.into_bytes();

	let skip_options = SerializationOptions::default().with_overflow_number_policy(OverflowNumberPolicy::Skip);
	let mut r = MsgPackReader::from_slice(&bytes, skip_options);
	assert_eq!(r.read_u8().unwrap(), None);

	let throw_options = SerializationOptions::default().with_overflow_number_policy(OverflowNumberPolicy::ThrowError);
	let mut r = MsgPackReader::from_slice(&bytes, throw_options);
	assert!(r.read_u8().is_err());
}

#[test]
fn csv_round_trip_preserves_fields_with_quoting() {
	let mut w = CsvWriter::new(CsvOptions::default());
	w.write_header_field("name").unwrap();
	w.write_header_field("note").unwrap();
	w.write_field("Ada").unwrap();
	w.write_field("likes, commas").unwrap();
	w.next_line().unwrap();
	w.write_field("Grace").unwrap();
	w.write_field("plain").unwrap();
	w.next_line().unwrap();
	let csv_text = w.into_string();

	let mut r = CsvReader::from_str(&csv_text, CsvOptions::default()).unwrap();
	assert_eq!(r.headers().unwrap().fields(), &["name", "note"]);
	assert!(r.parse_next_row().unwrap());
	assert_eq!(r.read_value().unwrap(), "Ada");
	assert_eq!(r.read_value().unwrap(), "likes, commas");
	assert!(r.parse_next_row().unwrap());
	assert_eq!(r.read_value().unwrap(), "Grace");
	assert_eq!(r.read_value().unwrap(), "plain");
	assert!(!r.parse_next_row().unwrap());
}

#[test]
fn csv_column_count_law_holds_across_rows() {
	let text = "a,b,c\n1,2,3\n4,5,6\n7,8,9\n";
	let mut r = CsvReader::from_str(text, CsvOptions::default()).unwrap();
	let mut rows = 0;
	while r.parse_next_row().unwrap() {
		assert_eq!(r.current_row().unwrap().len(), 3);
		rows += 1;
	}
	assert_eq!(rows, 3);
}

#[test]
fn csv_round_trips_through_a_real_file() {
	use bitcodec::options::StreamOptions;
	use std::fs::File;

	let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();

	let file = File::create(&path).unwrap();
	let mut w = CsvWriter::from_stream(file, CsvOptions::default(), StreamOptions::default()).unwrap();
	w.write_header_field("name").unwrap();
	w.write_header_field("note").unwrap();
	w.write_field("Ada").unwrap();
	w.write_field("likes, commas").unwrap();
	w.next_line().unwrap();
	w.write_field("Grace").unwrap();
	w.write_field("plain").unwrap();
	w.next_line().unwrap();
	drop(w);

	let file = File::open(&path).unwrap();
	let mut r: CsvReader<StreamSource<File, 256>> = CsvReader::from_stream(file, CsvOptions::default(), UtfEncodingErrorPolicy::ThrowError).unwrap();
	assert_eq!(r.headers().unwrap().fields(), &["name", "note"]);
	assert!(r.parse_next_row().unwrap());
	assert_eq!(r.read_value().unwrap(), "Ada");
	assert_eq!(r.read_value().unwrap(), "likes, commas");
	assert!(r.parse_next_row().unwrap());
	assert_eq!(r.read_value().unwrap(), "Grace");
	assert_eq!(r.read_value().unwrap(), "plain");
	assert!(!r.parse_next_row().unwrap());
}
