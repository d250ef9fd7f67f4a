// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use avro_codec::{Codec, Details, Error, ErrorKind, single_object, types::Value};
use avro_codec_test_helper::TestResult;
use hex_literal::hex;
use pretty_assertions::assert_eq;

const LONG_LIST: &str = r#"
{
  "type": "record",
  "name": "LongList",
  "fields" : [
    {"name": "next", "type": ["null", "LongList"], "default": null}
  ]
}
"#;

#[test]
fn test_frame_of_int() -> TestResult {
    let codec = Codec::new(r#""int""#)?;
    let mut buffer = vec![0x01, 0x02, 0x03, 0x04];
    codec.frame_from_native(&mut buffer, &Value::Int(3))?;
    assert_eq!(buffer, hex!("01020304 C301 8F5C393F1AD57572 06"));
    Ok(())
}

#[test]
fn test_frame_encode_failure_keeps_buffer() -> TestResult {
    let codec = Codec::new(r#""int""#)?;
    let mut buffer = vec![0xDE, 0xAD, 0xBE, 0xEF];
    let err = codec
        .frame_from_native(&mut buffer, &Value::from("strings cannot be encoded as int"))
        .expect_err("a string is not an int");
    assert_eq!(err.kind(), ErrorKind::Encode);
    assert_eq!(buffer, [0xDE, 0xAD, 0xBE, 0xEF]);
    Ok(())
}

#[test]
fn test_frame_decode_leaves_trailing_bytes() -> TestResult {
    let codec = Codec::new(r#""int""#)?;
    let mut buffer = Vec::new();
    codec.frame_from_native(&mut buffer, &Value::Int(3))?;
    buffer.extend_from_slice(&[0xDE, 0xAD]);

    let (value, rest) = codec.native_from_frame(&buffer)?;
    assert_eq!(value, Value::Int(3));
    assert_eq!(rest, [0xDE, 0xAD]);

    let (fingerprint, payload) = single_object::fingerprint_from_frame(&buffer)?;
    assert_eq!(fingerprint, codec.fingerprint());
    assert_eq!(payload, [0x06, 0xDE, 0xAD]);
    Ok(())
}

#[test]
fn test_frame_decode_rejects_plain_binary() -> TestResult {
    let codec = Codec::new(r#""long""#)?;
    let mut buffer = Vec::new();
    codec.binary_from_native(&mut buffer, &Value::Long(3))?;
    assert!(matches!(
        codec.native_from_frame(&buffer).map_err(Error::into_details),
        Err(Details::ReadHeader(1))
    ));
    Ok(())
}

#[test]
fn test_self_referencing_record_round_trip() -> TestResult {
    let codec = Codec::new(LONG_LIST)?;

    let (value, rest) = codec.native_from_textual(br#"{"next":{"LongList":{}}}"#)?;
    assert!(rest.is_empty());

    let mut frame = Vec::new();
    codec.frame_from_native(&mut frame, &value)?;
    let (decoded, rest) = codec.native_from_frame(&frame)?;
    assert!(rest.is_empty());
    assert_eq!(decoded, value);

    let mut json = Vec::new();
    codec.textual_from_native(&mut json, &decoded)?;
    assert_eq!(String::from_utf8(json)?, r#"{"next":{"LongList":{"next":null}}}"#);
    Ok(())
}

#[test]
fn test_binary_and_textual_round_trip() -> TestResult {
    let codec = Codec::new(
        r#"{
            "type": "record",
            "name": "Reading",
            "namespace": "sensor",
            "fields": [
                {"name": "id", "type": {"type": "fixed", "name": "Id", "size": 4}},
                {"name": "kind", "type": {"type": "enum", "name": "Kind", "symbols": ["TEMP", "HUMIDITY"]}},
                {"name": "values", "type": {"type": "array", "items": "double"}},
                {"name": "labels", "type": {"type": "map", "values": "string"}},
                {"name": "raw", "type": "bytes"},
                {"name": "ok", "type": "boolean"},
                {"name": "at", "type": "long"},
                {"name": "scale", "type": "float"},
                {"name": "note", "type": ["null", "string", "Kind"]}
            ]
        }"#,
    )?;
    let value = Value::Record(vec![
        ("id".to_string(), Value::Fixed(4, vec![0, 1, 0xfe, 0xff])),
        ("kind".to_string(), Value::Enum(1, "HUMIDITY".to_string())),
        (
            "values".to_string(),
            Value::Array(vec![Value::Double(0.5), Value::Double(-2.25)]),
        ),
        (
            "labels".to_string(),
            Value::Map([("room".to_string(), Value::from("kitchen"))].into()),
        ),
        ("raw".to_string(), Value::Bytes(vec![0x00, 0x41, 0xe9])),
        ("ok".to_string(), Value::Boolean(true)),
        ("at".to_string(), Value::Long(-1_700_000_000_000)),
        ("scale".to_string(), Value::Float(1.5)),
        (
            "note".to_string(),
            Value::Union(2, Box::new(Value::Enum(0, "TEMP".to_string()))),
        ),
    ]);

    let mut binary = Vec::new();
    codec.binary_from_native(&mut binary, &value)?;
    assert_eq!(codec.native_from_binary(&binary)?, (value.clone(), &[][..]));

    let mut json = Vec::new();
    codec.textual_from_native(&mut json, &value)?;
    assert_eq!(
        std::str::from_utf8(&json)?,
        r#"{"id":"\u0000\u0001þÿ","kind":"HUMIDITY","values":[0.5,-2.25],"labels":{"room":"kitchen"},"raw":"\u0000Aé","ok":true,"at":-1700000000000,"scale":1.5,"note":{"sensor.Kind":"TEMP"}}"#
    );
    assert_eq!(codec.native_from_textual(&json)?, (value, &[][..]));
    Ok(())
}

#[test]
fn test_encode_error_reports_path() -> TestResult {
    let codec = Codec::new(
        r#"{
            "type": "record",
            "name": "Hand",
            "fields": [
                {"name": "cards", "type": {"type": "array", "items": {
                    "type": "record",
                    "name": "Card",
                    "fields": [
                        {"name": "suit", "type": {"type": "enum", "name": "Suit", "symbols": ["HEARTS", "SPADES"]}}
                    ]
                }}}
            ]
        }"#,
    )?;
    let card = |suit: &str| Value::Record(vec![("suit".to_string(), Value::from(suit))]);
    let value = Value::Record(vec![(
        "cards".to_string(),
        Value::Array(vec![card("HEARTS"), card("CLUBS")]),
    )]);

    let mut buffer = Vec::new();
    let err = codec
        .binary_from_native(&mut buffer, &value)
        .expect_err("CLUBS is not a suit");
    assert_eq!(err.path(), "$.cards[1].suit");
    assert!(buffer.is_empty());
    Ok(())
}

#[test]
fn test_invalid_schemas_are_schema_errors() {
    for schema in [
        r#""nope""#,
        r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "Undefined"}]}"#,
        r#"["null", ["int"]]"#,
        r#"["int", "int"]"#,
        r#"{"type": "fixed", "name": "F"}"#,
        r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int", "default": "x"}]}"#,
        r#"[{"type": "fixed", "name": "F", "size": 1}, {"type": "fixed", "name": "F", "size": 2}]"#,
        "{",
    ] {
        let err = Codec::new(schema).expect_err(schema);
        assert_eq!(err.kind(), ErrorKind::Schema, "{schema}: {err}");
    }
}
