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

//! The [`Codec`]: a schema compiled once into a reusable encoder and decoder.
use crate::{
    AvroResult, Error,
    compiled::CompiledSchema,
    decode::Decoder,
    encode::Encoder,
    error::Details,
    headers::{HEADER_LENGTH, HeaderBuilder, RabinFingerprintHeader},
    rabin::fingerprint64,
    schema::Schema,
    textual,
    types::Value,
    util::{DEFAULT_MAX_ALLOCATION_BYTES, DEFAULT_MAX_DEPTH},
};
use log::debug;
use std::str::FromStr;

/// An Avro schema compiled into a binary, JSON and single-object codec.
///
/// A `Codec` is immutable once built and can be shared between threads.
///
/// Encoding methods append to a caller-owned buffer and return the number of bytes written.
/// When encoding fails the buffer is truncated back to its length before the call. Decoding
/// methods return the decoded value together with the unconsumed rest of the input.
///
/// ```
/// use avro_codec::{Codec, types::Value};
///
/// let codec = Codec::new(r#"{"type": "array", "items": "int"}"#)?;
/// let mut buffer = Vec::new();
/// codec.binary_from_native(&mut buffer, &Value::Array(vec![Value::Int(1), Value::Int(2)]))?;
/// assert_eq!(buffer, [4, 2, 4, 0]);
///
/// let (value, rest) = codec.native_from_binary(&buffer)?;
/// assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
/// assert!(rest.is_empty());
/// # Ok::<(), avro_codec::Error>(())
/// ```
#[derive(Debug)]
pub struct Codec {
    schema_text: String,
    schema: Schema,
    compiled: CompiledSchema,
    canonical_schema: String,
    fingerprint: i64,
    max_allocation_bytes: usize,
    max_depth: usize,
    block_length: Option<usize>,
}

#[bon::bon]
impl Codec {
    /// Compile `schema` with a non-default configuration.
    ///
    /// ```
    /// use avro_codec::{Codec, types::Value};
    ///
    /// let codec = Codec::builder()
    ///     .schema(r#"{"type": "array", "items": "int"}"#)
    ///     .block_length(2)
    ///     .max_allocation_bytes(1024)
    ///     .build()?;
    /// let mut buffer = Vec::new();
    /// codec.binary_from_native(&mut buffer, &Value::Array(vec![Value::Int(1); 3]))?;
    /// assert_eq!(buffer, [3, 4, 2, 2, 1, 2, 2, 0]);
    /// # Ok::<(), avro_codec::Error>(())
    /// ```
    #[builder]
    pub fn builder(
        /// The schema as JSON text.
        #[builder(into)]
        schema: String,
        /// Upper bound for any single length or block count read while decoding.
        #[builder(default = DEFAULT_MAX_ALLOCATION_BYTES)]
        max_allocation_bytes: usize,
        /// How deeply records, unions, arrays and maps may nest in a value, both when
        /// encoding and when decoding.
        #[builder(default = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
        /// Write arrays and maps in blocks of at most this many items, each prefixed with its
        /// byte size. Without it every array and map is written as a single block.
        block_length: Option<usize>,
    ) -> AvroResult<Self> {
        if block_length == Some(0) {
            return Err(Details::InvalidBlockLength.into());
        }
        let parsed = Schema::parse_str(&schema)?;
        let compiled = CompiledSchema::compile(&parsed)?;
        let canonical_schema = parsed.canonical_form();
        let fingerprint = fingerprint64(canonical_schema.as_bytes());
        debug!("Compiled codec for {canonical_schema} with fingerprint {fingerprint}");
        Ok(Self {
            schema_text: schema,
            schema: parsed,
            compiled,
            canonical_schema,
            fingerprint,
            max_allocation_bytes,
            max_depth,
            block_length,
        })
    }
}

impl Codec {
    /// Compile `schema` with the default configuration.
    pub fn new(schema: &str) -> AvroResult<Self> {
        Self::builder().schema(schema).build()
    }

    /// The Parsing Canonical Form of the schema.
    pub fn canonical_schema(&self) -> &str {
        &self.canonical_schema
    }

    /// The CRC-64-AVRO fingerprint of the canonical schema.
    pub fn fingerprint(&self) -> i64 {
        self.fingerprint
    }

    /// The fingerprint as written in single-object frames.
    pub fn fingerprint_bytes(&self) -> [u8; 8] {
        self.fingerprint.to_le_bytes()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The schema text this codec was compiled from.
    pub fn schema_text(&self) -> &str {
        &self.schema_text
    }

    /// Full name of the root type when it is named, its type keyword otherwise.
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Append the binary encoding of `value` to `buffer`.
    pub fn binary_from_native(&self, buffer: &mut Vec<u8>, value: &Value) -> AvroResult<usize> {
        append(buffer, |buffer| self.encoder().encode(value, buffer))
    }

    /// Decode one binary value from the start of `buffer`.
    pub fn native_from_binary<'b>(&self, buffer: &'b [u8]) -> AvroResult<(Value, &'b [u8])> {
        Decoder::new(
            &self.compiled,
            buffer,
            self.max_allocation_bytes,
            self.max_depth,
        )
        .decode()
    }

    /// Append the JSON encoding of `value` to `buffer`.
    pub fn textual_from_native(&self, buffer: &mut Vec<u8>, value: &Value) -> AvroResult<usize> {
        append(buffer, |buffer| {
            textual::encode(&self.compiled, value, buffer, self.max_depth)
        })
    }

    /// Decode one JSON value from the start of `buffer`.
    ///
    /// Record fields missing from the JSON take their defaults.
    pub fn native_from_textual<'b>(&self, buffer: &'b [u8]) -> AvroResult<(Value, &'b [u8])> {
        textual::decode(&self.compiled, buffer, self.max_depth)
    }

    /// Append `value` to `buffer` as a single-object frame.
    pub fn frame_from_native(&self, buffer: &mut Vec<u8>, value: &Value) -> AvroResult<usize> {
        append(buffer, |buffer| {
            let header = RabinFingerprintHeader::from_fingerprint(self.fingerprint);
            buffer.extend(header.build_header());
            self.encoder().encode(value, buffer)
        })
    }

    /// Decode a single-object frame written with this codec's schema.
    ///
    /// Fails with [`ErrorKind::FingerprintMismatch`](crate::ErrorKind::FingerprintMismatch)
    /// when the frame carries another schema's fingerprint.
    pub fn native_from_frame<'b>(&self, buffer: &'b [u8]) -> AvroResult<(Value, &'b [u8])> {
        let (header, payload) = RabinFingerprintHeader::parse_from_raw_avro(buffer)?;
        if header.fingerprint() != self.fingerprint {
            return Err(Details::FingerprintMismatch {
                expected: self.fingerprint,
                found: header.fingerprint(),
            }
            .into());
        }
        self.native_from_binary(payload)
            .map_err(|e| e.shift_position(HEADER_LENGTH))
    }

    fn encoder(&self) -> Encoder<'_> {
        Encoder::new(&self.compiled, self.block_length, self.max_depth)
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codec::new(s)
    }
}

/// Run `write` against `buffer`, undoing its partial output on failure.
fn append<F>(buffer: &mut Vec<u8>, write: F) -> AvroResult<usize>
where
    F: FnOnce(&mut Vec<u8>) -> AvroResult<()>,
{
    let start = buffer.len();
    match write(buffer) {
        Ok(()) => Ok(buffer.len() - start),
        Err(e) => {
            buffer.truncate(start);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use avro_codec_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    const LONG_LIST: &str = r#"{"type": "record", "name": "LongList", "fields": [
        {"name": "value", "type": "long", "default": 0},
        {"name": "next", "type": ["null", "LongList"], "default": null}
    ]}"#;

    fn is_send_and_sync<T: Send + Sync>() {}

    #[test]
    fn codec_is_shareable() {
        is_send_and_sync::<Codec>();
    }

    #[test]
    fn accessors() -> TestResult {
        let codec: Codec = LONG_LIST.parse()?;
        assert_eq!(
            codec.canonical_schema(),
            r#"{"name":"LongList","type":"record","fields":[{"name":"value","type":"long"},{"name":"next","type":["null","LongList"]}]}"#
        );
        assert_eq!(codec.fingerprint(), 8943312752287993490);
        assert_eq!(codec.fingerprint_bytes(), [146, 206, 88, 131, 144, 7, 29, 124]);
        assert_eq!(codec.type_name(), "LongList");
        assert_eq!(codec.schema_text(), LONG_LIST);
        assert!(matches!(codec.schema(), Schema::Record(_)));
        Ok(())
    }

    #[test]
    fn failed_encode_leaves_buffer_untouched() -> TestResult {
        let codec = Codec::new(r#"{"type": "array", "items": "int"}"#)?;
        let value = Value::Array(vec![Value::Int(1), Value::from("two")]);
        let encoders: [fn(&Codec, &mut Vec<u8>, &Value) -> AvroResult<usize>; 3] = [
            Codec::binary_from_native,
            Codec::textual_from_native,
            Codec::frame_from_native,
        ];
        for encode in encoders {
            let mut buffer = vec![0xDE, 0xAD];
            let err = encode(&codec, &mut buffer, &value).expect_err("strings are not ints");
            assert_eq!(err.kind(), ErrorKind::Encode);
            assert_eq!(err.path(), "$[1]");
            assert_eq!(buffer, [0xDE, 0xAD]);
        }
        Ok(())
    }

    #[test]
    fn encode_appends_and_reports_length() -> TestResult {
        let codec = Codec::new(r#""int""#)?;
        let mut buffer = vec![0xDE, 0xAD];
        assert_eq!(codec.binary_from_native(&mut buffer, &Value::Int(3))?, 1);
        assert_eq!(codec.frame_from_native(&mut buffer, &Value::Int(3))?, 11);
        assert_eq!(
            buffer,
            [0xDE, 0xAD, 6, 0xC3, 0x01, 143, 92, 57, 63, 26, 213, 117, 114, 6]
        );
        assert_eq!(codec.textual_from_native(&mut buffer, &Value::Int(3))?, 1);
        assert_eq!(buffer.last(), Some(&b'3'));
        Ok(())
    }

    #[test]
    fn frame_from_another_schema_is_rejected() -> TestResult {
        let int = Codec::new(r#""int""#)?;
        let long = Codec::new(r#""long""#)?;
        let mut buffer = Vec::new();
        long.frame_from_native(&mut buffer, &Value::Long(3))?;

        let err = int.native_from_frame(&buffer).expect_err("written as long");
        assert_eq!(err.kind(), ErrorKind::FingerprintMismatch);
        assert!(matches!(
            err.into_details(),
            Details::FingerprintMismatch { expected, found }
                if expected == int.fingerprint() && found == long.fingerprint()
        ));
        Ok(())
    }

    #[test]
    fn frame_decode_errors_are_offset_by_the_header() -> TestResult {
        let codec = Codec::new(r#""boolean""#)?;
        let mut frame =
            RabinFingerprintHeader::from_fingerprint(codec.fingerprint()).build_header();
        frame.push(2);
        let err = codec.native_from_frame(&frame).expect_err("2 is not a boolean");
        assert_eq!(err.position(), Some(HEADER_LENGTH));
        Ok(())
    }

    #[test]
    fn zero_block_length_is_rejected() {
        let err = Codec::builder()
            .schema(r#""int""#)
            .block_length(0)
            .build()
            .expect_err("blocks must hold at least one item");
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err.into_details(), Details::InvalidBlockLength));
    }

    #[test]
    fn allocation_limit_is_configurable() -> TestResult {
        let codec = Codec::builder()
            .schema(r#""string""#)
            .max_allocation_bytes(2)
            .build()?;
        assert!(codec.native_from_binary(&[4, b'o', b'k']).is_ok());
        assert!(matches!(
            codec.native_from_binary(&[6, b'b', b'a', b'd']).map_err(Error::into_details),
            Err(Details::MemoryAllocation {
                desired: 3,
                maximum: 2
            })
        ));
        Ok(())
    }

    fn long_list(length: usize) -> Value {
        let mut value = Value::Union(0, Box::new(Value::Null));
        for i in (0..length).rev() {
            value = Value::Union(
                1,
                Box::new(Value::Record(vec![
                    ("value".to_string(), Value::Long(i as i64)),
                    ("next".to_string(), value),
                ])),
            );
        }
        match value {
            Value::Union(_, head) => *head,
            _ => unreachable!(),
        }
    }

    #[test]
    fn deep_input_is_an_error() -> TestResult {
        let codec = Codec::new(LONG_LIST)?;
        let mut buffer = vec![2; 200_000];
        buffer.push(0);
        let err = codec.native_from_binary(&buffer).expect_err("too deep");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(matches!(
            err.details(),
            Details::DecodeDepthLimit(DEFAULT_MAX_DEPTH)
        ));

        let json = r#"{"next":{"LongList":"#.repeat(100_000);
        let err = codec
            .native_from_textual(json.as_bytes())
            .expect_err("too deep");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(matches!(
            err.details(),
            Details::DecodeDepthLimit(DEFAULT_MAX_DEPTH)
        ));
        Ok(())
    }

    #[test]
    fn long_lists_round_trip_in_every_encoding() -> TestResult {
        let codec = Codec::new(LONG_LIST)?;
        let value = long_list(150);

        let mut binary = Vec::new();
        codec.binary_from_native(&mut binary, &value)?;
        assert_eq!(codec.native_from_binary(&binary)?, (value.clone(), &[][..]));

        let mut json = Vec::new();
        codec.textual_from_native(&mut json, &value)?;
        assert_eq!(codec.native_from_textual(&json)?, (value.clone(), &[][..]));

        let mut frame = Vec::new();
        codec.frame_from_native(&mut frame, &value)?;
        assert_eq!(codec.native_from_frame(&frame)?, (value, &[][..]));
        Ok(())
    }

    #[test]
    fn max_depth_is_configurable() -> TestResult {
        let codec = Codec::builder().schema(LONG_LIST).max_depth(10).build()?;
        let value = long_list(3);
        let mut buffer = Vec::new();
        codec.binary_from_native(&mut buffer, &value)?;
        assert!(codec.native_from_binary(&buffer).is_ok());

        let value = long_list(5);
        let err = codec
            .binary_from_native(&mut buffer, &value)
            .expect_err("five links need more than ten levels");
        assert!(matches!(err.details(), Details::EncodeDepthLimit(10)));
        let err = codec
            .textual_from_native(&mut buffer, &value)
            .expect_err("five links need more than ten levels");
        assert!(matches!(err.details(), Details::EncodeDepthLimit(10)));
        Ok(())
    }

    #[test]
    fn textual_default_fills_missing_fields() -> TestResult {
        let codec = Codec::new(LONG_LIST)?;
        let (value, rest) = codec.native_from_textual(br#"{"next": {"LongList": {}}}"#)?;
        assert!(rest.is_empty());
        let mut json = Vec::new();
        codec.textual_from_native(&mut json, &value)?;
        assert_eq!(
            String::from_utf8(json)?,
            r#"{"value":0,"next":{"LongList":{"value":0,"next":null}}}"#
        );
        Ok(())
    }
}
