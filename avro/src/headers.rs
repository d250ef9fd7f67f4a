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

//! Handling of Avro single-object magic headers
use crate::{AvroResult, Schema, error::Details, rabin::fingerprint64};

/// The two bytes that start every single-object encoded message.
pub const SINGLE_OBJECT_MAGIC: [u8; 2] = [0xC3, 0x01];

/// Length of a single-object header: the magic followed by the 8 byte fingerprint.
pub const HEADER_LENGTH: usize = 10;

/// This trait represents that an object is able to construct an Avro message header.
pub trait HeaderBuilder {
    fn build_header(&self) -> Vec<u8>;
}

/// HeaderBuilder based on the CRC-64-AVRO (Rabin) fingerprint of the schema's canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RabinFingerprintHeader {
    fingerprint: i64,
}

impl RabinFingerprintHeader {
    /// Use this helper to build an instance from an existing Avro `Schema`.
    pub fn from_schema(schema: &Schema) -> Self {
        Self::from_fingerprint(fingerprint64(schema.canonical_form().as_bytes()))
    }

    pub fn from_fingerprint(fingerprint: i64) -> Self {
        RabinFingerprintHeader { fingerprint }
    }

    /// Parse the header at the start of a raw message, returning it with the payload that
    /// follows.
    ///
    /// Fails with [`Details::HeaderMagic`] when it does not start with
    /// [`SINGLE_OBJECT_MAGIC`] and with [`Details::ReadHeader`] when it is shorter than a
    /// header.
    pub fn parse_from_raw_avro(message: &[u8]) -> AvroResult<(Self, &[u8])> {
        if let Some(magic) = message.first_chunk::<2>()
            && *magic != SINGLE_OBJECT_MAGIC
        {
            return Err(Details::HeaderMagic(*magic).into());
        }
        let Some((header, payload)) = message.split_first_chunk::<HEADER_LENGTH>() else {
            return Err(Details::ReadHeader(message.len()).into());
        };
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&header[2..]);
        Ok((Self::from_fingerprint(i64::from_le_bytes(bytes)), payload))
    }

    /// The fingerprint carried by the header.
    pub fn fingerprint(&self) -> i64 {
        self.fingerprint
    }
}

impl HeaderBuilder for RabinFingerprintHeader {
    fn build_header(&self) -> Vec<u8> {
        let mut header = Vec::with_capacity(HEADER_LENGTH);
        header.extend_from_slice(&SINGLE_OBJECT_MAGIC);
        header.extend_from_slice(&self.fingerprint.to_le_bytes());
        header
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;
    use avro_codec_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rabin_fingerprint_header() -> TestResult {
        let schema_str = r#"
            {
            "type": "record",
            "name": "test",
            "fields": [
                {
                "name": "a",
                "type": "long",
                "default": 42
                },
                {
                "name": "b",
                "type": "string"
                }
            ]
            }
            "#;
        let schema = Schema::parse_str(schema_str)?;
        let header_builder = RabinFingerprintHeader::from_schema(&schema);
        let computed_header = header_builder.build_header();
        let expected_header: Vec<u8> = vec![195, 1, 232, 198, 194, 12, 97, 95, 44, 71];
        assert_eq!(computed_header, expected_header);
        Ok(())
    }

    #[test]
    fn test_rabin_header_parse() -> TestResult {
        let incoming_message: Vec<u8> = vec![195, 1, 143, 92, 57, 63, 26, 213, 117, 114, 6, 65];
        let (header, payload) = RabinFingerprintHeader::parse_from_raw_avro(&incoming_message)?;
        assert_eq!(header.fingerprint(), 8247732601305521295);
        assert_eq!(payload, [6, 65]);
        Ok(())
    }

    #[test]
    fn test_rabin_header_parse_err_on_message_too_short() {
        let incoming_message: Vec<u8> = vec![195, 1, 143, 92, 57];
        assert!(matches!(
            RabinFingerprintHeader::parse_from_raw_avro(&incoming_message)
                .map_err(Error::into_details),
            Err(Details::ReadHeader(5))
        ));
    }

    #[test]
    fn test_rabin_header_parse_err_on_short_message_with_wrong_magic() {
        assert!(matches!(
            RabinFingerprintHeader::parse_from_raw_avro(&[6, 6, 6]).map_err(Error::into_details),
            Err(Details::HeaderMagic([6, 6]))
        ));
        assert!(matches!(
            RabinFingerprintHeader::parse_from_raw_avro(&[195]).map_err(Error::into_details),
            Err(Details::ReadHeader(1))
        ));
    }

    #[test]
    fn test_rabin_header_parse_err_on_wrong_magic() {
        let incoming_message: Vec<u8> = vec![3, 0, 178, 241, 207, 0, 4, 52, 1, 62, 67];
        assert!(matches!(
            RabinFingerprintHeader::parse_from_raw_avro(&incoming_message)
                .map_err(Error::into_details),
            Err(Details::HeaderMagic([3, 0]))
        ));
    }
}
