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

use crate::{AvroResult, error::Details};
use serde_json::{Map, Value};

/// Maximum number of bytes that can be allocated when decoding
/// Avro-encoded values. This is a protection against ill-formed
/// data, whose length field might be interpreted as enormous.
/// See [`CodecBuilder::max_allocation_bytes`](crate::CodecBuilder) to change this limit.
pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 512 * 1024 * 1024;

/// Default bound on how deeply values may nest (records, unions, arrays and maps).
pub const DEFAULT_MAX_DEPTH: usize = 512;

pub(crate) trait MapHelper {
    fn string(&self, key: &str) -> Option<String>;

    fn name(&self) -> Option<String> {
        self.string("name")
    }

    fn doc(&self) -> Option<String> {
        self.string("doc")
    }
}

impl MapHelper for Map<String, Value> {
    fn string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
    }
}

/// Checks a length read from the input against the configured allocation limit.
pub(crate) fn safe_len(len: usize, max_bytes: usize) -> AvroResult<usize> {
    if len <= max_bytes {
        Ok(len)
    } else {
        Err(Details::MemoryAllocation {
            desired: len,
            maximum: max_bytes,
        }
        .into())
    }
}

pub(crate) fn zig_i32(n: i32, buffer: &mut Vec<u8>) -> usize {
    zig_i64(n as i64, buffer)
}

pub(crate) fn zig_i64(n: i64, buffer: &mut Vec<u8>) -> usize {
    encode_variable(((n << 1) ^ (n >> 63)) as u64, buffer)
}

/// Reads a zig-zag encoded long from the start of `buf`.
///
/// Returns the value and the number of bytes it occupied, or `None` when `buf`
/// ends before the last byte of the integer.
pub(crate) fn zag_i64(buf: &[u8]) -> AvroResult<Option<(i64, usize)>> {
    Ok(decode_variable(buf)?.map(|(z, consumed)| {
        let n = if z & 0x1 == 0 {
            (z >> 1) as i64
        } else {
            !(z >> 1) as i64
        };
        (n, consumed)
    }))
}

fn encode_variable(mut z: u64, buffer: &mut Vec<u8>) -> usize {
    let mut written = 0;
    loop {
        written += 1;
        if z <= 0x7F {
            buffer.push((z & 0x7F) as u8);
            break;
        } else {
            buffer.push((0x80 | (z & 0x7F)) as u8);
            z >>= 7;
        }
    }
    written
}

fn decode_variable(buf: &[u8]) -> AvroResult<Option<(u64, usize)>> {
    let mut i = 0u64;
    for (j, byte) in buf.iter().enumerate() {
        if j > 9 {
            // if j * 7 > 64
            return Err(Details::IntegerOverflow.into());
        }
        i |= (u64::from(byte & 0x7F)) << (j * 7);
        if (byte >> 7) == 0 {
            return Ok(Some((i, j + 1)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avro_codec_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    fn zig(n: i64) -> Vec<u8> {
        let mut s = Vec::new();
        zig_i64(n, &mut s);
        s
    }

    #[test]
    fn test_zigzag() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        zig_i32(42i32, &mut a);
        zig_i64(42i64, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zig_i64() {
        assert_eq!(zig(0), [0]);
        assert_eq!(zig(-1), [1]);
        assert_eq!(zig(1), [2]);
        assert_eq!(zig(3), [6]);
        assert_eq!(zig(-64), [127]);
        assert_eq!(zig(64), [128, 1]);
        assert_eq!(zig(i32::MAX as i64), [254, 255, 255, 255, 15]);
        assert_eq!(zig(i32::MAX as i64 + 1), [128, 128, 128, 128, 16]);
        assert_eq!(zig(i32::MIN as i64), [255, 255, 255, 255, 15]);
        assert_eq!(zig(i32::MIN as i64 - 1), [129, 128, 128, 128, 16]);
        assert_eq!(
            zig(i64::MAX),
            [254, 255, 255, 255, 255, 255, 255, 255, 255, 1]
        );
        assert_eq!(
            zig(i64::MIN),
            [255, 255, 255, 255, 255, 255, 255, 255, 255, 1]
        );
    }

    #[test]
    fn test_zag_i64() -> TestResult {
        for n in [0, -1, 1, -64, 64, i32::MAX as i64, i64::MIN, i64::MAX] {
            let bytes = zig(n);
            assert_eq!(zag_i64(&bytes)?, Some((n, bytes.len())));
        }
        Ok(())
    }

    #[test]
    fn test_zag_stops_at_the_last_byte() -> TestResult {
        assert_eq!(zag_i64(&[0x80, 0x01, 0xFF, 0xFF])?, Some((64, 2)));
        Ok(())
    }

    #[test]
    fn test_truncated_varint_needs_more() -> TestResult {
        assert_eq!(zag_i64(&[])?, None);
        assert_eq!(zag_i64(&[0x80, 0x80])?, None);
        Ok(())
    }

    #[test]
    fn test_overflow() {
        let causes_left_shift_overflow: &[u8] = &[0xe1; 11];
        assert!(zag_i64(causes_left_shift_overflow).is_err());
    }

    #[test]
    fn test_safe_len() -> TestResult {
        assert_eq!(42usize, safe_len(42usize, DEFAULT_MAX_ALLOCATION_BYTES)?);
        assert!(safe_len(1024 * 1024 * 1024, DEFAULT_MAX_ALLOCATION_BYTES).is_err());
        Ok(())
    }
}
