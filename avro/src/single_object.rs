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

//! Single-object encoding: a binary datum prefixed by [`SINGLE_OBJECT_MAGIC`] and the
//! little-endian CRC-64-AVRO fingerprint of the writer schema.
//!
//! Use [`Codec::frame_from_native`](crate::Codec::frame_from_native) and
//! [`Codec::native_from_frame`](crate::Codec::native_from_frame) to write and read frames.
//! [`fingerprint_from_frame`] reads the fingerprint without a codec, e.g. to pick the schema
//! from a registry before decoding.

pub use crate::headers::{HEADER_LENGTH, SINGLE_OBJECT_MAGIC};
use crate::{AvroResult, headers::RabinFingerprintHeader};

/// Read the schema fingerprint from a single-object frame.
///
/// Returns the fingerprint and the binary payload that follows the header.
///
/// ```
/// # use avro_codec::single_object::fingerprint_from_frame;
/// let frame = [0xC3, 0x01, 143, 92, 57, 63, 26, 213, 117, 114, 6];
/// let (fingerprint, payload) = fingerprint_from_frame(&frame)?;
/// assert_eq!(fingerprint, 8247732601305521295);
/// assert_eq!(payload, [6]);
/// # Ok::<(), avro_codec::Error>(())
/// ```
pub fn fingerprint_from_frame(buffer: &[u8]) -> AvroResult<(i64, &[u8])> {
    let (header, payload) = RabinFingerprintHeader::parse_from_raw_avro(buffer)?;
    Ok((header.fingerprint(), payload))
}
