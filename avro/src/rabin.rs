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

//! Implementation of the Rabin fingerprint algorithm (CRC-64-AVRO).
use digest::{
    FixedOutput, FixedOutputReset, HashMarker, Output, Reset, Update, consts::U8,
    core_api::OutputSizeUser,
};
use std::sync::OnceLock;

const EMPTY: u64 = 0xc15d_213a_a4d7_a795;

fn fp_table() -> &'static [u64; 256] {
    static FPTABLE_ONCE: OnceLock<[u64; 256]> = OnceLock::new();
    FPTABLE_ONCE.get_or_init(|| {
        let mut fp_table = [0; 256];
        for (i, entry) in fp_table.iter_mut().enumerate() {
            let mut fp = i as u64;
            for _ in 0..8 {
                fp = (fp >> 1) ^ (EMPTY & (fp & 1).wrapping_neg());
            }
            *entry = fp;
        }
        fp_table
    })
}

/// Implementation of the Rabin fingerprint algorithm using the [`digest`](https://docs.rs/digest)
/// crate traits.
///
/// The 8 output bytes are the fingerprint in little-endian order, which is also the
/// order used in single-object frames.
///
/// ```rust
/// # use avro_codec::rabin::Rabin;
/// # use digest::Digest;
/// let mut hasher = Rabin::new();
/// hasher.update(b"\"int\"");
/// let result = hasher.finalize();
/// assert_eq!(result[..], [0x8f, 0x5c, 0x39, 0x3f, 0x1a, 0xd5, 0x75, 0x72]);
/// ```
#[derive(Clone)]
pub struct Rabin {
    result: u64,
}

impl Default for Rabin {
    fn default() -> Self {
        Rabin { result: EMPTY }
    }
}

impl Update for Rabin {
    fn update(&mut self, data: &[u8]) {
        let table = fp_table();
        for b in data {
            let index = ((self.result ^ u64::from(*b)) & 0xff) as usize;
            self.result = (self.result >> 8) ^ table[index];
        }
    }
}

impl FixedOutput for Rabin {
    fn finalize_into(self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
    }
}

impl Reset for Rabin {
    fn reset(&mut self) {
        self.result = EMPTY;
    }
}

impl OutputSizeUser for Rabin {
    type OutputSize = U8;
}

impl HashMarker for Rabin {}

impl FixedOutputReset for Rabin {
    fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
        Reset::reset(self);
    }
}

/// The CRC-64-AVRO fingerprint of `data` as a signed 64-bit integer.
pub fn fingerprint64(data: &[u8]) -> i64 {
    let mut hasher = Rabin::default();
    Update::update(&mut hasher, data);
    hasher.result as i64
}
