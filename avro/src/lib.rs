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

//! **[Apache Avro](https://avro.apache.org/)** is a data serialization system which provides rich
//! data structures and a compact, fast, binary data format.
//!
//! This crate compiles an Avro schema once into a [`Codec`] that converts [`Value`](types::Value)s
//! to and from:
//!
//! 1. the Avro binary encoding ([`Codec::binary_from_native`], [`Codec::native_from_binary`]),
//! 2. the Avro JSON encoding ([`Codec::textual_from_native`], [`Codec::native_from_textual`]),
//! 3. single-object frames, a binary datum prefixed with the schema fingerprint
//!    ([`Codec::frame_from_native`], [`Codec::native_from_frame`]).
//!
//! The codec also exposes the schema's Parsing Canonical Form and its CRC-64-AVRO fingerprint.
//!
//! ```
//! use avro_codec::{Codec, types::Value};
//!
//! let codec = Codec::new(
//!     r#"{
//!         "type": "record",
//!         "name": "LongList",
//!         "fields": [
//!             {"name": "value", "type": "long"},
//!             {"name": "next", "type": ["null", "LongList"]}
//!         ]
//!     }"#,
//! )?;
//! assert_eq!(
//!     codec.canonical_schema(),
//!     r#"{"name":"LongList","type":"record","fields":[{"name":"value","type":"long"},{"name":"next","type":["null","LongList"]}]}"#
//! );
//!
//! let value = Value::Record(vec![
//!     ("value".to_string(), Value::Long(1)),
//!     ("next".to_string(), Value::Union(0, Box::new(Value::Null))),
//! ]);
//! let mut buffer = Vec::new();
//! codec.binary_from_native(&mut buffer, &value)?;
//! assert_eq!(buffer, [2, 0]);
//!
//! let (decoded, rest) = codec.native_from_binary(&buffer)?;
//! assert_eq!(decoded, value);
//! assert!(rest.is_empty());
//! # Ok::<(), avro_codec::Error>(())
//! ```
//!
//! # Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never installs a logger.
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.

mod codec;
mod compiled;
mod decode;
mod encode;
mod textual;

pub mod error;
pub mod headers;
pub mod rabin;
pub mod schema;
pub mod single_object;
pub mod types;
pub mod util;
mod validator;

pub use codec::{Codec, CodecBuilder};
pub use error::{Details, Error, ErrorKind};
pub use schema::Schema;

pub type AvroResult<T> = Result<T, Error>;
