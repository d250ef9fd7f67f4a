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

use avro_codec::{AvroResult, Codec, types::Value};
use criterion::{Criterion, criterion_group, criterion_main};
use std::{hint::black_box, time::Duration};

const RAW_SMALL_SCHEMA: &str = r#"
{
  "namespace": "test",
  "type": "record",
  "name": "Test",
  "fields": [
    {
      "type": {
        "type": "string"
      },
      "name": "field"
    }
  ]
}
"#;

const RAW_BIG_SCHEMA: &str = r#"
{
  "namespace": "my.example",
  "type": "record",
  "name": "userInfo",
  "fields": [
    {
      "default": null,
      "type": ["null", "string"],
      "name": "username"
    },
    {
      "default": -1,
      "type": "int",
      "name": "age"
    },
    {
      "default": null,
      "type": ["null", "string"],
      "name": "phone"
    },
    {
      "default": null,
      "type": ["null", "string"],
      "name": "housenum"
    },
    {
      "name": "address",
      "type": {
        "fields": [
          {"default": "NONE", "type": "string", "name": "street"},
          {"default": "NONE", "type": "string", "name": "city"},
          {"default": "NONE", "type": "string", "name": "state_prov"},
          {"default": "NONE", "type": "string", "name": "country"},
          {"default": "NONE", "type": "string", "name": "zip"}
        ],
        "type": "record",
        "name": "mailing_address"
      }
    }
  ]
}
"#;

fn make_small_record() -> AvroResult<(Codec, Value)> {
    let codec = Codec::new(RAW_SMALL_SCHEMA)?;
    let record = Value::from_iter([("field", Value::from("foo"))]);
    Ok((codec, record))
}

fn make_big_record() -> AvroResult<(Codec, Value)> {
    let codec = Codec::new(RAW_BIG_SCHEMA)?;
    let some = |s: &str| Value::Union(1, Box::new(Value::from(s)));
    let address = Value::from_iter(
        ["street", "city", "state_prov", "country", "zip"].map(|name| (name, Value::from(name))),
    );
    let record = Value::from_iter([
        ("username", some("username")),
        ("age", Value::Int(10)),
        ("phone", some("000000000")),
        ("housenum", some("0000")),
        ("address", address),
    ]);
    Ok((codec, record))
}

fn write(codec: &Codec, records: &[Value]) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    for record in records {
        codec.binary_from_native(&mut buffer, record)?;
    }
    Ok(buffer)
}

fn read(codec: &Codec, mut bytes: &[u8]) -> AvroResult<()> {
    while !bytes.is_empty() {
        let (value, rest) = codec.native_from_binary(bytes)?;
        black_box(value);
        bytes = rest;
    }
    Ok(())
}

fn bench_write(
    c: &mut Criterion,
    make_record: impl Fn() -> AvroResult<(Codec, Value)>,
    n_records: usize,
    name: &str,
) -> AvroResult<()> {
    let (codec, record) = make_record()?;
    let records = vec![record; n_records];
    c.bench_function(name, |b| b.iter(|| write(&codec, &records)));
    Ok(())
}

fn bench_read(
    c: &mut Criterion,
    make_record: impl Fn() -> AvroResult<(Codec, Value)>,
    n_records: usize,
    name: &str,
) -> AvroResult<()> {
    let (codec, record) = make_record()?;
    let bytes = write(&codec, &vec![record; n_records])?;
    c.bench_function(name, |b| b.iter(|| read(&codec, &bytes)));
    Ok(())
}

fn bench_textual(c: &mut Criterion, n_records: usize, name: &str) -> AvroResult<()> {
    let (codec, record) = make_big_record()?;
    c.bench_function(name, |b| {
        b.iter(|| {
            let mut buffer = Vec::new();
            for _ in 0..n_records {
                codec.textual_from_native(&mut buffer, &record)?;
            }
            let mut json = &buffer[..];
            while !json.is_empty() {
                let (value, rest) = codec.native_from_textual(json)?;
                black_box(value);
                json = rest;
            }
            AvroResult::Ok(())
        })
    });
    Ok(())
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("big schema, compile", |b| {
        b.iter(|| Codec::new(black_box(RAW_BIG_SCHEMA)))
    });
}

fn bench_small_schema_write_1_record(c: &mut Criterion) {
    bench_write(c, make_small_record, 1, "small schema, write 1 record").unwrap();
}

fn bench_small_schema_write_10_000_record(c: &mut Criterion) {
    bench_write(c, make_small_record, 10_000, "small schema, write 10k records").unwrap();
}

fn bench_small_schema_read_10_000_record(c: &mut Criterion) {
    bench_read(c, make_small_record, 10_000, "small schema, read 10k records").unwrap();
}

fn bench_big_schema_write_1_record(c: &mut Criterion) {
    bench_write(c, make_big_record, 1, "big schema, write 1 record").unwrap();
}

fn bench_big_schema_write_10_000_record(c: &mut Criterion) {
    bench_write(c, make_big_record, 10_000, "big schema, write 10k records").unwrap();
}

fn bench_big_schema_read_1_record(c: &mut Criterion) {
    bench_read(c, make_big_record, 1, "big schema, read 1 record").unwrap();
}

fn bench_big_schema_read_10_000_record(c: &mut Criterion) {
    bench_read(c, make_big_record, 10_000, "big schema, read 10k records").unwrap();
}

fn bench_big_schema_textual_100_record(c: &mut Criterion) {
    bench_textual(c, 100, "big schema, JSON round trip 100 records").unwrap();
}

criterion_group!(
    benches,
    bench_compile,
    bench_small_schema_write_1_record,
    bench_small_schema_write_10_000_record,
    bench_small_schema_read_10_000_record,
    bench_big_schema_write_1_record,
    bench_big_schema_write_10_000_record,
    bench_big_schema_read_1_record,
    bench_big_schema_read_10_000_record,
);

criterion_group!(
    name = long_benches;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets = bench_big_schema_textual_100_record
);

criterion_main!(benches, long_benches);
