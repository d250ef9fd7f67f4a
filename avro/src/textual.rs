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

//! The JSON encoding of Avro data.
//!
//! Primitives map to JSON literals, `bytes` and `fixed` to strings holding one code point
//! in `U+0000..=U+00FF` per byte, and a union value to `{"<branch name>": value}`, except
//! for the `null` branch which is written as a bare `null`.

use crate::{
    AvroResult, Error,
    compiled::{CompiledSchema, Node, NodeId},
    encode::{
        enum_index, exact_f32, exact_f64, fixed_bytes, record_values, type_mismatch,
        union_branch,
    },
    error::{Details, PathSegment},
    types::Value,
    util::DEFAULT_MAX_DEPTH,
};
use serde::Serialize;
use serde_json::{Deserializer, Value as JsonValue};
use std::collections::HashMap;

/// Append the JSON encoding of `value` to `buffer`.
pub(crate) fn encode(
    schema: &CompiledSchema,
    value: &Value,
    buffer: &mut Vec<u8>,
    max_depth: usize,
) -> AvroResult<()> {
    JsonWriter { schema, max_depth }.write(schema.root(), value, buffer, 0)
}

/// Decode the first JSON value in `buffer` and return it with the rest of the buffer.
///
/// Input nested deeper than `max_depth` is rejected before it is parsed.
pub(crate) fn decode<'b>(
    schema: &CompiledSchema,
    buffer: &'b [u8],
    max_depth: usize,
) -> AvroResult<(Value, &'b [u8])> {
    if nesting_exceeds(buffer, max_depth) {
        return Err(Details::DecodeDepthLimit(max_depth).into());
    }
    let mut deserializer = Deserializer::from_slice(buffer);
    deserializer.disable_recursion_limit();
    let mut stream = deserializer.into_iter::<JsonValue>();
    let json = match stream.next() {
        Some(json) => json.map_err(Details::ParseJson)?,
        None => return Err(Details::UnexpectedEof { needed: 1 }.into()),
    };
    let value = JsonReader { schema, max_depth }.read(schema.root(), &json, 0)?;
    Ok((value, &buffer[stream.byte_offset()..]))
}

/// Convert a JSON value to a native value of the node `id`.
///
/// Used for field defaults. Record fields missing from `json` take their defaults.
pub(crate) fn value_from_json(
    schema: &CompiledSchema,
    id: NodeId,
    json: &JsonValue,
) -> AvroResult<Value> {
    JsonReader {
        schema,
        max_depth: DEFAULT_MAX_DEPTH,
    }
    .read(id, json, 0)
}

/// Whether the first JSON value in `buffer` opens more than `max_depth` arrays and objects
/// inside each other. Stops at the end of that value.
fn nesting_exceeds(buffer: &[u8], max_depth: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in buffer {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
                if depth == 0 {
                    return false;
                }
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > max_depth {
                    return true;
                }
            }
            b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return false;
                }
            }
            b' ' | b'\t' | b'\n' | b'\r' => {}
            _ if depth == 0 => return false,
            _ => {}
        }
    }
    false
}

fn write_json<T: Serialize + ?Sized>(value: &T, buffer: &mut Vec<u8>) -> AvroResult<()> {
    serde_json::to_writer(buffer, value).map_err(|e| Details::WriteJson(e).into())
}

fn write_float(x: f64, buffer: &mut Vec<u8>) -> AvroResult<()> {
    if !x.is_finite() {
        return Err(Details::ConvertF64ToJson(x).into());
    }
    write_json(&x, buffer)
}

fn write_bytes(bytes: &[u8], buffer: &mut Vec<u8>) -> AvroResult<()> {
    let s: String = bytes.iter().copied().map(char::from).collect();
    write_json(&s, buffer)
}

struct JsonWriter<'s> {
    schema: &'s CompiledSchema,
    max_depth: usize,
}

impl JsonWriter<'_> {
    fn write(
        &self,
        id: NodeId,
        value: &Value,
        buffer: &mut Vec<u8>,
        depth: usize,
    ) -> AvroResult<()> {
        if depth >= self.max_depth {
            return Err(Details::EncodeDepthLimit(self.max_depth).into());
        }
        let depth = depth + 1;
        match (self.schema.node(id), value) {
            (Node::Null, Value::Null) => buffer.extend_from_slice(b"null"),
            (Node::Boolean, Value::Boolean(b)) => write_json(b, buffer)?,
            (Node::Int, Value::Int(i)) => write_json(i, buffer)?,
            (Node::Long, Value::Long(i)) => write_json(i, buffer)?,
            (Node::Long, Value::Int(i)) => write_json(i, buffer)?,
            (Node::Float, Value::Float(x)) => {
                if !x.is_finite() {
                    return Err(Details::ConvertF64ToJson(f64::from(*x)).into());
                }
                write_json(x, buffer)?
            }
            (Node::Float, Value::Int(i)) => {
                write_float(f64::from(exact_f32(i64::from(*i))?), buffer)?
            }
            (Node::Float, Value::Long(i)) => write_float(f64::from(exact_f32(*i)?), buffer)?,
            (Node::Double, Value::Double(x)) => write_float(*x, buffer)?,
            (Node::Double, Value::Float(x)) => write_float(f64::from(*x), buffer)?,
            (Node::Double, Value::Int(i)) => write_float(f64::from(*i), buffer)?,
            (Node::Double, Value::Long(i)) => write_float(exact_f64(*i)?, buffer)?,
            (Node::Bytes, Value::Bytes(bytes)) => write_bytes(bytes, buffer)?,
            (Node::String, Value::String(s)) => write_json(s, buffer)?,
            (Node::Array(items), Value::Array(values)) => {
                buffer.push(b'[');
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    self.write(*items, value, buffer, depth)
                        .map_err(|e| e.within(PathSegment::Index(i)))?;
                }
                buffer.push(b']');
            }
            (Node::Map(values), Value::Map(entries)) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                buffer.push(b'{');
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    write_json(key, buffer)?;
                    buffer.push(b':');
                    self.write(*values, &entries[key], buffer, depth)
                        .map_err(|e| e.within(PathSegment::Key(key.clone())))?;
                }
                buffer.push(b'}');
            }
            (Node::Union(union), value) => {
                let (index, inner) = union_branch(union, value)?;
                let branch = union.branches[index];
                let within = |e: Error| e.within(PathSegment::Branch(union.names[index].clone()));
                if let Node::Null = self.schema.node(branch) {
                    self.write(branch, inner, buffer, depth).map_err(within)?;
                } else {
                    buffer.push(b'{');
                    write_json(&union.names[index], buffer)?;
                    buffer.push(b':');
                    self.write(branch, inner, buffer, depth).map_err(within)?;
                    buffer.push(b'}');
                }
            }
            (Node::Record(record), value) => {
                buffer.push(b'{');
                for (i, (field, value)) in record
                    .fields
                    .iter()
                    .zip(record_values(record, value)?)
                    .enumerate()
                {
                    if i > 0 {
                        buffer.push(b',');
                    }
                    write_json(&field.name, buffer)?;
                    buffer.push(b':');
                    self.write(field.node, value, buffer, depth)
                        .map_err(|e| e.within(PathSegment::Field(field.name.clone())))?;
                }
                buffer.push(b'}');
            }
            (Node::Enum(node), value) => {
                let index = enum_index(node, value)?;
                write_json(&node.symbols[index], buffer)?;
            }
            (Node::Fixed { size }, value) => write_bytes(fixed_bytes(*size, value)?, buffer)?,
            (node, value) => return Err(type_mismatch(node, value)),
        }
        Ok(())
    }
}

fn unexpected(expected: &'static str, json: &JsonValue) -> Error {
    Details::GetJsonValue {
        expected,
        value: json.clone(),
    }
    .into()
}

fn bytes_from_json(json: &JsonValue) -> AvroResult<Vec<u8>> {
    let JsonValue::String(s) = json else {
        return Err(unexpected("string of bytes", json));
    };
    s.chars()
        .map(|c| u8::try_from(c).map_err(|_| Error::from(Details::JsonByteOutOfRange(c))))
        .collect()
}

struct JsonReader<'s> {
    schema: &'s CompiledSchema,
    max_depth: usize,
}

impl JsonReader<'_> {
    fn read(&self, id: NodeId, json: &JsonValue, depth: usize) -> AvroResult<Value> {
        if depth >= self.max_depth {
            return Err(Details::DecodeDepthLimit(self.max_depth).into());
        }
        let depth = depth + 1;
        let value = match self.schema.node(id) {
            Node::Null => match json {
                JsonValue::Null => Value::Null,
                _ => return Err(unexpected("null", json)),
            },
            Node::Boolean => {
                Value::Boolean(json.as_bool().ok_or_else(|| unexpected("boolean", json))?)
            }
            Node::Int => Value::Int(
                json.as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(|| unexpected("int", json))?,
            ),
            Node::Long => Value::Long(json.as_i64().ok_or_else(|| unexpected("long", json))?),
            Node::Float => {
                let x = json.as_f64().ok_or_else(|| unexpected("float", json))? as f32;
                if x.is_infinite() {
                    return Err(unexpected("float", json));
                }
                Value::Float(x)
            }
            Node::Double => Value::Double(json.as_f64().ok_or_else(|| unexpected("double", json))?),
            Node::Bytes => Value::Bytes(bytes_from_json(json)?),
            Node::String => match json {
                JsonValue::String(s) => Value::String(s.clone()),
                _ => return Err(unexpected("string", json)),
            },
            Node::Array(items) => {
                let JsonValue::Array(values) = json else {
                    return Err(unexpected("array", json));
                };
                Value::Array(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, value)| {
                            self.read(*items, value, depth)
                                .map_err(|e| e.within(PathSegment::Index(i)))
                        })
                        .collect::<AvroResult<_>>()?,
                )
            }
            Node::Map(values) => {
                let JsonValue::Object(entries) = json else {
                    return Err(unexpected("map", json));
                };
                Value::Map(
                    entries
                        .iter()
                        .map(|(key, value)| {
                            self.read(*values, value, depth)
                                .map(|value| (key.clone(), value))
                                .map_err(|e| e.within(PathSegment::Key(key.clone())))
                        })
                        .collect::<AvroResult<HashMap<_, _>>>()?,
                )
            }
            Node::Union(union) => {
                let (name, inner) = match json {
                    JsonValue::Null => ("null", json),
                    JsonValue::Object(object) if object.len() == 1 => match object.iter().next() {
                        Some((name, inner)) => (name.as_str(), inner),
                        None => return Err(Details::JsonUnionObject(json.clone()).into()),
                    },
                    _ => return Err(Details::JsonUnionObject(json.clone()).into()),
                };
                let index = *union
                    .lookup
                    .get(name)
                    .ok_or_else(|| Details::UnknownUnionBranch(name.to_string()))?;
                let value = self
                    .read(union.branches[index], inner, depth)
                    .map_err(|e| e.within(PathSegment::Branch(union.names[index].clone())))?;
                Value::Union(index as u32, Box::new(value))
            }
            Node::Record(record) => {
                let JsonValue::Object(object) = json else {
                    return Err(unexpected("record", json));
                };
                if let Some(unknown) = object.keys().find(|key| !record.lookup.contains_key(*key)) {
                    return Err(Details::UnknownField(unknown.clone()).into());
                }
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let value = match (object.get(&field.name), &field.default) {
                        (Some(json), _) => self
                            .read(field.node, json, depth)
                            .map_err(|e| e.within(PathSegment::Field(field.name.clone())))?,
                        (None, Some(default)) => default.clone(),
                        (None, None) => return Err(Details::GetField(field.name.clone()).into()),
                    };
                    fields.push((field.name.clone(), value));
                }
                Value::Record(fields)
            }
            Node::Enum(node) => {
                let JsonValue::String(symbol) = json else {
                    return Err(unexpected("enum symbol", json));
                };
                let index = *node
                    .lookup
                    .get(symbol)
                    .ok_or_else(|| Details::UnknownEnumSymbol(symbol.clone()))?;
                Value::Enum(index as u32, symbol.clone())
            }
            Node::Fixed { size } => {
                let bytes = bytes_from_json(json)?;
                if bytes.len() != *size {
                    return Err(Details::JsonFixedSize {
                        expected: *size,
                        actual: bytes.len(),
                    }
                    .into());
                }
                Value::Fixed(*size, bytes)
            }
        };
        Ok(value)
    }
}
