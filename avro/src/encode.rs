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

use crate::{
    AvroResult, Error,
    compiled::{CompiledSchema, EnumNode, Node, NodeId, RecordNode, UnionNode},
    error::{Details, PathSegment},
    schema::SchemaKind,
    types::Value,
    util::{zig_i32, zig_i64},
};
use log::error;

/// Binary encoder for one compiled schema.
pub(crate) struct Encoder<'s> {
    schema: &'s CompiledSchema,
    /// Maximum number of items per array or map block. `None` writes a single block.
    block_length: Option<usize>,
    max_depth: usize,
}

impl<'s> Encoder<'s> {
    pub(crate) fn new(
        schema: &'s CompiledSchema,
        block_length: Option<usize>,
        max_depth: usize,
    ) -> Self {
        Self {
            schema,
            block_length,
            max_depth,
        }
    }

    /// Append the binary encoding of `value` to `buffer`.
    ///
    /// On error `buffer` may hold a partial encoding; the caller truncates it.
    pub(crate) fn encode(&self, value: &Value, buffer: &mut Vec<u8>) -> AvroResult<()> {
        self.encode_internal(self.schema.root(), value, buffer, 0)
    }

    fn encode_internal(
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
            (Node::Null, Value::Null) => {}
            (Node::Boolean, Value::Boolean(b)) => buffer.push(u8::from(*b)),
            (Node::Int, Value::Int(i)) => {
                zig_i32(*i, buffer);
            }
            (Node::Long, Value::Long(i)) => {
                zig_i64(*i, buffer);
            }
            (Node::Long, Value::Int(i)) => {
                zig_i64(i64::from(*i), buffer);
            }
            (Node::Float, Value::Float(x)) => buffer.extend_from_slice(&x.to_le_bytes()),
            (Node::Float, Value::Int(i)) => {
                buffer.extend_from_slice(&exact_f32(i64::from(*i))?.to_le_bytes())
            }
            (Node::Float, Value::Long(i)) => {
                buffer.extend_from_slice(&exact_f32(*i)?.to_le_bytes())
            }
            (Node::Double, Value::Double(x)) => buffer.extend_from_slice(&x.to_le_bytes()),
            (Node::Double, Value::Float(x)) => {
                buffer.extend_from_slice(&f64::from(*x).to_le_bytes())
            }
            (Node::Double, Value::Int(i)) => {
                buffer.extend_from_slice(&f64::from(*i).to_le_bytes())
            }
            (Node::Double, Value::Long(i)) => {
                buffer.extend_from_slice(&exact_f64(*i)?.to_le_bytes())
            }
            (Node::Bytes, Value::Bytes(bytes)) => encode_bytes(bytes, buffer),
            (Node::String, Value::String(s)) => encode_bytes(s, buffer),
            (Node::Array(items), Value::Array(values)) => {
                self.encode_blocks(values.iter(), values.len(), buffer, |item, buffer| {
                    let (i, value) = item;
                    self.encode_internal(*items, value, buffer, depth)
                        .map_err(|e| e.within(PathSegment::Index(i)))
                })?;
            }
            (Node::Map(values), Value::Map(entries)) => {
                self.encode_blocks(entries.iter(), entries.len(), buffer, |entry, buffer| {
                    let (_, (key, value)) = entry;
                    encode_bytes(key, buffer);
                    self.encode_internal(*values, value, buffer, depth)
                        .map_err(|e| e.within(PathSegment::Key(key.clone())))
                })?;
            }
            (Node::Union(union), value) => {
                let (index, inner) = union_branch(union, value)?;
                zig_i64(index as i64, buffer);
                self.encode_internal(union.branches[index], inner, buffer, depth)
                    .map_err(|e| e.within(PathSegment::Branch(union.names[index].clone())))?;
            }
            (Node::Record(record), value) => {
                for (field, value) in record.fields.iter().zip(record_values(record, value)?) {
                    self.encode_internal(field.node, value, buffer, depth)
                        .map_err(|e| e.within(PathSegment::Field(field.name.clone())))?;
                }
            }
            (Node::Enum(symbols), value) => {
                zig_i32(enum_index(symbols, value)? as i32, buffer);
            }
            (Node::Fixed { size, .. }, value) => {
                buffer.extend_from_slice(fixed_bytes(*size, value)?);
            }
            (node, value) => return Err(type_mismatch(node, value)),
        }
        Ok(())
    }

    /// Writes `len` items as array/map blocks followed by the terminating empty block.
    ///
    /// With a configured block length every block carries its byte size, written as a
    /// negative item count followed by the size.
    fn encode_blocks<I, T, F>(
        &self,
        items: I,
        len: usize,
        buffer: &mut Vec<u8>,
        mut encode_item: F,
    ) -> AvroResult<()>
    where
        I: Iterator<Item = T>,
        F: FnMut((usize, T), &mut Vec<u8>) -> AvroResult<()>,
    {
        let mut items = items.enumerate().peekable();
        match self.block_length {
            None => {
                if len > 0 {
                    zig_i64(len as i64, buffer);
                    for item in items {
                        encode_item(item, buffer)?;
                    }
                }
            }
            Some(block_length) => {
                let mut block = Vec::new();
                while items.peek().is_some() {
                    block.clear();
                    let mut count = 0i64;
                    for item in items.by_ref().take(block_length) {
                        encode_item(item, &mut block)?;
                        count += 1;
                    }
                    zig_i64(-count, buffer);
                    zig_i64(block.len() as i64, buffer);
                    buffer.extend_from_slice(&block);
                }
            }
        }
        buffer.push(0u8);
        Ok(())
    }
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized>(s: &B, buffer: &mut Vec<u8>) {
    let bytes = s.as_ref();
    zig_i64(bytes.len() as i64, buffer);
    buffer.extend_from_slice(bytes);
}

/// Converts an integer to `f32`, failing unless the conversion is exact.
pub(crate) fn exact_f32(i: i64) -> AvroResult<f32> {
    let x = i as f32;
    if x as i128 == i128::from(i) {
        Ok(x)
    } else {
        Err(Details::InexactFloat {
            value: i,
            expected: SchemaKind::Float,
        }
        .into())
    }
}

/// Converts an integer to `f64`, failing unless the conversion is exact.
pub(crate) fn exact_f64(i: i64) -> AvroResult<f64> {
    let x = i as f64;
    if x as i128 == i128::from(i) {
        Ok(x)
    } else {
        Err(Details::InexactFloat {
            value: i,
            expected: SchemaKind::Double,
        }
        .into())
    }
}

pub(crate) fn type_mismatch(node: &Node, value: &Value) -> Error {
    Details::EncodeValueAsSchemaError {
        value_kind: value.kind(),
        expected: node.kind(),
    }
    .into()
}

/// The branch selected by a union value and the value to encode with it.
pub(crate) fn union_branch<'v>(
    union: &UnionNode,
    value: &'v Value,
) -> AvroResult<(usize, &'v Value)> {
    match value {
        Value::Union(index, inner) if (*index as usize) < union.branches.len() => {
            Ok((*index as usize, inner.as_ref()))
        }
        Value::Union(index, _) => Err(Details::EncodeUnionVariant {
            index: *index,
            num_variants: union.branches.len(),
        }
        .into()),
        other => Err(Details::UnionValueNotTagged(other.kind()).into()),
    }
}

/// The position of an enum value among the symbols.
///
/// Accepts `Value::Enum` whose index and symbol agree, or a symbol as `Value::String`.
pub(crate) fn enum_index(node: &EnumNode, value: &Value) -> AvroResult<usize> {
    match value {
        Value::Enum(index, symbol) => match node.symbols.get(*index as usize) {
            Some(expected) if expected == symbol => Ok(*index as usize),
            Some(_) => Err(Details::EnumValueMismatch {
                index: *index,
                symbol: symbol.clone(),
            }
            .into()),
            None => Err(Details::EncodeEnumIndex {
                index: *index,
                num_symbols: node.symbols.len(),
            }
            .into()),
        },
        Value::String(s) => match node.lookup.get(s) {
            Some(index) => Ok(*index),
            None => {
                error!("Invalid symbol string {:?} for enum {}.", &s[..], node.name);
                Err(Details::GetEnumSymbol(s.clone()).into())
            }
        },
        other => Err(Details::EncodeValueAsSchemaError {
            value_kind: other.kind(),
            expected: SchemaKind::Enum,
        }
        .into()),
    }
}

/// The raw bytes of a fixed value, which must be exactly `size` long.
pub(crate) fn fixed_bytes(size: usize, value: &Value) -> AvroResult<&[u8]> {
    match value {
        Value::Fixed(_, bytes) | Value::Bytes(bytes) => {
            if bytes.len() == size {
                Ok(bytes)
            } else {
                Err(Details::FixedSizeMismatch {
                    expected: size,
                    actual: bytes.len(),
                }
                .into())
            }
        }
        other => Err(Details::EncodeValueAsSchemaError {
            value_kind: other.kind(),
            expected: SchemaKind::Fixed,
        }
        .into()),
    }
}

/// The values of a record's fields in declaration order.
///
/// Fields are matched by name, from a `Value::Record` or a `Value::Map`. A field absent
/// from the value takes its default.
pub(crate) fn record_values<'v>(
    record: &'v RecordNode,
    value: &'v Value,
) -> AvroResult<Vec<&'v Value>> {
    let mut values: Vec<Option<&Value>> = vec![None; record.fields.len()];
    let mut set = |name: &str, value: &'v Value| -> AvroResult<()> {
        match record.lookup.get(name) {
            Some(&position) => {
                values[position] = Some(value);
                Ok(())
            }
            None => Err(Details::UnknownRecordField(name.to_string()).into()),
        }
    };
    match value {
        Value::Record(fields) => {
            for (name, value) in fields {
                set(name, value)?;
            }
        }
        Value::Map(fields) => {
            for (name, value) in fields {
                set(name, value)?;
            }
        }
        other => {
            return Err(Details::EncodeValueAsSchemaError {
                value_kind: other.kind(),
                expected: SchemaKind::Record,
            }
            .into());
        }
    }
    record
        .fields
        .iter()
        .zip(values)
        .map(|(field, value)| {
            value
                .or(field.default.as_ref())
                .ok_or_else(|| Error::from(Details::MissingRecordField(field.name.clone())))
        })
        .collect()
}
