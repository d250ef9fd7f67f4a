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
    compiled::{CompiledSchema, Node, NodeId},
    error::{Details, PathSegment},
    types::Value,
    util::{safe_len, zag_i64},
};
use std::collections::HashMap;

/// Binary decoder reading one value from the start of a buffer.
pub(crate) struct Decoder<'s, 'b> {
    schema: &'s CompiledSchema,
    buffer: &'b [u8],
    /// Offset of the next unread byte.
    position: usize,
    max_allocation_bytes: usize,
    max_depth: usize,
}

impl<'s, 'b> Decoder<'s, 'b> {
    pub(crate) fn new(
        schema: &'s CompiledSchema,
        buffer: &'b [u8],
        max_allocation_bytes: usize,
        max_depth: usize,
    ) -> Self {
        Self {
            schema,
            buffer,
            position: 0,
            max_allocation_bytes,
            max_depth,
        }
    }

    /// Decode one value and return it with the unread rest of the buffer.
    pub(crate) fn decode(mut self) -> AvroResult<(Value, &'b [u8])> {
        let value = self.decode_internal(self.schema.root(), 0)?;
        Ok((value, &self.buffer[self.position..]))
    }

    fn remaining(&self) -> &'b [u8] {
        &self.buffer[self.position..]
    }

    fn fail(&self, details: Details) -> Error {
        Error::from(details).at_position(self.position)
    }

    fn decode_internal(&mut self, id: NodeId, depth: usize) -> AvroResult<Value> {
        if depth >= self.max_depth {
            return Err(self.fail(Details::DecodeDepthLimit(self.max_depth)));
        }
        let depth = depth + 1;
        let schema = self.schema;
        let value = match schema.node(id) {
            Node::Null => Value::Null,
            Node::Boolean => match self.read_bytes(1)? {
                [0] => Value::Boolean(false),
                [1] => Value::Boolean(true),
                [byte, ..] => {
                    self.position -= 1;
                    return Err(self.fail(Details::BoolValue(*byte)));
                }
                [] => unreachable!("read_bytes(1) returns one byte"),
            },
            Node::Int => Value::Int(self.read_int()?),
            Node::Long => Value::Long(self.read_long()?),
            Node::Float => {
                let Some(bytes) = self.remaining().first_chunk::<4>().copied() else {
                    return Err(self.eof(4));
                };
                self.position += 4;
                Value::Float(f32::from_le_bytes(bytes))
            }
            Node::Double => {
                let Some(bytes) = self.remaining().first_chunk::<8>().copied() else {
                    return Err(self.eof(8));
                };
                self.position += 8;
                Value::Double(f64::from_le_bytes(bytes))
            }
            Node::Bytes => {
                let len = self.read_len()?;
                Value::Bytes(self.read_bytes(len)?.to_vec())
            }
            Node::String => Value::String(self.read_string()?),
            Node::Array(items) => {
                let mut values = Vec::new();
                self.read_blocks(|decoder, i| {
                    let value = decoder
                        .decode_internal(*items, depth)
                        .map_err(|e| e.within(PathSegment::Index(i)))?;
                    values.push(value);
                    Ok(())
                })?;
                Value::Array(values)
            }
            Node::Map(values) => {
                let mut entries = HashMap::new();
                self.read_blocks(|decoder, _| {
                    let key = decoder.read_string()?;
                    let value = decoder
                        .decode_internal(*values, depth)
                        .map_err(|e| e.within(PathSegment::Key(key.clone())))?;
                    entries.insert(key, value);
                    Ok(())
                })?;
                Value::Map(entries)
            }
            Node::Union(union) => {
                let start = self.position;
                let index = self.read_long()?;
                let branch = usize::try_from(index)
                    .ok()
                    .filter(|&i| i < union.branches.len())
                    .ok_or_else(|| {
                        Error::from(Details::GetUnionVariant {
                            index,
                            num_variants: union.branches.len(),
                        })
                        .at_position(start)
                    })?;
                let value = self
                    .decode_internal(union.branches[branch], depth)
                    .map_err(|e| e.within(PathSegment::Branch(union.names[branch].clone())))?;
                Value::Union(branch as u32, Box::new(value))
            }
            Node::Record(record) => {
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let value = self
                        .decode_internal(field.node, depth)
                        .map_err(|e| e.within(PathSegment::Field(field.name.clone())))?;
                    fields.push((field.name.clone(), value));
                }
                Value::Record(fields)
            }
            Node::Enum(node) => {
                let start = self.position;
                let index = self.read_long()?;
                match usize::try_from(index)
                    .ok()
                    .and_then(|i| node.symbols.get(i).map(|symbol| (i, symbol)))
                {
                    Some((i, symbol)) => Value::Enum(i as u32, symbol.clone()),
                    None => {
                        return Err(Error::from(Details::GetEnumValue {
                            index,
                            num_symbols: node.symbols.len(),
                        })
                        .at_position(start));
                    }
                }
            }
            Node::Fixed { size, .. } => Value::Fixed(*size, self.read_bytes(*size)?.to_vec()),
        };
        Ok(value)
    }

    fn eof(&self, needed: usize) -> Error {
        self.fail(Details::UnexpectedEof {
            needed: needed - self.remaining().len(),
        })
    }

    fn read_long(&mut self) -> AvroResult<i64> {
        match zag_i64(self.remaining()).map_err(|e| e.at_position(self.position))? {
            Some((n, consumed)) => {
                self.position += consumed;
                Ok(n)
            }
            None => Err(self.eof(self.remaining().len() + 1)),
        }
    }

    fn read_int(&mut self) -> AvroResult<i32> {
        let start = self.position;
        let n = self.read_long()?;
        i32::try_from(n).map_err(|e| Error::from(Details::ZagI32(e, n)).at_position(start))
    }

    /// Reads a length prefix, bounded by the allocation limit.
    fn read_len(&mut self) -> AvroResult<usize> {
        let start = self.position;
        let len = self.read_long()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::from(Details::NegativeLength(len)).at_position(start))?;
        safe_len(len, self.max_allocation_bytes).map_err(|e| e.at_position(start))
    }

    fn read_bytes(&mut self, len: usize) -> AvroResult<&'b [u8]> {
        if self.remaining().len() < len {
            return Err(self.eof(len));
        }
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_string(&mut self) -> AvroResult<String> {
        let len = self.read_len()?;
        let start = self.position;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::from(Details::ConvertToUtf8(e)).at_position(start))
    }

    /// Reads array or map blocks until the empty block, calling `read_item` with the
    /// running item index.
    ///
    /// A negative block count is followed by the byte size of the block, which is skipped.
    /// The items of all blocks together must fit the allocation limit even when they
    /// take no bytes on the wire.
    fn read_blocks<F>(&mut self, mut read_item: F) -> AvroResult<()>
    where
        F: FnMut(&mut Self, usize) -> AvroResult<()>,
    {
        let mut index = 0;
        loop {
            let start = self.position;
            let count = self.read_long()?;
            if count == 0 {
                return Ok(());
            }
            let count = if count < 0 {
                let _size = self.read_len()?;
                count
                    .checked_neg()
                    .ok_or_else(|| Error::from(Details::NegativeLength(count)).at_position(start))?
            } else {
                count
            };
            let count = safe_len(count as usize, self.max_allocation_bytes)
                .map_err(|e| e.at_position(start))?;
            let total = (index + count).saturating_mul(size_of::<Value>());
            safe_len(total, self.max_allocation_bytes).map_err(|e| e.at_position(start))?;
            for _ in 0..count {
                read_item(self, index)?;
                index += 1;
            }
        }
    }
}
