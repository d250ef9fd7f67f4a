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

//! Compiled form of a [`Schema`]: a flat arena of nodes in which named references are
//! resolved to node ids, so encoders and decoders never look names up.

use crate::{
    AvroResult,
    error::Details,
    schema::{
        ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, RecordSchema, Schema, SchemaKind,
    },
    textual,
    types::Value,
};
use log::debug;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Index of a [`Node`] in a [`CompiledSchema`].
pub(crate) type NodeId = usize;

#[derive(Debug)]
pub(crate) struct CompiledSchema {
    nodes: Vec<Node>,
    root: NodeId,
}

#[derive(Debug)]
pub(crate) enum Node {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array(NodeId),
    Map(NodeId),
    Union(UnionNode),
    Record(RecordNode),
    Enum(EnumNode),
    Fixed { size: usize },
}

#[derive(Debug)]
pub(crate) struct UnionNode {
    pub(crate) branches: Vec<NodeId>,
    /// Branch names as used by the JSON encoding, by branch index.
    pub(crate) names: Vec<String>,
    pub(crate) lookup: HashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) struct RecordNode {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldNode>,
    pub(crate) lookup: HashMap<String, usize>,
}

#[derive(Debug)]
pub(crate) struct FieldNode {
    pub(crate) name: String,
    pub(crate) node: NodeId,
    pub(crate) default: Option<Value>,
}

#[derive(Debug)]
pub(crate) struct EnumNode {
    pub(crate) name: String,
    pub(crate) symbols: Vec<String>,
    pub(crate) lookup: HashMap<String, usize>,
}

impl Node {
    pub(crate) fn kind(&self) -> SchemaKind {
        match self {
            Node::Null => SchemaKind::Null,
            Node::Boolean => SchemaKind::Boolean,
            Node::Int => SchemaKind::Int,
            Node::Long => SchemaKind::Long,
            Node::Float => SchemaKind::Float,
            Node::Double => SchemaKind::Double,
            Node::Bytes => SchemaKind::Bytes,
            Node::String => SchemaKind::String,
            Node::Array(_) => SchemaKind::Array,
            Node::Map(_) => SchemaKind::Map,
            Node::Union(_) => SchemaKind::Union,
            Node::Record(_) => SchemaKind::Record,
            Node::Enum(_) => SchemaKind::Enum,
            Node::Fixed { .. } => SchemaKind::Fixed,
        }
    }
}

impl CompiledSchema {
    pub(crate) fn compile(schema: &Schema) -> AvroResult<Self> {
        let mut compiler = Compiler::default();
        let root = compiler.compile(schema)?;
        let mut compiled = CompiledSchema {
            nodes: compiler.nodes,
            root,
        };
        compiled.resolve_defaults(compiler.pending_defaults)?;
        debug!("Compiled schema into {} nodes", compiled.nodes.len());
        Ok(compiled)
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Converts the JSON defaults of record fields to native values.
    ///
    /// A record default may omit fields that have defaults of their own, including fields of
    /// the record being resolved. Defaults that fail are retried as long as a pass resolves
    /// at least one more of them.
    fn resolve_defaults(&mut self, mut pending: Vec<PendingDefault>) -> AvroResult<()> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut first_error = None;
            let mut failed = Vec::new();
            for default in pending {
                match self.resolve_default(&default) {
                    Ok(value) => {
                        if let Node::Record(RecordNode { fields, .. }) =
                            &mut self.nodes[default.record]
                        {
                            fields[default.field].default = Some(value);
                        }
                    }
                    Err(e) => {
                        first_error.get_or_insert(e);
                        failed.push(default);
                    }
                }
            }
            if let Some(e) = first_error
                && failed.len() == before
            {
                return Err(e);
            }
            pending = failed;
        }
        Ok(())
    }

    fn resolve_default(&self, default: &PendingDefault) -> AvroResult<Value> {
        self.default_value(default.node, &default.json).map_err(|cause| {
            Details::GetDefaultRecordField {
                field: default.field_name.clone(),
                record: default.record_name.clone(),
                cause: Box::new(cause),
            }
            .into()
        })
    }

    /// A field default is written as its plain JSON value. For a union it is a value of the
    /// first branch.
    fn default_value(&self, node: NodeId, json: &JsonValue) -> AvroResult<Value> {
        match self.node(node) {
            Node::Union(UnionNode { branches, .. }) => match branches.first() {
                Some(&first) => Ok(Value::Union(
                    0,
                    Box::new(textual::value_from_json(self, first, json)?),
                )),
                None => Err(Details::GetUnionVariant {
                    index: 0,
                    num_variants: 0,
                }
                .into()),
            },
            _ => textual::value_from_json(self, node, json),
        }
    }
}

struct PendingDefault {
    record: NodeId,
    record_name: String,
    field: usize,
    field_name: String,
    /// Type of the field.
    node: NodeId,
    json: JsonValue,
}

#[derive(Default)]
struct Compiler {
    nodes: Vec<Node>,
    names: HashMap<Name, NodeId>,
    pending_defaults: Vec<PendingDefault>,
}

impl Compiler {
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn register(&mut self, name: &Name, id: NodeId) -> AvroResult<()> {
        if self.names.insert(name.clone(), id).is_some() {
            return Err(Details::NameCollision(name.to_string()).into());
        }
        Ok(())
    }

    fn compile(&mut self, schema: &Schema) -> AvroResult<NodeId> {
        let id = match schema {
            Schema::Null => self.push(Node::Null),
            Schema::Boolean => self.push(Node::Boolean),
            Schema::Int => self.push(Node::Int),
            Schema::Long => self.push(Node::Long),
            Schema::Float => self.push(Node::Float),
            Schema::Double => self.push(Node::Double),
            Schema::Bytes => self.push(Node::Bytes),
            Schema::String => self.push(Node::String),
            Schema::Array(ArraySchema { items, .. }) => {
                let items = self.compile(items)?;
                self.push(Node::Array(items))
            }
            Schema::Map(MapSchema { types, .. }) => {
                let values = self.compile(types)?;
                self.push(Node::Map(values))
            }
            Schema::Union(union) => {
                let mut node = UnionNode {
                    branches: Vec::with_capacity(union.variants().len()),
                    names: Vec::with_capacity(union.variants().len()),
                    lookup: HashMap::new(),
                };
                for (i, variant) in union.variants().iter().enumerate() {
                    node.branches.push(self.compile(variant)?);
                    node.names.push(variant.type_name().to_string());
                    node.lookup.insert(variant.type_name().to_string(), i);
                }
                self.push(Node::Union(node))
            }
            Schema::Record(record) => self.compile_record(record)?,
            Schema::Enum(EnumSchema { name, symbols, .. }) => {
                let id = self.push(Node::Enum(EnumNode {
                    name: name.to_string(),
                    lookup: symbols
                        .iter()
                        .enumerate()
                        .map(|(i, symbol)| (symbol.clone(), i))
                        .collect(),
                    symbols: symbols.clone(),
                }));
                self.register(name, id)?;
                id
            }
            Schema::Fixed(FixedSchema { name, size, .. }) => {
                let id = self.push(Node::Fixed { size: *size });
                self.register(name, id)?;
                id
            }
            Schema::Ref { name } => *self
                .names
                .get(name)
                .ok_or_else(|| Details::SchemaResolutionError(name.clone()))?,
        };
        Ok(id)
    }

    fn compile_record(&mut self, record: &RecordSchema) -> AvroResult<NodeId> {
        // Registered before the fields so they can refer back to the record.
        let id = self.push(Node::Record(RecordNode {
            name: record.name.to_string(),
            fields: Vec::with_capacity(record.fields.len()),
            lookup: HashMap::with_capacity(record.fields.len()),
        }));
        self.register(&record.name, id)?;

        let mut fields = Vec::with_capacity(record.fields.len());
        for (position, field) in record.fields.iter().enumerate() {
            let node = self.compile(&field.schema)?;
            if let Some(json) = &field.default {
                self.pending_defaults.push(PendingDefault {
                    record: id,
                    record_name: record.name.to_string(),
                    field: position,
                    field_name: field.name.clone(),
                    node,
                    json: json.clone(),
                });
            }
            fields.push(FieldNode {
                name: field.name.clone(),
                node,
                default: None,
            });
        }
        if let Node::Record(node) = &mut self.nodes[id] {
            node.lookup = fields
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name.clone(), i))
                .collect();
            node.fields = fields;
        }
        Ok(id)
    }
}
