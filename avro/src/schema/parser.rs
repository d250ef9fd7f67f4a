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

use crate::error::Details;
use crate::schema::{
    ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, Names, NamespaceRef, RecordField,
    RecordSchema, Schema, UnionSchema,
};
use crate::util::MapHelper;
use crate::validator::validate_enum_symbol_name;
use crate::{AvroResult, Error};
use log::{debug, error, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
pub(crate) struct Parser {
    /// Used to resolve cyclic references, i.e. when a
    /// field's type is a reference to its record's type
    resolving_schemas: Names,
    /// Named schemas that are completely parsed
    parsed_schemas: Names,
}

impl Parser {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub(super) fn parse_str(&mut self, input: &str) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        self.parse(&value, None)
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro schema.
    pub(crate) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match *value {
            Value::String(ref t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(ref data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(ref data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse a string as a primitive type or reference to `parsed_schemas`.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// Given a name, looks up a named schema that is already parsed or currently
    /// being parsed, and returns a reference to it.
    ///
    /// Named schemas must be defined before they are referenced, except from
    /// inside their own definition.
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        // For good error reporting we add this check
        match name {
            "record" | "enum" | "fixed" | "array" | "map" => {
                return Err(Details::InvalidSchemaRecord(name.to_string()).into());
            }
            "bool" => {
                return Err(Details::ParsePrimitiveSimilar(name.to_string(), "boolean").into());
            }
            _ => (),
        }

        let fully_qualified_name = Name::new_with_enclosing_namespace(name, enclosing_namespace)
            .map_err(|_| Details::ParsePrimitive(name.to_string()))?;

        if self.parsed_schemas.contains_key(&fully_qualified_name)
            || self.resolving_schemas.contains_key(&fully_qualified_name)
        {
            return Ok(Schema::Ref {
                name: fully_qualified_name,
            });
        }

        // Unqualified names may also refer to a type in the null namespace.
        if enclosing_namespace.is_some() && !name.contains('.') {
            let global = Name::new(name)?;
            if self.parsed_schemas.contains_key(&global)
                || self.resolving_schemas.contains_key(&global)
            {
                return Ok(Schema::Ref { name: global });
            }
        }

        Err(Details::ParsePrimitive(fully_qualified_name.to_string()).into())
    }

    /// Parse a `serde_json::Value` representing a complex Avro type into a `Schema`.
    ///
    /// Avro supports "recursive" definition of types.
    /// e.g: `{"type": {"type": "string"}}`
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match complex.get("logicalType") {
            // Logical types are annotations only; the underlying type is used as is.
            Some(Value::String(t)) => {
                warn!("Ignoring logical type '{t}', the underlying type is used");
            }
            Some(value) => return Err(Details::GetLogicalTypeFieldType(value.clone()).into()),
            None => {}
        }
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    fn register_resolving_schema(&mut self, name: &Name) -> AvroResult<()> {
        if self.parsed_schemas.contains_key(name) || self.resolving_schemas.contains_key(name) {
            return Err(Details::NameCollision(name.to_string()).into());
        }
        self.resolving_schemas
            .insert(name.clone(), Schema::Ref { name: name.clone() });
        Ok(())
    }

    fn register_parsed_schema(&mut self, fully_qualified_name: &Name, schema: &Schema) {
        self.resolving_schemas.remove(fully_qualified_name);
        self.parsed_schemas
            .insert(fully_qualified_name.clone(), schema.clone());
    }

    /// Parse a `serde_json::Value` representing an Avro record type into a `Schema`.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;

        let mut lookup = BTreeMap::new();

        self.register_resolving_schema(&fully_qualified_name)?;

        debug!("Going to parse record schema: {:?}", &fully_qualified_name);

        let fields: Vec<RecordField> = complex
            .get("fields")
            .and_then(|fields| fields.as_array())
            .ok_or_else(|| Error::new(Details::GetRecordFieldsJson))
            .and_then(|fields| {
                fields
                    .iter()
                    .enumerate()
                    .map(|(position, field)| match field.as_object() {
                        Some(field) => {
                            RecordField::parse(field, position, self, &fully_qualified_name)
                        }
                        None => Err(Details::GetRecordFieldJson(field.clone()).into()),
                    })
                    .collect::<Result<_, _>>()
            })?;

        for (position, field) in fields.iter().enumerate() {
            if let Some(_old) = lookup.insert(field.name.clone(), position) {
                return Err(Details::FieldNameDuplicate(field.name.clone()).into());
            }
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            fields,
            lookup,
            attributes: self.get_custom_attributes(complex, vec!["fields"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema);
        Ok(schema)
    }

    fn get_custom_attributes(
        &self,
        complex: &Map<String, Value>,
        excluded: Vec<&'static str>,
    ) -> BTreeMap<String, Value> {
        let mut custom_attributes: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in complex {
            match key.as_str() {
                "type" | "name" | "namespace" | "doc" | "aliases" => continue,
                candidate if excluded.contains(&candidate) => continue,
                _ => custom_attributes.insert(key.clone(), value.clone()),
            };
        }
        custom_attributes
    }

    /// Parse a `serde_json::Value` representing a Avro enum type into a `Schema`.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.register_resolving_schema(&fully_qualified_name)?;

        debug!("Going to parse enum schema: {:?}", &fully_qualified_name);

        let symbols: Vec<String> = complex
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::from(Details::GetEnumSymbolsField))
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|symbol| symbol.as_str().map(|s| s.to_string()))
                    .collect::<Option<_>>()
                    .ok_or_else(|| Error::from(Details::GetEnumSymbols))
            })?;

        let mut existing_symbols: HashSet<&String> = HashSet::with_capacity(symbols.len());
        for symbol in symbols.iter() {
            validate_enum_symbol_name(symbol)?;

            // Ensure there are no duplicate symbols
            if !existing_symbols.insert(symbol) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }
        }

        let default = match complex.get("default") {
            Some(Value::String(s)) if symbols.contains(s) => Some(s.clone()),
            Some(Value::String(s)) => {
                return Err(Details::GetEnumDefault {
                    symbol: s.clone(),
                    symbols,
                }
                .into());
            }
            Some(value) => return Err(Details::EnumDefaultWrongType(value.clone()).into()),
            None => None,
        };

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            symbols,
            default,
            attributes: self.get_custom_attributes(complex, vec!["symbols", "default"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema);

        Ok(schema)
    }

    /// Parse a `serde_json::Value` representing a Avro array type into a `Schema`.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let items = complex
            .get("items")
            .ok_or_else(|| Details::GetArrayItemsField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))?;
        Ok(Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: self.get_custom_attributes(complex, vec!["items"]),
        }))
    }

    /// Parse a `serde_json::Value` representing a Avro map type into a `Schema`.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let types = complex
            .get("values")
            .ok_or_else(|| Details::GetMapValuesField.into())
            .and_then(|types| self.parse(types, enclosing_namespace))?;

        Ok(Schema::Map(MapSchema {
            types: Box::new(types),
            attributes: self.get_custom_attributes(complex, vec!["values"]),
        }))
    }

    /// Parse a `serde_json::Value` representing a Avro union type into a `Schema`.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|schemas| {
                if schemas.is_empty() {
                    error!(
                        "Union schemas should have at least two members! \
                    No value can be encoded with an empty union. \
                    Please enable debug logging to find out which Record schema \
                    declares the union with 'RUST_LOG=avro_codec::schema=debug'."
                    );
                } else if schemas.len() == 1 {
                    warn!(
                        "Union schema with just one member! Consider dropping the union! \
                    Please enable debug logging to find out which Record schema \
                    declares the union with 'RUST_LOG=avro_codec::schema=debug'."
                    );
                }
                Ok(Schema::Union(UnionSchema::new(schemas)?))
            })
    }

    /// Parse a `serde_json::Value` representing a Avro fixed type into a `Schema`.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let size = match complex.get("size") {
            Some(size) => size
                .as_u64()
                .ok_or_else(|| Details::GetFixedSizeFieldPositive(size.clone())),
            None => Err(Details::GetFixedSizeField),
        }?;

        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.register_resolving_schema(&fully_qualified_name)?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            doc: complex.doc(),
            size: size as usize,
            attributes: self.get_custom_attributes(complex, vec!["size"]),
        });

        self.register_parsed_schema(&fully_qualified_name, &schema);

        Ok(schema)
    }
}
