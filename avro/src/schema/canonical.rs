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

//! [Parsing Canonical Form] of a parsed schema.
//!
//! [Parsing Canonical Form]:
//! https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas

use crate::schema::{ArraySchema, EnumSchema, FixedSchema, MapSchema, RecordSchema, Schema};
use std::collections::HashSet;

/// Renders `schema` in Parsing Canonical Form.
///
/// Named types are written out at their first occurrence and by full name afterwards.
pub(crate) fn parsing_canonical_form(schema: &Schema) -> String {
    let mut out = String::new();
    let mut defined_names = HashSet::new();
    pcf_schema(schema, &mut defined_names, &mut out);
    out
}

fn pcf_schema<'s>(schema: &'s Schema, defined_names: &mut HashSet<&'s str>, out: &mut String) {
    match schema {
        Schema::Null
        | Schema::Boolean
        | Schema::Int
        | Schema::Long
        | Schema::Float
        | Schema::Double
        | Schema::Bytes
        | Schema::String => pcf_string(schema.type_name(), out),
        Schema::Ref { name } => pcf_string(name.fullname(), out),
        Schema::Array(ArraySchema { items, .. }) => {
            out.push_str(r#"{"type":"array","items":"#);
            pcf_schema(items, defined_names, out);
            out.push('}');
        }
        Schema::Map(MapSchema { types, .. }) => {
            out.push_str(r#"{"type":"map","values":"#);
            pcf_schema(types, defined_names, out);
            out.push('}');
        }
        Schema::Union(union) => {
            out.push('[');
            for (i, variant) in union.variants().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                pcf_schema(variant, defined_names, out);
            }
            out.push(']');
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            if !pcf_name(name.fullname(), "record", defined_names, out) {
                return;
            }
            out.push_str(r#","fields":["#);
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(r#"{"name":"#);
                pcf_string(&field.name, out);
                out.push_str(r#","type":"#);
                pcf_schema(&field.schema, defined_names, out);
                out.push('}');
            }
            out.push_str("]}");
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            if !pcf_name(name.fullname(), "enum", defined_names, out) {
                return;
            }
            out.push_str(r#","symbols":["#);
            for (i, symbol) in symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                pcf_string(symbol, out);
            }
            out.push_str("]}");
        }
        Schema::Fixed(FixedSchema { name, size, .. }) => {
            if !pcf_name(name.fullname(), "fixed", defined_names, out) {
                return;
            }
            out.push_str(&format!(r#","size":{size}}}"#));
        }
    }
}

/// Writes the opening of a named type, or just its name if it was already defined.
///
/// Returns whether the caller should write the rest of the definition.
fn pcf_name<'s>(
    fullname: &'s str,
    typ: &str,
    defined_names: &mut HashSet<&'s str>,
    out: &mut String,
) -> bool {
    if !defined_names.insert(fullname) {
        pcf_string(fullname, out);
        return false;
    }
    out.push_str(r#"{"name":"#);
    pcf_string(fullname, out);
    out.push_str(&format!(r#","type":"{typ}""#));
    true
}

fn pcf_string(s: &str, out: &mut String) {
    out.push('"');
    out.push_str(s);
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use avro_codec_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    fn pcf(input: &str) -> Result<String, crate::Error> {
        Ok(parsing_canonical_form(&Schema::parse_str(input)?))
    }

    #[test]
    fn primitives_reduce_to_their_name() -> TestResult {
        assert_eq!(pcf(r#"{"type": "null"}"#)?, r#""null""#);
        assert_eq!(pcf(r#"{"type": "long", "logicalType": "time-micros"}"#)?, r#""long""#);
        Ok(())
    }

    #[test]
    fn attributes_are_ordered_and_stripped() -> TestResult {
        assert_eq!(
            pcf(r#"{"type":"map","values":{"type":"enum","name":"foo","symbols":["alpha","bravo"]}}"#)?,
            r#"{"type":"map","values":{"name":"foo","type":"enum","symbols":["alpha","bravo"]}}"#
        );
        assert_eq!(
            pcf(r#"{ "fields":[{"type":"boolean", "aliases":[], "name":"f1", "default":true},
                {"order":"descending","name":"f2","doc":"Hello","type":"int"}],
                "type":"record", "name":"foo"}"#)?,
            r#"{"name":"foo","type":"record","fields":[{"name":"f1","type":"boolean"},{"name":"f2","type":"int"}]}"#
        );
        assert_eq!(
            pcf(r#"{"namespace":"x.y.z", "type":"fixed", "name":"foo", "doc":"foo bar", "size":32}"#)?,
            r#"{"name":"x.y.z.foo","type":"fixed","size":32}"#
        );
        Ok(())
    }

    #[test]
    fn dotted_names_keep_their_namespace() -> TestResult {
        assert_eq!(
            pcf(r#"{"fields":[], "type":"record", "name":"a.b.foo", "namespace":"x.y"}"#)?,
            r#"{"name":"a.b.foo","type":"record","fields":[]}"#
        );
        Ok(())
    }

    #[test]
    fn named_types_are_defined_once() -> TestResult {
        assert_eq!(
            pcf(r#"{"type": "record", "name": "Pair", "namespace": "ns", "fields": [
                {"name": "a", "type": {"type": "fixed", "name": "Two", "size": 2}},
                {"name": "b", "type": "Two"},
                {"name": "next", "type": ["null", "Pair"]}
            ]}"#)?,
            r#"{"name":"ns.Pair","type":"record","fields":[{"name":"a","type":{"name":"ns.Two","type":"fixed","size":2}},{"name":"b","type":"ns.Two"},{"name":"next","type":["null","ns.Pair"]}]}"#
        );
        Ok(())
    }
}
