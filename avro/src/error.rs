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
    schema::{Name, SchemaKind},
    types::ValueKind,
};
use serde_json::Value as JsonValue;
use std::{error::Error as _, fmt};

/// Errors encountered while compiling a schema or while encoding and decoding data with it.
///
/// To inspect the details of the error use [`details`](Self::details) or
/// [`into_details`](Self::into_details). [`kind`](Self::kind) tells which stage failed.
///
/// Encode and decode errors remember where in the value they happened: [`path`](Self::path)
/// is the node path (e.g. `$.next<LongList>.values[3]`) and [`position`](Self::position) the
/// byte offset into the decoded buffer, when known.
pub struct Error {
    details: Box<Details>,
    path: NodePath,
    position: Option<usize>,
}

/// Which operation an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum ErrorKind {
    /// The schema is malformed or ambiguous. Only raised by schema compilation.
    Schema,
    /// The native value does not match the schema.
    Encode,
    /// The encoded data is truncated or invalid for the schema.
    Decode,
    /// A single-object frame was written with a different schema.
    FingerprintMismatch,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
            path: NodePath::default(),
            position: None,
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }

    /// The node path of the value that failed, from the root, e.g. `$.items[2]`.
    pub fn path(&self) -> String {
        self.path.to_string()
    }

    /// Byte offset into the input where decoding failed.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Record that the error happened below `segment`.
    ///
    /// Called while the error travels up, so segments arrive innermost first.
    pub(crate) fn within(mut self, segment: PathSegment) -> Self {
        self.path.0.push(segment);
        self
    }

    /// Record the byte offset of the failure, keeping the innermost one.
    pub(crate) fn at_position(mut self, position: usize) -> Self {
        self.position.get_or_insert(position);
        self
    }

    /// Move the recorded byte offset by `offset`, for input decoded after a prefix.
    pub(crate) fn shift_position(mut self, offset: usize) -> Self {
        if let Some(position) = self.position.as_mut() {
            *position += offset;
        }
        self
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.details)?;
        if !self.path.0.is_empty() {
            write!(f, " at {}", self.path)?;
        }
        if let Some(position) = self.position {
            write!(f, " (byte {position})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.details.source()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")?;
        if let Some(e) = self.details.source() {
            write!(f, ": {e}")?;
        }
        Ok(())
    }
}

/// One step on the way from the root value to the failing node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
    Branch(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct NodePath(Vec<PathSegment>);

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in self.0.iter().rev() {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key:?}]")?,
                PathSegment::Branch(name) => write!(f, "<{name}>")?,
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum Details {
    // Schema compilation
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown primitive type or unresolved name: {0}")]
    ParsePrimitive(String),

    #[error("Unknown primitive type or unresolved name: {0}. Did you mean '{1}'?")]
    ParsePrimitiveSimilar(String, &'static str),

    #[error(
        "Invalid schema: There is no type called '{0}', if you meant to define a non-primitive schema, it should be defined inside `type` attribute."
    )]
    InvalidSchemaRecord(String),

    #[error("No `type` in complex type")]
    GetComplexTypeField,

    #[error("Unknown complex type: {0}")]
    GetComplexType(JsonValue),

    #[error("No `name` field")]
    GetNameField,

    #[error("No `name` in record field")]
    GetNameFieldFromRecord,

    #[error("Invalid schema name {0}. It must match the regex '{1}'")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}. It must match the regex '{1}'")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid field name {0}")]
    FieldName(String),

    #[error("Duplicate field name {0}")]
    FieldNameDuplicate(String),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Duplicate enum symbol {0}")]
    EnumSymbolDuplicate(String),

    #[error("No `fields` in record")]
    GetRecordFieldsJson,

    #[error("Record field must be a JSON object, got {0}")]
    GetRecordFieldJson(JsonValue),

    #[error("No `symbols` field in enum")]
    GetEnumSymbolsField,

    #[error("Unable to parse `symbols` in enum")]
    GetEnumSymbols,

    #[error("Default value for enum must be a string! Got: {0}")]
    EnumDefaultWrongType(JsonValue),

    #[error("Enum default {symbol:?} is not among allowed symbols {symbols:?}")]
    GetEnumDefault {
        symbol: String,
        symbols: Vec<String>,
    },

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("No `size` in fixed")]
    GetFixedSizeField,

    #[error("Fixed schema `size` value must be a non-negative integer: {0}")]
    GetFixedSizeFieldPositive(JsonValue),

    #[error("Invalid `logicalType` attribute, it must be a string: {0}")]
    GetLogicalTypeFieldType(JsonValue),

    #[error("Unions may not directly contain a union")]
    GetNestedUnion,

    #[error("Unions cannot contain duplicate types, found at least two {0}")]
    GetUnionDuplicate(String),

    #[error("Two named schema defined for same fullname: {0}.")]
    NameCollision(String),

    #[error("Unresolved schema reference: {0}")]
    SchemaResolutionError(Name),

    #[error("Default value for field '{field}' in record '{record}' does not match its schema")]
    GetDefaultRecordField {
        field: String,
        record: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("Block length must be greater than zero")]
    InvalidBlockLength,

    // Encoding
    #[error("Cannot encode value of type {value_kind} as {expected}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        expected: SchemaKind,
    },

    #[error("Enum symbol not found: {0}")]
    GetEnumSymbol(String),

    #[error("Enum value index {index} is out of bounds for {num_symbols} symbols")]
    EncodeEnumIndex { index: u32, num_symbols: usize },

    #[error("Enum value index {index} does not match symbol {symbol:?}")]
    EnumValueMismatch { index: u32, symbol: String },

    #[error("Fixed size mismatch, expected: {expected}, got: {actual}")]
    FixedSizeMismatch { expected: usize, actual: usize },

    #[error("Union index {index} is out of bounds for {num_variants} branches")]
    EncodeUnionVariant { index: u32, num_variants: usize },

    #[error("Union values must name their branch with Value::Union, got a value of type {0}")]
    UnionValueNotTagged(ValueKind),

    #[error("Field '{0}' is missing from the record value and has no default")]
    MissingRecordField(String),

    #[error("Record value has field '{0}' which is not in the schema")]
    UnknownRecordField(String),

    #[error("Cannot write non-finite float {0} as JSON")]
    ConvertF64ToJson(f64),

    #[error("Failed to write JSON datum")]
    WriteJson(#[source] serde_json::Error),

    #[error("Integer {value} cannot be represented exactly as {expected}")]
    InexactFloat { value: i64, expected: SchemaKind },

    #[error("Value is nested deeper than the maximum depth of {0}")]
    EncodeDepthLimit(usize),

    // Decoding
    #[error("Unexpected end of input, needed {needed} more bytes")]
    UnexpectedEof { needed: usize },

    #[error("Variable-length integer does not fit in 64 bits")]
    IntegerOverflow,

    #[error("Int value {1} does not fit in 32 bits")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Invalid boolean byte: {0}")]
    BoolValue(u8),

    #[error("Negative length {0}")]
    NegativeLength(i64),

    #[error(
        "Unable to allocate {desired} bytes (maximum allowed: {maximum}). Raise the limit with `max_allocation_bytes`"
    )]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Invalid UTF-8 in string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Enum index {index} is out of bounds for {num_symbols} symbols")]
    GetEnumValue { index: i64, num_symbols: usize },

    #[error("Union index {index} is out of bounds for {num_variants} branches")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Failed to parse JSON datum")]
    ParseJson(#[source] serde_json::Error),

    #[error("Expected {expected} in JSON datum, found {value}")]
    GetJsonValue {
        expected: &'static str,
        value: JsonValue,
    },

    #[error("Character {0:?} in JSON bytes is outside the range of a byte")]
    JsonByteOutOfRange(char),

    #[error("Nesting is deeper than the maximum depth of {0}")]
    DecodeDepthLimit(usize),

    #[error("Fixed JSON datum has {actual} bytes, expected {expected}")]
    JsonFixedSize { expected: usize, actual: usize },

    #[error("Enum has no symbol {0:?}")]
    UnknownEnumSymbol(String),

    #[error("Union has no branch named '{0}'")]
    UnknownUnionBranch(String),

    #[error("Union datum must be null or an object with a single key naming the branch, got {0}")]
    JsonUnionObject(JsonValue),

    #[error("Field '{0}' is missing and has no default")]
    GetField(String),

    #[error("Field '{0}' is not in the schema")]
    UnknownField(String),

    #[error("Buffer of {0} bytes is too short for a single-object header")]
    ReadHeader(usize),

    #[error("Not a single-object encoded buffer, found magic {0:02X?}")]
    HeaderMagic([u8; 2]),

    // Framing
    #[error("Frame fingerprint {found:#018x} does not match schema fingerprint {expected:#018x}")]
    FingerprintMismatch { expected: i64, found: i64 },
}

impl Details {
    /// The operation this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Details::ParseSchemaJson(_)
            | Details::ParseSchemaFromValidJson
            | Details::ParsePrimitive(_)
            | Details::ParsePrimitiveSimilar(_, _)
            | Details::InvalidSchemaRecord(_)
            | Details::GetComplexTypeField
            | Details::GetComplexType(_)
            | Details::GetNameField
            | Details::GetNameFieldFromRecord
            | Details::InvalidSchemaName(_, _)
            | Details::InvalidNamespace(_, _)
            | Details::FieldName(_)
            | Details::FieldNameDuplicate(_)
            | Details::EnumSymbolName(_)
            | Details::EnumSymbolDuplicate(_)
            | Details::GetRecordFieldsJson
            | Details::GetRecordFieldJson(_)
            | Details::GetEnumSymbolsField
            | Details::GetEnumSymbols
            | Details::EnumDefaultWrongType(_)
            | Details::GetEnumDefault { .. }
            | Details::GetArrayItemsField
            | Details::GetMapValuesField
            | Details::GetFixedSizeField
            | Details::GetFixedSizeFieldPositive(_)
            | Details::GetLogicalTypeFieldType(_)
            | Details::GetNestedUnion
            | Details::GetUnionDuplicate(_)
            | Details::NameCollision(_)
            | Details::SchemaResolutionError(_)
            | Details::GetDefaultRecordField { .. }
            | Details::InvalidBlockLength => ErrorKind::Schema,
            Details::EncodeValueAsSchemaError { .. }
            | Details::GetEnumSymbol(_)
            | Details::EncodeEnumIndex { .. }
            | Details::EnumValueMismatch { .. }
            | Details::FixedSizeMismatch { .. }
            | Details::EncodeUnionVariant { .. }
            | Details::UnionValueNotTagged(_)
            | Details::MissingRecordField(_)
            | Details::UnknownRecordField(_)
            | Details::ConvertF64ToJson(_)
            | Details::WriteJson(_)
            | Details::InexactFloat { .. }
            | Details::EncodeDepthLimit(_) => ErrorKind::Encode,
            Details::UnexpectedEof { .. }
            | Details::IntegerOverflow
            | Details::ZagI32(_, _)
            | Details::BoolValue(_)
            | Details::NegativeLength(_)
            | Details::MemoryAllocation { .. }
            | Details::ConvertToUtf8(_)
            | Details::GetEnumValue { .. }
            | Details::GetUnionVariant { .. }
            | Details::ParseJson(_)
            | Details::GetJsonValue { .. }
            | Details::JsonByteOutOfRange(_)
            | Details::JsonFixedSize { .. }
            | Details::DecodeDepthLimit(_)
            | Details::UnknownEnumSymbol(_)
            | Details::UnknownUnionBranch(_)
            | Details::JsonUnionObject(_)
            | Details::GetField(_)
            | Details::UnknownField(_)
            | Details::ReadHeader(_)
            | Details::HeaderMagic(_) => ErrorKind::Decode,
            Details::FingerprintMismatch { .. } => ErrorKind::FingerprintMismatch,
        }
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn path_is_rendered_from_the_root() {
        let error = Error::new(Details::GetEnumSymbol("delta".to_string()))
            .within(PathSegment::Field("suit".to_string()))
            .within(PathSegment::Index(3))
            .within(PathSegment::Branch("Card".to_string()))
            .within(PathSegment::Field("cards".to_string()));

        assert_eq!(error.path(), "$.cards<Card>[3].suit");
        assert_eq!(
            error.to_string(),
            "Enum symbol not found: delta at $.cards<Card>[3].suit"
        );
        assert_eq!(error.kind(), ErrorKind::Encode);
    }

    #[test]
    fn innermost_position_wins() {
        let error = Error::new(Details::IntegerOverflow)
            .at_position(12)
            .at_position(4);

        assert_eq!(error.position(), Some(12));
        assert_eq!(
            error.to_string(),
            "Variable-length integer does not fit in 64 bits (byte 12)"
        );
        assert_eq!(error.kind(), ErrorKind::Decode);
    }

    #[test]
    fn map_keys_are_quoted() {
        let error = Error::new(Details::BoolValue(7)).within(PathSegment::Key("a b".to_string()));
        assert_eq!(error.to_string(), r#"Invalid boolean byte: 7 at $["a b"]"#);
    }
}
