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

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use crate::{
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// Represents names for `record`, `enum` and `fixed` Avro schemas.
///
/// Each of these `Schema`s have a `fullname` composed of two parts:
///   * a name
///   * a namespace
///
/// More information about schema names can be found in the
/// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct Name {
    /// The full name
    namespace_and_name: String,
    /// Start byte of the name part
    ///
    /// If this is zero, then there is no namespace.
    index_of_name: usize,
}

/// Represents Schema lookup within a schema
pub type Names = HashMap<Name, Schema>;
/// Represents the namespace for Named Schema
pub type Namespace = Option<String>;
/// Represents the namespace for Named Schema
pub type NamespaceRef<'a> = Option<&'a str>;

impl Name {
    /// Create a new `Name`.
    /// Parses the optional `namespace` from the `name` string.
    pub fn new(name: impl Into<String> + AsRef<str>) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a new `Name` using the namespace from `enclosing_namespace` if absent.
    ///
    /// A name that already contains a dot is fully qualified and ignores `enclosing_namespace`.
    /// An empty namespace means no namespace.
    pub fn new_with_enclosing_namespace(
        name: impl Into<String> + AsRef<str>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_ref = name.as_ref();
        let index_of_name = validate_schema_name(name_ref)?;

        if index_of_name == 0
            && let Some(namespace) = enclosing_namespace
            && !namespace.is_empty()
        {
            validate_namespace(namespace)?;
            Ok(Self {
                namespace_and_name: format!("{namespace}.{name_ref}"),
                index_of_name: namespace.len() + 1,
            })
        } else if index_of_name == 1 {
            // Name has a leading dot
            Ok(Self {
                namespace_and_name: name_ref[1..].into(),
                index_of_name: 0,
            })
        } else {
            Ok(Self {
                namespace_and_name: name.into(),
                index_of_name,
            })
        }
    }

    /// Parse the `name` and `namespace` attributes of a named schema.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_field = complex.name().ok_or(Details::GetNameField)?;
        let namespace = complex.string("namespace");
        Self::new_with_enclosing_namespace(
            name_field,
            namespace.as_deref().or(enclosing_namespace),
        )
    }

    pub fn name(&self) -> &str {
        &self.namespace_and_name[self.index_of_name..]
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        if self.index_of_name == 0 {
            None
        } else {
            Some(&self.namespace_and_name[..(self.index_of_name - 1)])
        }
    }

    /// Return the `fullname` of this `Name`, e.g. `org.apache.avro.Node`.
    ///
    /// More information about fullnames can be found in the
    /// [Avro specification](https://avro.apache.org/docs/++version++/specification/#names)
    pub fn fullname(&self) -> &str {
        &self.namespace_and_name
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for Name {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Name");
        debug.field("name", &self.name());
        if self.index_of_name != 0 {
            debug.field("namespace", &self.namespace());
            debug.finish()
        } else {
            debug.finish_non_exhaustive()
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.namespace_and_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avro_codec_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    /// Zero-length namespace is considered as no-namespace.
    fn test_namespace_from_name_with_empty_value() -> TestResult {
        let name = Name::new(".name")?;
        assert_eq!(name.namespace_and_name, "name");
        assert_eq!(name.index_of_name, 0);

        Ok(())
    }

    #[test]
    fn test_name_with_whitespace_value() {
        match Name::new(" ").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            _ => panic!("Expected an Details::InvalidSchemaName!"),
        }
    }

    #[test]
    fn test_name_with_no_name_part() {
        match Name::new("space.").map_err(Error::into_details) {
            Err(Details::InvalidSchemaName(_, _)) => {}
            _ => panic!("Expected an Details::InvalidSchemaName!"),
        }
    }

    #[test]
    fn names_made_of_underscores_are_valid() {
        for funny_name in ["_", "_._", "__._", "_.__", "_._._"] {
            assert!(Name::new(funny_name).is_ok(), "{funny_name}");
        }
    }

    #[test]
    fn enclosing_namespace_is_inherited() -> TestResult {
        let name = Name::new_with_enclosing_namespace("Node", Some("org.apache.avro"))?;
        assert_eq!(name.fullname(), "org.apache.avro.Node");
        assert_eq!(name.name(), "Node");
        assert_eq!(name.namespace(), Some("org.apache.avro"));
        Ok(())
    }

    #[test]
    fn dotted_name_ignores_namespaces() -> TestResult {
        let complex = json!({"name": "a.b.Node", "namespace": "x.y"});
        let name = Name::parse(complex.as_object().expect("object"), Some("outer"))?;
        assert_eq!(name.fullname(), "a.b.Node");
        assert_eq!(name.namespace(), Some("a.b"));
        Ok(())
    }

    #[test]
    fn explicit_empty_namespace_clears_the_enclosing_one() -> TestResult {
        let complex = json!({"name": "Node", "namespace": ""});
        let name = Name::parse(complex.as_object().expect("object"), Some("outer"))?;
        assert_eq!(name.fullname(), "Node");
        assert_eq!(name.namespace(), None);
        Ok(())
    }

    #[test]
    fn namespace_attribute_wins_over_enclosing() -> TestResult {
        let complex = json!({"name": "Node", "namespace": "inner"});
        let name = Name::parse(complex.as_object().expect("object"), Some("outer"))?;
        assert_eq!(name.to_string(), "inner.Node");
        Ok(())
    }
}
