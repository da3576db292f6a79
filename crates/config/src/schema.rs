//! Schema grammar for config documents.
//!
//! A schema is a tree of [`SchemaNode`]s. Named mappings declare their fields
//! (in order) and reject undeclared keys; permissive nodes accept any mapping
//! without looking inside it. Optionality belongs to the field that holds a
//! node, so it only decides whether the node's *absence* is an error.

use crate::value::{ConfigValue, ValueKind};
use serde::Serialize;
use std::fmt;

/// Scalar types a schema leaf can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// Any string.
    String,
    /// An integer; booleans and numeric strings are rejected.
    Int,
    /// A float; integers are accepted as well.
    Float,
    /// A boolean.
    Bool,
}

impl ScalarKind {
    /// Returns true when `value` satisfies this scalar type.
    #[must_use]
    pub const fn accepts(self, value: &ConfigValue) -> bool {
        matches!(
            (self, value.kind()),
            (Self::String, ValueKind::String)
                | (Self::Int, ValueKind::Int)
                | (Self::Float, ValueKind::Float | ValueKind::Int)
                | (Self::Bool, ValueKind::Bool)
        )
    }

    /// Lowercase name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaNode {
    /// A typed scalar leaf.
    Scalar {
        /// Required scalar type.
        kind: ScalarKind,
    },
    /// A named mapping with a closed set of declared fields.
    NamedMapping(NamedMapping),
    /// An open mapping; contents are accepted verbatim.
    Permissive,
}

impl SchemaNode {
    /// String leaf.
    #[must_use]
    pub const fn string() -> Self {
        Self::Scalar {
            kind: ScalarKind::String,
        }
    }

    /// Integer leaf.
    #[must_use]
    pub const fn int() -> Self {
        Self::Scalar {
            kind: ScalarKind::Int,
        }
    }

    /// Float leaf.
    #[must_use]
    pub const fn float() -> Self {
        Self::Scalar {
            kind: ScalarKind::Float,
        }
    }

    /// Boolean leaf.
    #[must_use]
    pub const fn bool() -> Self {
        Self::Scalar {
            kind: ScalarKind::Bool,
        }
    }

    /// Borrow the named mapping, if this node is one.
    #[must_use]
    pub const fn as_named_mapping(&self) -> Option<&NamedMapping> {
        match self {
            Self::NamedMapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Short description of what the node expects, for messages.
    #[must_use]
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::Scalar { kind } => kind.as_str(),
            Self::NamedMapping(_) | Self::Permissive => "mapping",
        }
    }
}

impl From<NamedMapping> for SchemaNode {
    fn from(mapping: NamedMapping) -> Self {
        Self::NamedMapping(mapping)
    }
}

/// A schema node together with its optionality at the parent level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Shape of the field's value.
    pub node: SchemaNode,
    /// When true, the field may be absent.
    pub optional: bool,
}

impl FieldSpec {
    /// A field that must be present.
    pub fn required(node: impl Into<SchemaNode>) -> Self {
        Self {
            node: node.into(),
            optional: false,
        }
    }

    /// A field that may be absent.
    pub fn optional(node: impl Into<SchemaNode>) -> Self {
        Self {
            node: node.into(),
            optional: true,
        }
    }

    /// A field whose optionality is decided by the caller.
    pub fn new(node: impl Into<SchemaNode>, optional: bool) -> Self {
        Self {
            node: node.into(),
            optional,
        }
    }
}

/// Mapping node with a type name and ordered, uniquely named fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedMapping {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl NamedMapping {
    /// Start an empty mapping named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field. Re-declaring a name replaces the earlier spec in place.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        if let Some(slot) = self
            .fields
            .iter_mut()
            .find(|(existing, _)| *existing == name)
        {
            slot.1 = spec;
        } else {
            self.fields.push((name, spec));
        }
        self
    }

    /// Type name of the mapping.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Look up a declared field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    /// Returns true when `name` is declared.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
