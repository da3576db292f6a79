//! Recursive validation of config documents against a schema.
//!
//! Validation never stops at the first problem: every error found while
//! walking the document is collected with its field path so a user can fix a
//! whole file in one pass.

use crate::schema::{FieldSpec, NamedMapping, SchemaNode};
use crate::value::{ConfigMapping, ConfigValue, ValueKind};
use serde::{Serialize, Serializer};
use std::fmt;

/// Dotted location of a value inside a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true for the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_owned());
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return formatter.write_str("<root>");
        }
        formatter.write_str(&self.0.join("."))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What went wrong at a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConfigErrorKind {
    /// A required field is absent (or null).
    MissingRequiredField,
    /// The value has the wrong type.
    TypeMismatch {
        /// What the schema expects.
        expected: &'static str,
        /// What the document holds.
        actual: ValueKind,
    },
    /// The key is not declared by the enclosing mapping.
    UnknownField,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigError {
    /// Location of the offending value.
    pub path: FieldPath,
    /// Error classification.
    #[serde(flatten)]
    pub kind: ConfigErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Outcome of validating a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The document conforms; holds the validated tree.
    Success(ConfigValue),
    /// The document does not conform; holds every error found (never empty).
    Failure(Vec<ConfigError>),
}

impl ValidationResult {
    /// Returns true on success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Validated tree, on success.
    #[must_use]
    pub const fn value(&self) -> Option<&ConfigValue> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Errors found (empty on success).
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        match self {
            Self::Success(_) => &[],
            Self::Failure(errors) => errors,
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<ConfigValue, Vec<ConfigError>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(errors) => Err(errors),
        }
    }
}

/// Validate `document` against `schema`.
///
/// A null document at the root is read as an empty mapping. Optional fields
/// that are absent (or null) are left out of the validated tree and their
/// descendants are not checked.
#[must_use]
pub fn validate(schema: &SchemaNode, document: &ConfigValue) -> ValidationResult {
    let empty = ConfigValue::empty_mapping();
    let document = if document.is_null() && !matches!(schema, SchemaNode::Scalar { .. }) {
        &empty
    } else {
        document
    };

    let mut walker = Walker::default();
    let value = walker.node(schema, document, &FieldPath::root());

    match value {
        Some(value) if walker.errors.is_empty() => ValidationResult::Success(value),
        _ => ValidationResult::Failure(walker.errors),
    }
}

#[derive(Default)]
struct Walker {
    errors: Vec<ConfigError>,
}

impl Walker {
    fn node(
        &mut self,
        node: &SchemaNode,
        value: &ConfigValue,
        path: &FieldPath,
    ) -> Option<ConfigValue> {
        match node {
            SchemaNode::Scalar { kind } => {
                if kind.accepts(value) {
                    Some(value.clone())
                } else {
                    self.type_mismatch(path, kind.as_str(), value);
                    None
                }
            },
            SchemaNode::Permissive => {
                if value.as_mapping().is_some() {
                    Some(value.clone())
                } else {
                    self.type_mismatch(path, node.expected(), value);
                    None
                }
            },
            SchemaNode::NamedMapping(mapping) => {
                let Some(document) = value.as_mapping() else {
                    self.type_mismatch(path, node.expected(), value);
                    return None;
                };
                Some(ConfigValue::Mapping(self.mapping(mapping, document, path)))
            },
        }
    }

    fn mapping(
        &mut self,
        mapping: &NamedMapping,
        document: &ConfigMapping,
        path: &FieldPath,
    ) -> ConfigMapping {
        for key in document.keys().filter(|key| !mapping.declares(key)) {
            self.errors.push(ConfigError {
                path: path.child(key),
                kind: ConfigErrorKind::UnknownField,
                message: format!("field \"{key}\" is not defined on {}", mapping.name()),
            });
        }

        let mut validated = ConfigMapping::new();
        for (name, spec) in mapping.fields() {
            let field_path = path.child(name);
            match document.get(name).filter(|value| !value.is_null()) {
                None => self.absent(mapping, name, spec, field_path),
                Some(value) => {
                    if let Some(value) = self.node(&spec.node, value, &field_path) {
                        validated.insert(name.to_owned(), value);
                    }
                },
            }
        }
        validated
    }

    fn absent(&mut self, mapping: &NamedMapping, name: &str, spec: &FieldSpec, path: FieldPath) {
        if spec.optional {
            return;
        }
        self.errors.push(ConfigError {
            path,
            kind: ConfigErrorKind::MissingRequiredField,
            message: format!(
                "missing required field \"{name}\" ({}) on {}",
                spec.node.expected(),
                mapping.name()
            ),
        });
    }

    fn type_mismatch(&mut self, path: &FieldPath, expected: &'static str, value: &ConfigValue) {
        let actual = value.kind();
        self.errors.push(ConfigError {
            path: path.clone(),
            kind: ConfigErrorKind::TypeMismatch { expected, actual },
            message: format!("expected {expected}, found {actual}"),
        });
    }
}
