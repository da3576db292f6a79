//! Loosely typed config documents.
//!
//! `ConfigValue` is the tree a YAML file (or a JSON overrides blob) is loaded
//! into before validation. It is also what the validator hands back, and what a
//! permissive `config` block carries to the pluggable class that owns it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Mapping node of a config document.
pub type ConfigMapping = BTreeMap<String, ConfigValue>;

/// A loaded config document or sub-document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Explicit null, or an empty YAML value.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence.
    Sequence(Vec<ConfigValue>),
    /// String-keyed mapping.
    Mapping(ConfigMapping),
}

/// Type tags used in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `null`
    Null,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// `sequence`
    Sequence,
    /// `mapping`
    Mapping,
}

impl ValueKind {
    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl ConfigValue {
    /// An empty mapping.
    #[must_use]
    pub const fn empty_mapping() -> Self {
        Self::Mapping(BTreeMap::new())
    }

    /// Build a mapping from key/value pairs.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Type tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Returns true for [`ConfigValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the mapping, if this is one.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&ConfigMapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Borrow the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer value, if this is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Look up `key` when this is a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_mapping().and_then(|mapping| mapping.get(key))
    }

    /// Follow a dotted path of mapping keys.
    #[must_use]
    pub fn pointer(&self, dotted: &str) -> Option<&Self> {
        dotted
            .split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// An integer literal that does not fit in an `i64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerOutOfRange {
    /// The literal as written in the source document.
    pub literal: String,
}

impl fmt::Display for IntegerOutOfRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "integer {} does not fit in a signed 64-bit value",
            self.literal
        )
    }
}

impl std::error::Error for IntegerOutOfRange {}

impl TryFrom<serde_json::Value> for ConfigValue {
    type Error = IntegerOutOfRange;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(value), _) => Self::Int(value),
                (None, Some(value)) if number.is_f64() => Self::Float(value),
                _ => {
                    return Err(IntegerOutOfRange {
                        literal: number.to_string(),
                    });
                },
            },
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::Sequence(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => Self::Mapping(
                fields
                    .into_iter()
                    .map(|(key, value)| Ok((key, Self::try_from(value)?)))
                    .collect::<Result<_, IntegerOutOfRange>>()?,
            ),
        })
    }
}

impl TryFrom<serde_yaml_ng::Value> for ConfigValue {
    type Error = IntegerOutOfRange;

    fn try_from(value: serde_yaml_ng::Value) -> Result<Self, Self::Error> {
        use serde_yaml_ng::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(value), _) => Self::Int(value),
                (None, Some(value)) if number.is_f64() => Self::Float(value),
                _ => {
                    return Err(IntegerOutOfRange {
                        literal: number.to_string(),
                    });
                },
            },
            Value::String(value) => Self::String(value),
            Value::Sequence(items) => Self::Sequence(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Mapping(fields) => Self::Mapping(
                fields
                    .into_iter()
                    .map(|(key, value)| Ok((yaml_key(key), Self::try_from(value)?)))
                    .collect::<Result<_, IntegerOutOfRange>>()?,
            ),
            Value::Tagged(tagged) => Self::try_from(tagged.value)?,
        })
    }
}

// Non-string YAML keys (`1: a`, `true: b`) are kept under their scalar text.
fn yaml_key(key: serde_yaml_ng::Value) -> String {
    use serde_yaml_ng::Value;

    match key {
        Value::String(key) => key,
        Value::Null => "null".to_owned(),
        Value::Bool(value) => value.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Tagged(tagged) => yaml_key(tagged.value),
        other @ (Value::Sequence(_) | Value::Mapping(_)) => {
            serde_yaml_ng::to_string(&other).map_or_else(
                |_| String::from("<unrepresentable key>"),
                |text| text.trim_end().to_owned(),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn yaml_documents_convert_with_stringified_keys() -> Result<(), Box<dyn Error>> {
        let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(
            "run_storage:\n  module: m\n  class: C\n  config:\n    1: one\n    ratio: 0.5\n",
        )?;
        let value = ConfigValue::try_from(yaml)?;

        assert_eq!(
            value.pointer("run_storage.module").and_then(ConfigValue::as_str),
            Some("m")
        );
        assert_eq!(
            value.pointer("run_storage.config.1").and_then(ConfigValue::as_str),
            Some("one")
        );
        assert_eq!(
            value.pointer("run_storage.config.ratio"),
            Some(&ConfigValue::Float(0.5))
        );
        Ok(())
    }

    #[test]
    fn json_round_trips_through_config_value() -> Result<(), Box<dyn Error>> {
        let json = serde_json::json!({"a": [1, "two", null, true], "b": {"c": 2.5}});
        let value = ConfigValue::try_from(json.clone())?;
        assert_eq!(value.pointer("a").map(ConfigValue::kind), Some(ValueKind::Sequence));
        assert_eq!(serde_json::to_value(&value)?, json);
        Ok(())
    }

    #[test]
    fn integers_beyond_i64_are_reported() -> Result<(), Box<dyn Error>> {
        let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str("limit: 18446744073709551615\n")?;
        assert_eq!(
            ConfigValue::try_from(yaml),
            Err(IntegerOutOfRange {
                literal: "18446744073709551615".to_owned()
            })
        );

        let json: serde_json::Value = serde_json::from_str(r#"{"a": [18446744073709551615]}"#)?;
        assert!(ConfigValue::try_from(json).is_err());

        let float: serde_yaml_ng::Value = serde_yaml_ng::from_str("2.5")?;
        assert_eq!(ConfigValue::try_from(float)?, ConfigValue::Float(2.5));
        Ok(())
    }

    #[test]
    fn non_finite_yaml_floats_are_kept() -> Result<(), Box<dyn Error>> {
        let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str("ratio: .inf\n")?;
        let value = ConfigValue::try_from(yaml)?;
        assert_eq!(value.get("ratio"), Some(&ConfigValue::Float(f64::INFINITY)));
        Ok(())
    }

    #[test]
    fn untagged_serialization_prints_plain_json() -> Result<(), Box<dyn Error>> {
        let value = ConfigValue::mapping([
            ("max_concurrent_runs", ConfigValue::Int(4)),
            ("name", ConfigValue::from("local")),
        ]);
        let text = serde_json::to_string(&value)?;
        assert_eq!(text, r#"{"max_concurrent_runs":4,"name":"local"}"#);
        Ok(())
    }
}
