//! Plugin configuration values and the publish target payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed plugin configuration value.
///
/// Deserialised untagged, so plain JSON literals map onto the matching
/// variant.  Integers are tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Opaque key → value plugin configuration.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// Where a publish step sends its metrics.
///
/// Fixed when the step tree is built and copied into every publish job the
/// step produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishTarget {
    /// Publisher plugin name, e.g. `file`.
    pub name: String,
    pub version: i32,
    pub content_type: String,
    #[serde(default)]
    pub config: ConfigMap,
}

impl PublishTarget {
    pub fn new(
        name: impl Into<String>,
        version: i32,
        content_type: impl Into<String>,
        config: ConfigMap,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            content_type: content_type.into(),
            config,
        }
    }

    /// A string-typed config entry, if present.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.config.get(key) {
            Some(ConfigValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
