//! # Schema Identity
//!
//! A [`SchemaName`] is the file stem of a schema document in the schema
//! directory (`<schema_path>/<name>.json`).
//!
//! ## Security Invariant
//!
//! Names arrive from URL path segments (`/schemas/{schema_id}`). The
//! validated constructor rejects separators and `..` so a name can never
//! resolve outside the schema directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HyperSchemaError;

/// Validated schema identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a schema name.
    ///
    /// Allowed: ASCII alphanumerics, `-`, `_`, `.`; must not start with `.`
    /// and must not contain `..`.
    pub fn new(name: impl Into<String>) -> Result<Self, HyperSchemaError> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.starts_with('.') {
            Some("must not start with '.'")
        } else if name.contains("..") {
            Some("must not contain '..'")
        } else if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            Some("only ASCII letters, digits, '-', '_' and '.' are allowed")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(HyperSchemaError::InvalidSchemaName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the backing schema document.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SchemaName {
    type Err = HyperSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SchemaName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchemaName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
