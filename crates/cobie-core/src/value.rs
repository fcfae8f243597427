//! Typed field values and source rows.
//!
//! Rows come out of the source reader as ordered `(name, value)` pairs where
//! every name is aliased `<table>.<column>`. The canonical JSON form of a row
//! keeps that order, so two rows with the same fields in the same order always
//! produce the same content hash.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

/// Primitive property types a dynamic schema property can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "boolean")]
    Boolean,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Double => "double",
            PrimitiveType::Integer => "int",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value read from the source or written to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Render the value the way it appears inside a code value.
    ///
    /// Returns `None` for nulls and empty text so callers can treat a blank
    /// foreign key the same as a missing one.
    pub fn as_key(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) if s.is_empty() => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Double(d) => Some(d.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Coerce the value to the given primitive type.
    ///
    /// Empty text is read as null for every non-string type.
    pub fn coerce(&self, ty: PrimitiveType) -> CoreResult<FieldValue> {
        let mismatch = || CoreError::ValueType {
            value: self.to_string(),
            expected: ty,
        };

        let coerced = match (ty, self) {
            (_, FieldValue::Null) => FieldValue::Null,
            (PrimitiveType::String, FieldValue::Text(s)) => FieldValue::Text(s.clone()),
            (PrimitiveType::String, other) => FieldValue::Text(other.to_string()),
            (_, FieldValue::Text(s)) if s.trim().is_empty() => FieldValue::Null,

            (PrimitiveType::Double, FieldValue::Double(d)) => FieldValue::Double(*d),
            (PrimitiveType::Double, FieldValue::Integer(i)) => FieldValue::Double(*i as f64),
            (PrimitiveType::Double, FieldValue::Text(s)) => {
                FieldValue::Double(s.trim().parse().map_err(|_| mismatch())?)
            }

            (PrimitiveType::Integer, FieldValue::Integer(i)) => FieldValue::Integer(*i),
            (PrimitiveType::Integer, FieldValue::Double(d)) if d.fract() == 0.0 => {
                FieldValue::Integer(*d as i64)
            }
            (PrimitiveType::Integer, FieldValue::Text(s)) => {
                FieldValue::Integer(s.trim().parse().map_err(|_| mismatch())?)
            }

            (PrimitiveType::Boolean, FieldValue::Boolean(b)) => FieldValue::Boolean(*b),
            (PrimitiveType::Boolean, FieldValue::Integer(0)) => FieldValue::Boolean(false),
            (PrimitiveType::Boolean, FieldValue::Integer(1)) => FieldValue::Boolean(true),
            (PrimitiveType::Boolean, FieldValue::Text(s)) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "1" => FieldValue::Boolean(true),
                    "false" | "no" | "0" => FieldValue::Boolean(false),
                    _ => return Err(mismatch()),
                }
            }

            _ => return Err(mismatch()),
        };

        Ok(coerced)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Double(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One joined source row: ordered, aliased fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Look up a field by its aliased name. Missing fields read as null.
    pub fn get(&self, name: &str) -> &FieldValue {
        const NULL: &FieldValue = &FieldValue::Null;
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or(NULL)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical serialized form: a JSON object in field order.
    pub fn to_canonical_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// SHA-256 over the canonical form, lowercase hex.
    pub fn checksum(&self) -> CoreResult<String> {
        let canonical = self.to_canonical_json()?;
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(format!("{:x}", digest))
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl FromIterator<(String, FieldValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
