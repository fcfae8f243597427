//! Dynamic schema model.
//!
//! A [`DynamicSchema`] is produced whole by the synthesizer and never edited
//! afterwards; a new version supersedes it.

use std::fmt;

use serde::{Deserialize, Serialize};

use cobie_core::PrimitiveType;

/// `major.minor.patch` schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub const INITIAL: SchemaVersion = SchemaVersion::new(1, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Version used when regenerating after a structural change.
    pub fn next_minor(&self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub primitive: PrimitiveType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityClassDef {
    pub name: String,
    pub base_class: String,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
}

impl EntityClassDef {
    pub fn new(name: &str, base_class: &str) -> Self {
        Self {
            name: name.to_string(),
            base_class: base_class.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Referencing,
    Holding,
    Embedding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthDirection {
    Forward,
    Backward,
}

/// One end of a relationship class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConstraint {
    pub polymorphic: bool,
    /// e.g. `(0..*)`
    pub multiplicity: String,
    pub role_label: String,
    pub abstract_constraint: String,
    pub constraint_classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipClassDef {
    pub name: String,
    pub base_class: String,
    pub strength: Strength,
    pub direction: StrengthDirection,
    pub source: RelationshipConstraint,
    pub target: RelationshipConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSchema {
    pub name: String,
    pub alias: String,
    pub version: SchemaVersion,
    /// Names of the base schemas this one builds on.
    pub references: Vec<String>,
    pub entity_classes: Vec<EntityClassDef>,
    pub relationship_classes: Vec<RelationshipClassDef>,
}

impl DynamicSchema {
    pub fn entity_class(&self, name: &str) -> Option<&EntityClassDef> {
        self.entity_classes.iter().find(|c| c.name == name)
    }

    pub fn relationship_class(&self, name: &str) -> Option<&RelationshipClassDef> {
        self.relationship_classes.iter().find(|c| c.name == name)
    }

    pub fn references_schema(&self, schema: &str) -> bool {
        schema == self.name || self.references.iter().any(|r| r == schema)
    }

    /// Qualified class name, `<schema>:<class>`.
    pub fn full_name(&self, class: &str) -> String {
        format!("{}:{}", self.name, class)
    }

    pub(crate) fn with_version(mut self, version: SchemaVersion) -> Self {
        self.version = version;
        self
    }
}
