//! # COBie Schema
//!
//! Synthesizes the versioned dynamic schema from the source tables and the
//! static templates, compares it with the schema already in the repository,
//! and serializes it as a JSON schema document.

pub mod compare;
pub mod document;
pub mod error;
pub mod model;
pub mod synthesizer;
pub mod templates;

pub use compare::{compare, SchemaDiagnostic};
pub use document::DOCUMENT_FORMAT;
pub use error::{SchemaError, SchemaResult};
pub use model::{
    DynamicSchema, EntityClassDef, PropertyDef, RelationshipClassDef, RelationshipConstraint,
    SchemaVersion, Strength, StrengthDirection,
};
pub use synthesizer::{SchemaSyncResult, SchemaSynthesizer};
pub use templates::{column_name, property_name, property_type, SchemaTemplates};
