//! COBie Sync Core Library
//!
//! Value types, identifiers, geometry and the static mapping configuration
//! (class registry and element tree) shared by the source reader, the schema
//! synthesizer and the alignment engine.

pub mod error;
pub mod geometry;
pub mod ids;
pub mod registry;
pub mod tree;
pub mod value;

pub use error::{CoreError, CoreResult};
pub use geometry::{Placement3d, Point3d, Range3d, YawPitchRoll};
pub use ids::{Code, ElementId, ItemState, CODE_SPEC_NAME, DYNAMIC_SCHEMA_ALIAS, DYNAMIC_SCHEMA_NAME};
pub use registry::{ClassRegistry, DerivedProperty, ElementClassDescriptor, ElementKind, RelationshipClassDescriptor};
pub use tree::{
    CategoryKind, CategoryNode, ElementClassNode, ElementTree, EndpointSpec, MappingNode,
    MaterializationKind, ModelKind, ModelNode, RelationshipClassNode, TypeDefinitionSpec,
};
pub use value::{FieldValue, PrimitiveType, Row};
