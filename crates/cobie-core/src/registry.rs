//! Class registry: the arena of element and relationship class descriptors
//! the element tree refers to by name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ids::DYNAMIC_SCHEMA_NAME;
use crate::value::PrimitiveType;

/// Broad family of an element class. Decides whether the element is placed
/// in space and carries a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Physical,
    SpatialLocation,
    PhysicalType,
    GroupInformation,
    InformationRecord,
    Document,
}

impl ElementKind {
    /// Geometric elements get a placement and can grow the project extents.
    pub fn is_geometric(&self) -> bool {
        matches!(self, ElementKind::Physical | ElementKind::SpatialLocation)
    }
}

/// A base-class property filled from a source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedProperty {
    pub property: String,
    pub field: String,
    pub primitive: PrimitiveType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementClassDescriptor {
    pub name: String,
    pub table: String,
    pub kind: ElementKind,
    /// Source column copied to the element's user label.
    pub label_column: String,
    pub derived: Vec<DerivedProperty>,
}

impl ElementClassDescriptor {
    pub fn new(name: &str, kind: ElementKind) -> Self {
        Self {
            name: name.to_string(),
            table: name.to_string(),
            kind,
            label_column: "name".to_string(),
            derived: Vec::new(),
        }
    }

    pub fn with_derived(mut self, property: &str, field: &str, primitive: PrimitiveType) -> Self {
        self.derived.push(DerivedProperty {
            property: property.to_string(),
            field: field.to_string(),
            primitive,
        });
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}:{}", DYNAMIC_SCHEMA_NAME, self.name)
    }

    pub fn label_field(&self) -> String {
        format!("{}.{}", self.table, self.label_column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipClassDescriptor {
    pub name: String,
    /// Source table whose rows back the relationship instances.
    pub table: String,
}

impl RelationshipClassDescriptor {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}:{}", DYNAMIC_SCHEMA_NAME, self.name)
    }
}

/// Descriptors indexed by class name. Built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    elements: Vec<ElementClassDescriptor>,
    element_index: HashMap<String, usize>,
    relationships: Vec<RelationshipClassDescriptor>,
    relationship_index: HashMap<String, usize>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element class. A later registration under the same name
    /// replaces the earlier one.
    pub fn register_element(&mut self, descriptor: ElementClassDescriptor) {
        match self.element_index.get(&descriptor.name) {
            Some(&idx) => self.elements[idx] = descriptor,
            None => {
                self.element_index
                    .insert(descriptor.name.clone(), self.elements.len());
                self.elements.push(descriptor);
            }
        }
    }

    pub fn register_relationship(&mut self, descriptor: RelationshipClassDescriptor) {
        match self.relationship_index.get(&descriptor.name) {
            Some(&idx) => self.relationships[idx] = descriptor,
            None => {
                self.relationship_index
                    .insert(descriptor.name.clone(), self.relationships.len());
                self.relationships.push(descriptor);
            }
        }
    }

    pub fn element_class(&self, name: &str) -> CoreResult<&ElementClassDescriptor> {
        self.element_index
            .get(name)
            .map(|&idx| &self.elements[idx])
            .ok_or_else(|| CoreError::UnknownClass(name.to_string()))
    }

    pub fn relationship_class(&self, name: &str) -> CoreResult<&RelationshipClassDescriptor> {
        self.relationship_index
            .get(name)
            .map(|&idx| &self.relationships[idx])
            .ok_or_else(|| CoreError::UnknownRelationship(name.to_string()))
    }

    pub fn element_classes(&self) -> &[ElementClassDescriptor] {
        &self.elements
    }

    pub fn relationship_classes(&self) -> &[RelationshipClassDescriptor] {
        &self.relationships
    }

    /// The COBie class set.
    pub fn cobie() -> Self {
        use ElementKind::*;

        let mut registry = Self::new();
        for (name, kind) in [
            ("Assembly", InformationRecord),
            ("Attribute", InformationRecord),
            ("Component", Physical),
            ("Connection", InformationRecord),
            ("Contact", InformationRecord),
            ("Document", Document),
            ("Facility", SpatialLocation),
            ("Floor", SpatialLocation),
            ("Impact", InformationRecord),
            ("Issue", InformationRecord),
            ("Job", InformationRecord),
            ("Resource", InformationRecord),
            ("Spare", InformationRecord),
            ("System", GroupInformation),
            ("Type", PhysicalType),
            ("Zone", GroupInformation),
        ] {
            registry.register_element(ElementClassDescriptor::new(name, kind));
        }
        registry.register_element(
            ElementClassDescriptor::new("Space", SpatialLocation).with_derived(
                "footprintArea",
                "Space.grossarea",
                PrimitiveType::Double,
            ),
        );

        for (name, table) in [
            ("ComponentConnectsToComponent", "Connection"),
            ("ComponentAssemblesComponents", "Assembly"),
            ("SystemGroupsComponents", "System"),
            ("ZoneIncludesSpaces", "Zone"),
            ("FloorComposesSpaces", "Space"),
        ] {
            registry.register_relationship(RelationshipClassDescriptor::new(name, table));
        }

        registry
    }
}
