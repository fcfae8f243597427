//! Structural comparison of two schema versions.
//!
//! Versions are not compared. Two schemas with the same classes, base
//! classes, properties and relationship shapes are the same schema.

use std::fmt;

use cobie_core::PrimitiveType;

use crate::model::{DynamicSchema, EntityClassDef, RelationshipClassDef};

/// One structural difference between a candidate and an existing schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDiagnostic {
    ReferencesChanged,
    ClassAdded(String),
    ClassRemoved(String),
    BaseClassChanged {
        class: String,
        existing: String,
        candidate: String,
    },
    PropertyAdded {
        class: String,
        property: String,
    },
    PropertyRemoved {
        class: String,
        property: String,
    },
    PropertyTypeChanged {
        class: String,
        property: String,
        existing: PrimitiveType,
        candidate: PrimitiveType,
    },
    RelationshipAdded(String),
    RelationshipRemoved(String),
    RelationshipChanged {
        relationship: String,
        aspect: &'static str,
    },
}

impl fmt::Display for SchemaDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferencesChanged => f.write_str("referenced schemas changed"),
            Self::ClassAdded(c) => write!(f, "class {} added", c),
            Self::ClassRemoved(c) => write!(f, "class {} removed", c),
            Self::BaseClassChanged {
                class,
                existing,
                candidate,
            } => write!(f, "class {} base changed from {} to {}", class, existing, candidate),
            Self::PropertyAdded { class, property } => {
                write!(f, "property {}.{} added", class, property)
            }
            Self::PropertyRemoved { class, property } => {
                write!(f, "property {}.{} removed", class, property)
            }
            Self::PropertyTypeChanged {
                class,
                property,
                existing,
                candidate,
            } => write!(
                f,
                "property {}.{} type changed from {} to {}",
                class, property, existing, candidate
            ),
            Self::RelationshipAdded(r) => write!(f, "relationship {} added", r),
            Self::RelationshipRemoved(r) => write!(f, "relationship {} removed", r),
            Self::RelationshipChanged {
                relationship,
                aspect,
            } => write!(f, "relationship {} {} changed", relationship, aspect),
        }
    }
}

/// Every structural difference of `candidate` against `existing`.
pub fn compare(candidate: &DynamicSchema, existing: &DynamicSchema) -> Vec<SchemaDiagnostic> {
    let mut diagnostics = Vec::new();

    let mut existing_refs = existing.references.clone();
    let mut candidate_refs = candidate.references.clone();
    existing_refs.sort();
    candidate_refs.sort();
    if existing_refs != candidate_refs {
        diagnostics.push(SchemaDiagnostic::ReferencesChanged);
    }

    for class in &candidate.entity_classes {
        match existing.entity_class(&class.name) {
            Some(old) => compare_class(class, old, &mut diagnostics),
            None => diagnostics.push(SchemaDiagnostic::ClassAdded(class.name.clone())),
        }
    }
    for class in &existing.entity_classes {
        if candidate.entity_class(&class.name).is_none() {
            diagnostics.push(SchemaDiagnostic::ClassRemoved(class.name.clone()));
        }
    }

    for rel in &candidate.relationship_classes {
        match existing.relationship_class(&rel.name) {
            Some(old) => compare_relationship(rel, old, &mut diagnostics),
            None => diagnostics.push(SchemaDiagnostic::RelationshipAdded(rel.name.clone())),
        }
    }
    for rel in &existing.relationship_classes {
        if candidate.relationship_class(&rel.name).is_none() {
            diagnostics.push(SchemaDiagnostic::RelationshipRemoved(rel.name.clone()));
        }
    }

    diagnostics
}

fn compare_class(candidate: &EntityClassDef, existing: &EntityClassDef, out: &mut Vec<SchemaDiagnostic>) {
    if candidate.base_class != existing.base_class {
        out.push(SchemaDiagnostic::BaseClassChanged {
            class: candidate.name.clone(),
            existing: existing.base_class.clone(),
            candidate: candidate.base_class.clone(),
        });
    }

    for prop in &candidate.properties {
        match existing.property(&prop.name) {
            Some(old) if old.primitive != prop.primitive => {
                out.push(SchemaDiagnostic::PropertyTypeChanged {
                    class: candidate.name.clone(),
                    property: prop.name.clone(),
                    existing: old.primitive,
                    candidate: prop.primitive,
                })
            }
            Some(_) => {}
            None => out.push(SchemaDiagnostic::PropertyAdded {
                class: candidate.name.clone(),
                property: prop.name.clone(),
            }),
        }
    }
    for prop in &existing.properties {
        if candidate.property(&prop.name).is_none() {
            out.push(SchemaDiagnostic::PropertyRemoved {
                class: candidate.name.clone(),
                property: prop.name.clone(),
            });
        }
    }
}

fn compare_relationship(
    candidate: &RelationshipClassDef,
    existing: &RelationshipClassDef,
    out: &mut Vec<SchemaDiagnostic>,
) {
    let checks: [(&'static str, bool); 5] = [
        ("base class", candidate.base_class == existing.base_class),
        ("strength", candidate.strength == existing.strength),
        ("direction", candidate.direction == existing.direction),
        ("source constraint", candidate.source == existing.source),
        ("target constraint", candidate.target == existing.target),
    ];
    for (aspect, same) in checks {
        if !same {
            out.push(SchemaDiagnostic::RelationshipChanged {
                relationship: candidate.name.clone(),
                aspect,
            });
        }
    }
}
