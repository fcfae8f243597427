//! Static schema templates: column rename and type maps, per-table entity
//! templates, and the fixed relationship classes.

use cobie_core::{PrimitiveType, DYNAMIC_SCHEMA_ALIAS, DYNAMIC_SCHEMA_NAME};

use crate::model::{
    EntityClassDef, RelationshipClassDef, RelationshipConstraint, Strength, StrengthDirection,
};

/// Columns whose names clash with base-class properties.
const RENAMES: &[(&str, &str)] = &[
    ("id", "rowid"),
    ("category", "cobiecategory"),
    ("name", "cobiename"),
];

/// Measurement and geometry properties. Everything else is a string.
const DOUBLE_PROPERTIES: &[&str] = &[
    "elevation",
    "height",
    "usableheight",
    "grossarea",
    "netarea",
    "nominallength",
    "nominalwidth",
    "nominalheight",
    "duration",
    "coordinatexaxis",
    "coordinateyaxis",
    "coordinatezaxis",
    "clockwiserotation",
    "elevationalrotation",
    "yawrotation",
];

/// Property name for a source column.
pub fn property_name(column: &str) -> &str {
    RENAMES
        .iter()
        .find(|(from, _)| *from == column)
        .map(|(_, to)| *to)
        .unwrap_or(column)
}

/// Source column for a property name; inverse of [`property_name`].
pub fn column_name(property: &str) -> &str {
    RENAMES
        .iter()
        .find(|(_, to)| *to == property)
        .map(|(from, _)| *from)
        .unwrap_or(property)
}

pub fn property_type(property: &str) -> PrimitiveType {
    if DOUBLE_PROPERTIES.contains(&property) {
        PrimitiveType::Double
    } else {
        PrimitiveType::String
    }
}

/// Split `Schema:Class` into its parts.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once(':')
}

/// Everything the synthesizer needs besides the source metadata.
#[derive(Debug, Clone)]
pub struct SchemaTemplates {
    pub schema_name: String,
    pub alias: String,
    pub references: Vec<String>,
    /// Abstract classes defined inside the dynamic schema itself.
    pub base_entities: Vec<EntityClassDef>,
    /// Entity template per source table, in lookup order.
    pub entities: Vec<EntityClassDef>,
    pub relationships: Vec<RelationshipClassDef>,
}

impl SchemaTemplates {
    pub fn entity_for_table(&self, table: &str) -> Option<&EntityClassDef> {
        self.entities.iter().find(|e| e.name == table)
    }

    pub fn cobie() -> Self {
        let entities = [
            ("Assembly", "BisCore:InformationRecordElement"),
            ("Attribute", "BisCore:InformationRecordElement"),
            ("Component", "BisCore:PhysicalElement"),
            ("Connection", "BisCore:InformationRecordElement"),
            ("Contact", "BisCore:InformationRecordElement"),
            ("Document", "BisCore:Document"),
            ("Facility", "BuildingSpatial:Building"),
            ("Floor", "BuildingSpatial:RegularStory"),
            ("Impact", "BisCore:InformationRecordElement"),
            ("Issue", "BisCore:InformationRecordElement"),
            ("Spare", "BisCore:InformationRecordElement"),
            ("Job", "BisCore:InformationRecordElement"),
            ("Resource", "BisCore:InformationRecordElement"),
            ("Space", "BuildingSpatial:Space"),
            ("System", "BisCore:GroupInformationElement"),
            ("Type", "BisCore:PhysicalType"),
            ("Zone", "BisCore:GroupInformationElement"),
        ]
        .into_iter()
        .map(|(name, base)| EntityClassDef::new(name, base))
        .collect();

        Self {
            schema_name: DYNAMIC_SCHEMA_NAME.to_string(),
            alias: DYNAMIC_SCHEMA_ALIAS.to_string(),
            references: ["BisCore", "Functional", "BuildingSpatial", "SpatialComposition"]
                .into_iter()
                .map(String::from)
                .collect(),
            base_entities: Vec::new(),
            entities,
            relationships: cobie_relationships(),
        }
    }
}

fn constraint(multiplicity: &str, role: &str, abstract_class: &str, class: &str) -> RelationshipConstraint {
    RelationshipConstraint {
        polymorphic: true,
        multiplicity: multiplicity.to_string(),
        role_label: role.to_string(),
        abstract_constraint: abstract_class.to_string(),
        constraint_classes: vec![format!("{}:{}", DYNAMIC_SCHEMA_NAME, class)],
    }
}

fn relationship(
    name: &str,
    base: &str,
    strength: Strength,
    source: RelationshipConstraint,
    target: RelationshipConstraint,
) -> RelationshipClassDef {
    RelationshipClassDef {
        name: name.to_string(),
        base_class: base.to_string(),
        strength,
        direction: StrengthDirection::Forward,
        source,
        target,
    }
}

fn cobie_relationships() -> Vec<RelationshipClassDef> {
    vec![
        relationship(
            "ComponentConnectsToComponent",
            "BisCore:ElementRefersToElements",
            Strength::Referencing,
            constraint("(0..*)", "From Component", "BisCore:PhysicalElement", "Component"),
            constraint("(0..*)", "To Component", "BisCore:PhysicalElement", "Component"),
        ),
        relationship(
            "ComponentAssemblesComponents",
            "BisCore:PhysicalElementAssemblesElements",
            Strength::Embedding,
            constraint("(0..1)", "assembles", "BisCore:PhysicalElement", "Component"),
            constraint("(0..*)", "is assembled by", "BisCore:PhysicalElement", "Component"),
        ),
        relationship(
            "SystemGroupsComponents",
            "BisCore:ElementGroupsMembers",
            Strength::Referencing,
            constraint("(0..*)", "System", "BisCore:GroupInformationElement", "System"),
            constraint("(0..*)", "Physical Component", "BisCore:PhysicalElement", "Component"),
        ),
        relationship(
            "ZoneIncludesSpaces",
            "BisCore:ElementGroupsMembers",
            Strength::Referencing,
            constraint("(0..*)", "Zone", "BisCore:GroupInformationElement", "Zone"),
            constraint("(0..*)", "Spaces", "BisCore:SpatialLocationElement", "Space"),
        ),
        relationship(
            "FloorComposesSpaces",
            "SpatialComposition:CompositeComposesSubComposites",
            Strength::Embedding,
            constraint("(0..1)", "is composed by", "SpatialComposition:CompositeElement", "Floor"),
            constraint("(0..*)", "composes", "SpatialComposition:CompositeElement", "Space"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_round_trip() {
        assert_eq!(property_name("id"), "rowid");
        assert_eq!(property_name("name"), "cobiename");
        assert_eq!(property_name("floorname"), "floorname");
        assert_eq!(column_name("cobiecategory"), "category");
        assert_eq!(column_name("grossarea"), "grossarea");
    }

    #[test]
    fn test_measurement_columns_are_double() {
        assert_eq!(property_type("grossarea"), PrimitiveType::Double);
        assert_eq!(property_type("coordinatezaxis"), PrimitiveType::Double);
        assert_eq!(property_type("cobiename"), PrimitiveType::String);
    }

    #[test]
    fn test_cobie_templates() {
        let templates = SchemaTemplates::cobie();
        assert_eq!(templates.entities.len(), 17);
        assert_eq!(
            templates.entity_for_table("Floor").map(|e| e.base_class.as_str()),
            Some("BuildingSpatial:RegularStory")
        );
        assert!(templates.entity_for_table("Coordinate").is_none());
        assert_eq!(templates.relationships.len(), 5);
        assert_eq!(split_qualified("BisCore:Document"), Some(("BisCore", "Document")));
    }
}
