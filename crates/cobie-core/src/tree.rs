//! Element tree: the declarative description of which models, categories,
//! element classes and relationship classes a run materializes.
//!
//! Classes are referenced by registry name only. A tree can be built in code
//! ([`ElementTree::cobie`]) or loaded from TOML:
//!
//! ```toml
//! subject = "COBie"
//!
//! [[models]]
//! name = "DefinitionModel1"
//! kind = "definition"
//!
//! [[models.nodes]]
//! node = "category"
//! name = "SpatialCategory1"
//! kind = "spatial"
//!
//! [[models.nodes]]
//! node = "element_class"
//! class = "Type"
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::registry::ClassRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Definition,
    Physical,
    SpatialLocation,
    InformationRecord,
    Group,
    DocumentList,
}

impl ModelKind {
    pub fn partition_class(&self) -> &'static str {
        match self {
            ModelKind::Definition => "BisCore:DefinitionPartition",
            ModelKind::Physical => "BisCore:PhysicalPartition",
            ModelKind::SpatialLocation => "BisCore:SpatialLocationPartition",
            ModelKind::InformationRecord => "BisCore:InformationRecordPartition",
            ModelKind::Group => "BisCore:GroupInformationPartition",
            ModelKind::DocumentList => "BisCore:DocumentPartition",
        }
    }

    pub fn model_class(&self) -> &'static str {
        match self {
            ModelKind::Definition => "BisCore:DefinitionModel",
            ModelKind::Physical => "BisCore:PhysicalModel",
            ModelKind::SpatialLocation => "BisCore:SpatialLocationModel",
            ModelKind::InformationRecord => "BisCore:InformationRecordModel",
            ModelKind::Group => "BisCore:GroupModel",
            ModelKind::DocumentList => "BisCore:DocumentListModel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Spatial,
    Drawing,
}

impl CategoryKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            CategoryKind::Spatial => "BisCore:SpatialCategory",
            CategoryKind::Drawing => "BisCore:DrawingCategory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTree {
    pub subject: String,
    #[serde(default)]
    pub models: Vec<ModelNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    pub kind: ModelKind,
    #[serde(default)]
    pub nodes: Vec<MappingNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum MappingNode {
    Category(CategoryNode),
    ElementClass(ElementClassNode),
    RelationshipClass(RelationshipClassNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementClassNode {
    pub class: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub type_definition: Option<TypeDefinitionSpec>,
}

/// Where to find the type element an element class links to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionSpec {
    pub class: String,
    pub model: String,
    /// Aliased source field holding the type's key value.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipClassNode {
    pub class: String,
    pub source: EndpointSpec,
    pub target: EndpointSpec,
    pub materialization: MaterializationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub class: String,
    pub model: String,
    pub key: String,
    /// Splits a multi-valued key field (e.g. comma separated names).
    #[serde(default)]
    pub separator: Option<char>,
}

/// How a relationship class is stored in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MaterializationKind {
    /// An independent relationship instance between two elements.
    LinkRecord,
    /// A navigation property on the target element pointing at the source.
    EmbeddedOwnership { navigation: String },
}

impl ModelNode {
    pub fn categories(&self) -> impl Iterator<Item = &CategoryNode> {
        self.nodes.iter().filter_map(|n| match n {
            MappingNode::Category(c) => Some(c),
            _ => None,
        })
    }

    pub fn element_classes(&self) -> impl Iterator<Item = &ElementClassNode> {
        self.nodes.iter().filter_map(|n| match n {
            MappingNode::ElementClass(e) => Some(e),
            _ => None,
        })
    }

    pub fn relationship_classes(&self) -> impl Iterator<Item = &RelationshipClassNode> {
        self.nodes.iter().filter_map(|n| match n {
            MappingNode::RelationshipClass(r) => Some(r),
            _ => None,
        })
    }
}

impl ElementTree {
    pub fn from_toml_str(input: &str) -> CoreResult<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Check every name the tree refers to against the registry and check
    /// that models, categories and type elements are declared before use.
    ///
    /// Within a model, categories are resolved first, then element classes in
    /// declared order, then relationship classes.
    pub fn validate(&self, registry: &ClassRegistry) -> CoreResult<()> {
        let mut models: HashSet<&str> = HashSet::new();
        let mut categories: HashSet<&str> = HashSet::new();

        for model in &self.models {
            if !models.insert(model.name.as_str()) {
                return Err(CoreError::invalid_tree(format!(
                    "model '{}' declared twice",
                    model.name
                )));
            }

            for category in model.categories() {
                if !categories.insert(category.name.as_str()) {
                    return Err(CoreError::invalid_tree(format!(
                        "category '{}' declared twice",
                        category.name
                    )));
                }
            }

            let mut classes_in_model: HashSet<&str> = HashSet::new();
            for element in model.element_classes() {
                registry.element_class(&element.class)?;

                if let Some(category) = &element.category {
                    if !categories.contains(category.as_str()) {
                        return Err(CoreError::invalid_tree(format!(
                            "element class '{}' uses category '{}' before it is declared",
                            element.class, category
                        )));
                    }
                }

                if let Some(td) = &element.type_definition {
                    registry.element_class(&td.class)?;
                    if !models.contains(td.model.as_str()) {
                        return Err(CoreError::invalid_tree(format!(
                            "type definition of '{}' refers to undeclared model '{}'",
                            element.class, td.model
                        )));
                    }
                    if td.model == model.name && !classes_in_model.contains(td.class.as_str()) {
                        return Err(CoreError::invalid_tree(format!(
                            "type class '{}' must come before '{}' in model '{}'",
                            td.class, element.class, model.name
                        )));
                    }
                }

                classes_in_model.insert(element.class.as_str());
            }

            for rel in model.relationship_classes() {
                registry.relationship_class(&rel.class)?;
                for endpoint in [&rel.source, &rel.target] {
                    registry.element_class(&endpoint.class)?;
                    if !models.contains(endpoint.model.as_str()) {
                        return Err(CoreError::invalid_tree(format!(
                            "relationship '{}' refers to undeclared model '{}'",
                            rel.class, endpoint.model
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// The default COBie mapping.
    pub fn cobie() -> Self {
        let spatial = || MappingNode::Category(CategoryNode {
            name: "SpatialCategory1".to_string(),
            kind: CategoryKind::Spatial,
        });

        Self {
            subject: "Subject1".to_string(),
            models: vec![
                ModelNode {
                    name: "DefinitionModel1".to_string(),
                    kind: ModelKind::Definition,
                    nodes: vec![spatial(), element("Type", None)],
                },
                ModelNode {
                    name: "PhysicalModel1".to_string(),
                    kind: ModelKind::Physical,
                    nodes: vec![
                        MappingNode::ElementClass(ElementClassNode {
                            class: "Component".to_string(),
                            category: Some("SpatialCategory1".to_string()),
                            type_definition: Some(TypeDefinitionSpec {
                                class: "Type".to_string(),
                                model: "DefinitionModel1".to_string(),
                                key: "Component.typename".to_string(),
                            }),
                        }),
                        link(
                            "ComponentConnectsToComponent",
                            endpoint("Component", "PhysicalModel1", "Connection.rowname1", None),
                            endpoint("Component", "PhysicalModel1", "Connection.rowname2", None),
                        ),
                        owned(
                            "ComponentAssemblesComponents",
                            endpoint("Component", "PhysicalModel1", "Assembly.parentname", None),
                            endpoint("Component", "PhysicalModel1", "Assembly.childnames", Some(',')),
                            "parent",
                        ),
                    ],
                },
                ModelNode {
                    name: "SpatialLocationModel1".to_string(),
                    kind: ModelKind::SpatialLocation,
                    nodes: vec![
                        element("Facility", Some("SpatialCategory1")),
                        element("Floor", Some("SpatialCategory1")),
                        element("Space", Some("SpatialCategory1")),
                        owned(
                            "FloorComposesSpaces",
                            endpoint("Floor", "SpatialLocationModel1", "Space.floorname", None),
                            endpoint("Space", "SpatialLocationModel1", "Space.name", None),
                            "composingElement",
                        ),
                    ],
                },
                ModelNode {
                    name: "InformationRecordModel1".to_string(),
                    kind: ModelKind::InformationRecord,
                    nodes: [
                        "Assembly",
                        "Attribute",
                        "Contact",
                        "Connection",
                        "Resource",
                        "Spare",
                        "Job",
                        "Issue",
                        "Impact",
                    ]
                    .into_iter()
                    .map(|class| element(class, None))
                    .collect(),
                },
                ModelNode {
                    name: "GroupInformationModel1".to_string(),
                    kind: ModelKind::Group,
                    nodes: vec![
                        element("Zone", None),
                        element("System", None),
                        link(
                            "ZoneIncludesSpaces",
                            endpoint("Zone", "GroupInformationModel1", "Zone.id", None),
                            endpoint("Space", "SpatialLocationModel1", "Zone.spacenames", Some(',')),
                        ),
                        link(
                            "SystemGroupsComponents",
                            endpoint("System", "GroupInformationModel1", "System.id", None),
                            endpoint("Component", "PhysicalModel1", "System.componentnames", Some(',')),
                        ),
                    ],
                },
                ModelNode {
                    name: "DocumentListModel1".to_string(),
                    kind: ModelKind::DocumentList,
                    nodes: vec![element("Document", None)],
                },
            ],
        }
    }
}

fn element(class: &str, category: Option<&str>) -> MappingNode {
    MappingNode::ElementClass(ElementClassNode {
        class: class.to_string(),
        category: category.map(String::from),
        type_definition: None,
    })
}

fn endpoint(class: &str, model: &str, key: &str, separator: Option<char>) -> EndpointSpec {
    EndpointSpec {
        class: class.to_string(),
        model: model.to_string(),
        key: key.to_string(),
        separator,
    }
}

fn link(class: &str, source: EndpointSpec, target: EndpointSpec) -> MappingNode {
    MappingNode::RelationshipClass(RelationshipClassNode {
        class: class.to_string(),
        source,
        target,
        materialization: MaterializationKind::LinkRecord,
    })
}

fn owned(class: &str, source: EndpointSpec, target: EndpointSpec, navigation: &str) -> MappingNode {
    MappingNode::RelationshipClass(RelationshipClassNode {
        class: class.to_string(),
        source,
        target,
        materialization: MaterializationKind::EmbeddedOwnership {
            navigation: navigation.to_string(),
        },
    })
}
