//! JSON schema document: the persisted, self-describing form of a
//! [`DynamicSchema`].

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::model::DynamicSchema;

/// Format tag written into every document.
pub const DOCUMENT_FORMAT: &str = "cobie-dynamic-schema/1";

#[derive(Serialize)]
struct DocumentOut<'a> {
    format: &'a str,
    #[serde(flatten)]
    schema: &'a DynamicSchema,
}

#[derive(Deserialize)]
struct DocumentIn {
    format: String,
    #[serde(flatten)]
    schema: DynamicSchema,
}

impl DynamicSchema {
    pub fn to_document(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string_pretty(&DocumentOut {
            format: DOCUMENT_FORMAT,
            schema: self,
        })?)
    }

    pub fn from_document(document: &str) -> SchemaResult<Self> {
        let parsed: DocumentIn = serde_json::from_str(document)?;
        if parsed.format != DOCUMENT_FORMAT {
            return Err(SchemaError::InvalidDocument(format!(
                "unsupported format '{}'",
                parsed.format
            )));
        }
        Ok(parsed.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityClassDef, SchemaVersion};
    use crate::templates::SchemaTemplates;

    fn sample() -> DynamicSchema {
        let templates = SchemaTemplates::cobie();
        DynamicSchema {
            name: templates.schema_name.clone(),
            alias: templates.alias.clone(),
            version: SchemaVersion::new(1, 2, 0),
            references: templates.references.clone(),
            entity_classes: vec![EntityClassDef::new("Zone", "BisCore:GroupInformationElement")],
            relationship_classes: templates.relationships.clone(),
        }
    }

    #[test]
    fn test_document_is_self_describing() {
        let doc = sample().to_document().unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["format"], DOCUMENT_FORMAT);
        assert_eq!(value["alias"], "cbd");
        assert_eq!(value["version"]["minor"], 2);
        assert_eq!(value["relationship_classes"][4]["strength"], "Embedding");
        assert_eq!(DynamicSchema::from_document(&doc).unwrap(), sample());
    }

    #[test]
    fn test_rejects_foreign_format() {
        let doc = sample()
            .to_document()
            .unwrap()
            .replace(DOCUMENT_FORMAT, "ecschema-xml");
        assert!(matches!(
            DynamicSchema::from_document(&doc),
            Err(SchemaError::InvalidDocument(_))
        ));
        assert!(matches!(
            DynamicSchema::from_document("{}"),
            Err(SchemaError::Json(_))
        ));
    }
}
