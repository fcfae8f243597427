//! Dynamic schema synthesis from source metadata.

use tracing::{debug, info};

use cobie_core::ItemState;
use cobie_source::SourceReader;

use crate::compare::{compare, SchemaDiagnostic};
use crate::error::{SchemaError, SchemaResult};
use crate::model::{DynamicSchema, EntityClassDef, PropertyDef, SchemaVersion};
use crate::templates::{property_name, property_type, split_qualified, SchemaTemplates};

/// Outcome of a schema synchronization.
#[derive(Debug, Clone)]
pub struct SchemaSyncResult {
    pub state: ItemState,
    pub schema: DynamicSchema,
    /// Differences that caused a `Changed` state; empty otherwise.
    pub diagnostics: Vec<SchemaDiagnostic>,
}

pub struct SchemaSynthesizer<'a> {
    reader: &'a SourceReader,
    templates: &'a SchemaTemplates,
}

impl<'a> SchemaSynthesizer<'a> {
    pub fn new(reader: &'a SourceReader, templates: &'a SchemaTemplates) -> Self {
        Self { reader, templates }
    }

    /// Synthesize the schema the source currently describes and classify it
    /// against `existing`.
    ///
    /// An unchanged schema hands back `existing` itself. A changed one comes
    /// back with `existing`'s minor version bumped.
    pub fn synthesize(&self, existing: Option<&DynamicSchema>) -> SchemaResult<SchemaSyncResult> {
        let candidate = self.build_candidate(SchemaVersion::INITIAL)?;

        let Some(existing) = existing else {
            info!(version = %candidate.version, "Synthesized new dynamic schema");
            return Ok(SchemaSyncResult {
                state: ItemState::New,
                schema: candidate,
                diagnostics: Vec::new(),
            });
        };

        let diagnostics = compare(&candidate, existing);
        if diagnostics.is_empty() {
            info!(version = %existing.version, "Dynamic schema unchanged");
            return Ok(SchemaSyncResult {
                state: ItemState::Unchanged,
                schema: existing.clone(),
                diagnostics,
            });
        }

        for diagnostic in &diagnostics {
            debug!(%diagnostic, "Schema difference");
        }
        let version = existing.version.next_minor();
        info!(
            from = %existing.version,
            to = %version,
            differences = diagnostics.len(),
            "Dynamic schema changed"
        );

        Ok(SchemaSyncResult {
            state: ItemState::Changed,
            schema: candidate.with_version(version),
            diagnostics,
        })
    }

    /// Build the schema for the current source at `version`.
    pub fn build_candidate(&self, version: SchemaVersion) -> SchemaResult<DynamicSchema> {
        let templates = self.templates;
        let mut schema = DynamicSchema {
            name: templates.schema_name.clone(),
            alias: templates.alias.clone(),
            version,
            references: templates.references.clone(),
            entity_classes: Vec::new(),
            relationship_classes: Vec::new(),
        };

        for base in &templates.base_entities {
            self.check_base_class(&schema, base)?;
            schema.entity_classes.push(base.clone());
        }

        for table in self.reader.list_tables()? {
            let Some(template) = templates.entity_for_table(&table.name) else {
                debug!(table = %table.name, "No entity template, table skipped");
                continue;
            };
            self.check_base_class(&schema, template)?;

            let mut class = template.clone();
            for column in self.reader.list_columns(&table.name)? {
                let name = property_name(&column.name);
                class.properties.push(PropertyDef {
                    name: name.to_string(),
                    primitive: property_type(name),
                });
            }
            schema.entity_classes.push(class);
        }

        for rel in &templates.relationships {
            for class in rel
                .source
                .constraint_classes
                .iter()
                .chain(&rel.target.constraint_classes)
            {
                if !self.class_available(&schema, class) {
                    return Err(SchemaError::MissingConstraintClass {
                        relationship: rel.name.clone(),
                        class: class.clone(),
                    });
                }
            }
            schema.relationship_classes.push(rel.clone());
        }

        Ok(schema)
    }

    fn check_base_class(&self, schema: &DynamicSchema, class: &EntityClassDef) -> SchemaResult<()> {
        let base = match split_qualified(&class.base_class) {
            Some((owner, name)) if owner == schema.name => {
                self.templates.base_entities.iter().any(|b| b.name == name)
            }
            Some((owner, _)) => schema.references_schema(owner),
            None => false,
        };
        if base {
            Ok(())
        } else {
            Err(SchemaError::MissingTemplate {
                class: class.name.clone(),
                base_class: class.base_class.clone(),
            })
        }
    }

    fn class_available(&self, schema: &DynamicSchema, qualified: &str) -> bool {
        match split_qualified(qualified) {
            Some((owner, name)) if owner == schema.name => schema.entity_class(name).is_some(),
            Some((owner, _)) => schema.references_schema(owner),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobie_core::PrimitiveType;
    use cobie_source::{JoinMap, SourcePool};

    fn reader(extra: &str) -> SourceReader {
        let pool = SourcePool::in_memory().unwrap();
        let ddl = format!(
            "CREATE TABLE Floor (id INTEGER PRIMARY KEY, name TEXT, elevation TEXT);
             CREATE TABLE Space (id INTEGER PRIMARY KEY, name TEXT, category TEXT, floorname TEXT, grossarea TEXT);
             CREATE TABLE Component (id INTEGER PRIMARY KEY, name TEXT, typename TEXT);
             CREATE TABLE System (id INTEGER PRIMARY KEY, name TEXT, componentnames TEXT);
             CREATE TABLE Coordinate (id INTEGER PRIMARY KEY, name TEXT, coordinatexaxis TEXT);
             {}",
            extra
        );
        pool.with_conn(|conn| {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .unwrap();
        SourceReader::new(pool, JoinMap::cobie())
    }

    fn with_zone() -> SourceReader {
        reader("CREATE TABLE Zone (id INTEGER PRIMARY KEY, name TEXT, spacenames TEXT);")
    }

    #[test]
    fn test_first_run_is_new() {
        let reader = with_zone();
        let templates = SchemaTemplates::cobie();
        let result = SchemaSynthesizer::new(&reader, &templates).synthesize(None).unwrap();

        assert_eq!(result.state, ItemState::New);
        assert_eq!(result.schema.version, SchemaVersion::INITIAL);
        // Coordinate has no entity template.
        assert_eq!(result.schema.entity_classes.len(), 5);
        assert_eq!(result.schema.relationship_classes.len(), 5);

        let space = result.schema.entity_class("Space").unwrap();
        let names: Vec<_> = space.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["rowid", "cobiename", "cobiecategory", "floorname", "grossarea"]);
        assert_eq!(space.property("grossarea").unwrap().primitive, PrimitiveType::Double);
        assert_eq!(space.property("floorname").unwrap().primitive, PrimitiveType::String);
    }

    #[test]
    fn test_unchanged_source_returns_existing() {
        let reader = with_zone();
        let templates = SchemaTemplates::cobie();
        let synthesizer = SchemaSynthesizer::new(&reader, &templates);

        let first = synthesizer.synthesize(None).unwrap().schema;
        let second = synthesizer.synthesize(Some(&first)).unwrap();
        assert_eq!(second.state, ItemState::Unchanged);
        assert_eq!(second.schema, first);

        let third = synthesizer.synthesize(Some(&second.schema)).unwrap();
        assert_eq!(third.state, ItemState::Unchanged);
        assert_eq!(third.schema, first);
    }

    #[test]
    fn test_added_column_bumps_minor_version() {
        let reader = with_zone();
        let templates = SchemaTemplates::cobie();
        let first = SchemaSynthesizer::new(&reader, &templates)
            .synthesize(None)
            .unwrap()
            .schema;

        reader
            .pool()
            .with_conn(|conn| {
                conn.execute_batch("ALTER TABLE Space ADD COLUMN netarea TEXT;")?;
                Ok(())
            })
            .unwrap();

        let result = SchemaSynthesizer::new(&reader, &templates)
            .synthesize(Some(&first))
            .unwrap();
        assert_eq!(result.state, ItemState::Changed);
        assert_eq!(result.schema.version, SchemaVersion::new(1, 1, 0));
        assert_eq!(result.diagnostics.len(), 1);
        let netarea = result.schema.entity_class("Space").unwrap().property("netarea").unwrap();
        assert_eq!(netarea.primitive, PrimitiveType::Double);
    }

    #[test]
    fn test_unknown_base_schema_is_fatal() {
        let reader = with_zone();
        let mut templates = SchemaTemplates::cobie();
        for entity in templates.entities.iter_mut().filter(|e| e.name == "Floor") {
            entity.base_class = "Architecture:Storey".into();
        }
        let err = SchemaSynthesizer::new(&reader, &templates).synthesize(None).unwrap_err();
        assert!(matches!(err, SchemaError::MissingTemplate { ref class, .. } if class == "Floor"));
    }

    #[test]
    fn test_base_template_inside_dynamic_schema() {
        let reader = with_zone();
        let mut templates = SchemaTemplates::cobie();
        for entity in templates.entities.iter_mut().filter(|e| e.name == "System") {
            entity.base_class = "COBieConnectorDynamic:COBieGroup".into();
        }
        assert!(SchemaSynthesizer::new(&reader, &templates).synthesize(None).is_err());

        templates.base_entities.push(EntityClassDef::new(
            "COBieGroup",
            "BisCore:GroupInformationElement",
        ));
        let schema = SchemaSynthesizer::new(&reader, &templates)
            .synthesize(None)
            .unwrap()
            .schema;
        assert_eq!(schema.entity_classes[0].name, "COBieGroup");
    }

    #[test]
    fn test_missing_constraint_class_is_fatal() {
        let reader = reader("");
        let templates = SchemaTemplates::cobie();
        let err = SchemaSynthesizer::new(&reader, &templates).synthesize(None).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingConstraintClass { ref relationship, .. } if relationship == "ZoneIncludesSpaces"
        ));
    }
}
