mod common;

use cobie_core::{CoreError, ElementClassNode, FieldValue, MappingNode, Placement3d, Point3d};
use cobie_graph::{AlignmentEngine, Repository, SqliteChangeTracker, SyncError, SyncSession};

use common::{execute, Harness, ELEMENT_COUNT, SPACE_COUNT};

#[tokio::test]
async fn test_first_run_creates_everything() {
    let h = Harness::new().await;
    let result = h.run().await;

    assert_eq!(result.models_created, 6);
    assert_eq!(result.categories_created, 1);
    assert_eq!(result.elements_inserted, ELEMENT_COUNT);
    assert_eq!(result.elements_updated, 0);
    assert_eq!(result.rows_skipped, 0);
    assert_eq!(result.relationships_created, 6);
    assert_eq!(result.relationships_updated, 2 + SPACE_COUNT);
    assert_eq!(h.repo.element_count(), ELEMENT_COUNT);
    assert_eq!(h.repo.relationship_count(), 6);

    let space = h.element("Space101");
    assert_eq!(space.class_full_name, "COBieConnectorDynamic:Space");
    assert_eq!(space.user_label.as_deref(), Some("101"));
    assert!(space.category.is_some());
    assert_eq!(space.properties["cobiename"], FieldValue::Text("101".into()));
    assert_eq!(space.properties["grossarea"], FieldValue::Double(10.5));
    assert_eq!(space.properties["footprintArea"], FieldValue::Double(10.5));
    assert_eq!(space.properties["netarea"], FieldValue::Null);

    let origin = space.placement.unwrap().origin;
    assert_eq!((origin.x, origin.y, origin.z), (10.0, 20.0, 3.0));

    // No coordinate row: placed at the origin.
    let origin = h.element("Space102").placement.unwrap().origin;
    assert_eq!((origin.x, origin.y, origin.z), (0.0, 0.0, 0.0));

    // Information records carry no placement.
    let job = h.element("Job1");
    assert!(job.placement.is_none());
    assert_eq!(job.properties["duration"], FieldValue::Double(2.5));
}

#[tokio::test]
async fn test_second_run_writes_nothing() {
    let h = Harness::new().await;
    h.run().await;
    h.repo.reset_stats();

    let result = h.run().await;
    assert_eq!(result.writes(), 0);
    assert_eq!(result.models_created, 0);
    assert_eq!(result.categories_created, 0);
    assert_eq!(result.elements_unchanged, ELEMENT_COUNT);
    assert_eq!(result.stale_elements, 0);

    let stats = h.repo.stats();
    assert_eq!(stats.data_writes(), 0);
    assert_eq!(stats.extents_updates, 0);
    assert_eq!(h.repo.element_count(), ELEMENT_COUNT);
}

#[tokio::test]
async fn test_changed_row_updates_in_place() {
    let h = Harness::new().await;
    h.run().await;
    let before = h.element("Space105");
    let level2 = h.element("FloorLevel 2").id.unwrap();

    execute(&h.reader, "UPDATE Space SET floorname = 'Level 2' WHERE name = '105'");
    let result = h.run().await;

    assert_eq!(result.elements_updated, 1);
    assert_eq!(result.elements_inserted, 0);
    assert_eq!(result.elements_unchanged, ELEMENT_COUNT - 1);
    assert_eq!(result.relationships_updated, 1);
    assert_eq!(result.relationships_created, 0);

    let after = h.element("Space105");
    assert_eq!(after.id, before.id);
    assert_eq!(after.properties["floorname"], FieldValue::Text("Level 2".into()));
    assert_eq!(after.related["composingElement"].id, level2);
}

#[tokio::test]
async fn test_links_are_not_duplicated() {
    let h = Harness::new().await;
    h.run().await;

    // A fresh tracker sees every row as new again; links already exist.
    let fresh = SqliteChangeTracker::in_memory().unwrap();
    let mut session = SyncSession::new(h.subject, h.code_spec);
    let result = AlignmentEngine::new(&h.schema, &h.registry, &h.reader, &h.repo, &fresh)
        .align(&h.tree, &mut session)
        .await
        .unwrap();

    assert_eq!(result.elements_inserted, 0);
    assert_eq!(result.elements_updated, ELEMENT_COUNT);
    assert_eq!(result.relationships_created, 0);
    assert_eq!(result.relationships_updated, 0);
    assert_eq!(h.repo.relationship_count(), 6);
    assert_eq!(h.repo.element_count(), ELEMENT_COUNT);
}

#[tokio::test]
async fn test_embedded_ownership() {
    let h = Harness::new().await;
    h.run().await;

    let pump1 = h.element("ComponentPump-1").id.unwrap();
    let door = h.element("ComponentDoor-1");
    assert_eq!(door.related["parent"].id, pump1);
    assert_eq!(
        door.related["parent"].rel_class_name,
        "COBieConnectorDynamic:ComponentAssemblesComponents"
    );
    assert_eq!(h.element("ComponentPump-2").related["parent"].id, pump1);
    assert!(!h.element("ComponentPump-1").related.contains_key("parent"));

    let level1 = h.element("FloorLevel 1").id.unwrap();
    assert_eq!(h.element("Space101").related["composingElement"].id, level1);
}

#[tokio::test]
async fn test_missing_owner_is_fatal() {
    let h = Harness::new().await;
    execute(&h.reader, "UPDATE Assembly SET parentname = 'Ghost'");

    let err = h.try_run().await.unwrap_err();
    assert!(matches!(err, SyncError::Data { ref table, .. } if table == "Assembly"));
}

#[tokio::test]
async fn test_type_definition() {
    let h = Harness::new().await;
    h.run().await;

    let door_type = h.element("TypeDoor Type").id.unwrap();
    let door = h.element("ComponentDoor-1");
    assert_eq!(door.related["typeDefinition"].id, door_type);
    assert!(!h.element("ComponentPump-2").related.contains_key("typeDefinition"));

    execute(&h.reader, "UPDATE Component SET description = 'Fire door' WHERE name = 'Door-1'");
    let result = h.run().await;
    assert_eq!(result.elements_updated, 1);

    let door = h.element("ComponentDoor-1");
    assert_eq!(door.related["typeDefinition"].id, door_type);
    // Owner set by the assembly survives the rebuild.
    assert!(door.related.contains_key("parent"));
}

#[tokio::test]
async fn test_type_definition_follows_row() {
    let h = Harness::new().await;
    h.run().await;
    let pump_type = h.element("TypePump Type").id.unwrap();

    execute(&h.reader, "UPDATE Component SET typename = 'Pump Type' WHERE name = 'Door-1'");
    let result = h.run().await;
    assert_eq!(result.elements_updated, 1);
    let door = h.element("ComponentDoor-1");
    assert_eq!(door.related["typeDefinition"].id, pump_type);

    execute(&h.reader, "UPDATE Component SET typename = '' WHERE name = 'Door-1'");
    let result = h.run().await;
    assert_eq!(result.elements_updated, 1);
    let door = h.element("ComponentDoor-1");
    assert!(!door.related.contains_key("typeDefinition"));
    assert!(door.related.contains_key("parent"));

    execute(&h.reader, "UPDATE Component SET typename = 'Valve Type' WHERE name = 'Door-1'");
    h.run().await;
    assert!(!h.element("ComponentDoor-1").related.contains_key("typeDefinition"));
}

#[tokio::test]
async fn test_extents_grow_and_never_shrink() {
    let h = Harness::new().await;
    h.run().await;
    let first = h.repo.project_extents().await.unwrap();
    assert!(!first.is_null());
    assert!(first.high.x >= 10.0 && first.high.y >= 20.0);

    execute(&h.reader, "UPDATE Coordinate SET coordinatexaxis = '1000' WHERE name = '101'");
    h.run().await;
    let grown = h.repo.project_extents().await.unwrap();
    assert!(grown.high.x >= 1000.0);
    assert!(grown.contains_range(&first));

    execute(&h.reader, "UPDATE Coordinate SET coordinatexaxis = '10' WHERE name = '101'");
    h.repo.reset_stats();
    h.run().await;
    assert_eq!(h.repo.project_extents().await.unwrap(), grown);
    assert_eq!(h.repo.stats().extents_updates, 0);
}

#[tokio::test]
async fn test_extents_survive_failed_run() {
    let h = Harness::new().await;
    execute(&h.reader, "UPDATE Space SET grossarea = 'bad' WHERE name = '110'");
    assert!(h.try_run().await.is_err());

    let space101 = Placement3d::at(Point3d::new(10.0, 20.0, 3.0)).calculate_range();
    assert!(h.repo.project_extents().await.unwrap().contains_range(&space101));

    execute(&h.reader, "UPDATE Space SET grossarea = '19.5' WHERE name = '110'");
    let result = h.run().await;
    assert!(result.elements_unchanged > 0);
    assert_eq!(h.repo.element_count(), ELEMENT_COUNT);

    let extents = h.repo.project_extents().await.unwrap();
    assert!(extents.contains_range(&space101));
    let door = Placement3d::at(Point3d::new(5.0, 5.0, 0.0)).calculate_range();
    assert!(extents.contains_range(&door));
}

#[tokio::test]
async fn test_bad_number_is_fatal() {
    let h = Harness::new().await;
    execute(&h.reader, "UPDATE Job SET duration = 'two days'");

    let err = h.try_run().await.unwrap_err();
    assert!(matches!(err, SyncError::Data { ref table, .. } if table == "Job"));
}

#[tokio::test]
async fn test_null_key_row_is_skipped() {
    let h = Harness::new().await;
    execute(&h.reader, "INSERT INTO Resource (name, category) VALUES (NULL, 'Tools')");

    let result = h.run().await;
    assert_eq!(result.rows_skipped, 1);
    assert_eq!(result.elements_inserted, ELEMENT_COUNT);
}

#[tokio::test]
async fn test_removed_row_is_reported_stale() {
    let h = Harness::new().await;
    h.run().await;

    execute(&h.reader, "DELETE FROM Space WHERE name = '122'");
    let result = h.run().await;

    assert_eq!(result.stale_elements, 1);
    assert_eq!(result.writes(), 0);
    assert_eq!(h.repo.elements_with_code_value("Space122").len(), 1);
}

#[tokio::test]
async fn test_tree_errors_surface_before_writes() {
    let h = Harness::new().await;

    let mut tree = h.tree.clone();
    let group = tree.models.remove(4);
    tree.models.insert(0, group);
    let err = h.try_run_tree(&tree).await.unwrap_err();
    assert!(matches!(err, SyncError::Core(CoreError::InvalidTree(_))));

    let mut tree = h.tree.clone();
    tree.models[5].nodes.push(MappingNode::ElementClass(ElementClassNode {
        class: "Widget".into(),
        category: None,
        type_definition: None,
    }));
    let err = h.try_run_tree(&tree).await.unwrap_err();
    assert!(matches!(err, SyncError::Core(CoreError::UnknownClass(_))));

    assert_eq!(h.repo.element_count(), 0);
}

#[tokio::test]
async fn test_schema_without_class_is_config_error() {
    let mut h = Harness::new().await;
    h.schema.entity_classes.retain(|c| c.name != "Document");

    let err = h.try_run().await.unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}
