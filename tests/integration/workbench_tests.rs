//! End-to-end editing workflows over a catalog document on disk

use pretty_assertions::assert_eq;
use serde_json::json;

use schema_workbench::annotation::source_definitions::edit_source_definitions;
use schema_workbench::annotation::visible_sources;
use schema_workbench::annotation::{
    tags, PathComponent, PseudoColumn, SourceEditor, Toggle, VisibleSourcesKind,
};
use schema_workbench::config::{ServerConfig, WorkbenchConfig};
use schema_workbench::model::ConstraintName;
use schema_workbench::{validate_catalog, ObjectRef, ValidateOptions, WorkbenchError};

use crate::common::{document, review, table_object, TestContext};

// ============================================================================
// Validation Entry Point Tests
// ============================================================================

#[test]
fn test_validate_catalog_fixture() {
    let ctx = TestContext::with_fixture("catalog.json");
    let diagnostics = validate_catalog(ValidateOptions {
        catalog_path: ctx.catalog_path.clone(),
        object: None,
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "Unexpected: {:?}", diagnostics);
}

#[test]
fn test_validate_catalog_unknown_object() {
    let ctx = TestContext::with_fixture("catalog.json");
    let result = validate_catalog(ValidateOptions {
        catalog_path: ctx.catalog_path.clone(),
        object: Some(ObjectRef::Schema("nope".to_string())),
    });
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WorkbenchError>(),
        Some(WorkbenchError::UnknownObject { .. })
    ));
}

#[test]
fn test_validate_catalog_reports_saved_errors() {
    let ctx = TestContext::with_fixture("catalog.json");
    let mut model = ctx.reload();
    model
        .annotations_mut(&table_object(&review()))
        .unwrap()
        .set(tags::VISIBLE_COLUMNS, json!({"compact": ["id", "ghost"]}));
    ctx.write(&model);

    let diagnostics = validate_catalog(ValidateOptions {
        catalog_path: ctx.catalog_path.clone(),
        object: Some(table_object(&review())),
    })
    .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].to_string(),
        "public:Review visible-columns compact[1]: \
         Unresolved source path component ghost in context of public:Review"
    );
}

// ============================================================================
// Document Round Trip Tests
// ============================================================================

#[test]
fn test_save_preserves_unknown_members() {
    let ctx = TestContext::with_fixture("catalog.json");
    let model = ctx.reload();
    ctx.write(&model);
    let reloaded = ctx.reload();

    let table = reloaded.object_json(&table_object(&document())).unwrap();
    assert_eq!(table["kind"], json!("table"));
    assert_eq!(table["comment"], json!("A published document"));
    assert_eq!(
        reloaded.table(&document()).unwrap().referenced_by.len(),
        1,
        "inbound references are rebuilt on load"
    );
}

// ============================================================================
// Editing Workflow Tests
// ============================================================================

#[test]
fn test_build_pseudo_column_and_persist() {
    let ctx = TestContext::with_fixture("catalog.json");
    let mut model = ctx.reload();

    // pick the path interactively from the next-hop menu
    let mut editor = SourceEditor::new(&model, &review()).unwrap();
    let hop = editor
        .next_hops(&model)
        .into_iter()
        .find(|h| matches!(h.component, PathComponent::Outbound(_)))
        .unwrap();
    editor.push(&model, hop.component).unwrap();
    editor
        .push(&model, PathComponent::Column("title".to_string()))
        .unwrap();

    let mut entry = json!({});
    {
        let mut column = PseudoColumn::from_value(&mut entry).unwrap();
        column.set_source(editor.path());
        column.set_markdown_name("Document");
        column.set_entity(Toggle::Disabled);
        column.commit();
    }

    visible_sources::create_context(&mut model, &review(), VisibleSourcesKind::Columns, "compact")
        .unwrap();
    visible_sources::append_entry(
        &mut model,
        &review(),
        VisibleSourcesKind::Columns,
        "compact",
        &entry,
    )
    .unwrap();
    ctx.write(&model);

    let reloaded = ctx.reload();
    assert_eq!(
        reloaded
            .annotations(&table_object(&review()))
            .unwrap()
            .get(tags::VISIBLE_COLUMNS),
        Some(&json!({
            "compact": [{
                "source": [{"outbound": ["public", "fk2"]}, "title"],
                "markdown_name": "Document",
                "entity": false
            }]
        }))
    );
    let rows =
        visible_sources::rows(&reloaded, &review(), VisibleSourcesKind::Columns, "compact")
            .unwrap();
    assert_eq!(rows[0].source, "public:fk2 (outbound) > title");
}

#[test]
fn test_sourcekey_entry_against_definitions() {
    let ctx = TestContext::with_fixture("catalog.json");
    let mut model = ctx.reload();

    edit_source_definitions(&mut model, &document(), |defs| {
        defs.rename("author_name", "writer")
    })
    .unwrap();
    visible_sources::append_entry(
        &mut model,
        &document(),
        VisibleSourcesKind::Columns,
        "detailed",
        &json!({"sourcekey": "writer"}),
    )
    .unwrap();
    ctx.write(&model);

    let diagnostics = validate_catalog(ValidateOptions {
        catalog_path: ctx.catalog_path.clone(),
        object: Some(table_object(&document())),
    })
    .unwrap();
    assert!(diagnostics.is_empty(), "Unexpected: {:?}", diagnostics);
}

#[test]
fn test_inbound_listing_for_visible_foreign_keys() {
    let ctx = TestContext::with_fixture("catalog.json");
    let mut model = ctx.reload();
    let kind = VisibleSourcesKind::ForeignKeys;

    visible_sources::create_context(&mut model, &document(), kind, "detailed").unwrap();
    let fk2 = ConstraintName::new("public", "fk2").to_value();
    visible_sources::append_entry(&mut model, &document(), kind, "detailed", &fk2).unwrap();

    let outbound = ConstraintName::new("public", "fk1").to_value();
    assert!(matches!(
        visible_sources::append_entry(&mut model, &document(), kind, "detailed", &outbound),
        Err(WorkbenchError::EntryNotAllowed { .. })
    ));
    assert!(matches!(
        visible_sources::create_context(&mut model, &document(), kind, "detailed"),
        Err(WorkbenchError::DuplicateContext { .. })
    ));

    let rows = visible_sources::rows(&model, &document(), kind, "detailed").unwrap();
    assert_eq!(rows.len(), 1);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_config_round_trip() {
    let ctx = TestContext::with_fixture("catalog.json");
    let path = ctx.catalog_path.with_file_name("workbench.json");

    assert_eq!(WorkbenchConfig::load(&path).unwrap(), WorkbenchConfig::default());

    let config = WorkbenchConfig {
        debug: true,
        servers: vec![ServerConfig {
            host: "catalog.example.org".to_string(),
            catalog_id: "1".to_string(),
            desc: Some("Production".to_string()),
            default: true,
        }],
    };
    config.save(&path).unwrap();
    let loaded = WorkbenchConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.select_server(None, None).unwrap().display_name(),
        "Production [host: catalog.example.org, catalog id: 1]"
    );
}

#[test]
fn test_config_parse_error() {
    let ctx = TestContext::with_fixture("catalog.json");
    let path = ctx.catalog_path.with_file_name("workbench.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        WorkbenchConfig::load(&path),
        Err(WorkbenchError::ConfigParseError { .. })
    ));
}
