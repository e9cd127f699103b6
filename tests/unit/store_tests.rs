//! Unit tests for annotation stores, body shapes and validation

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use schema_workbench::annotation::shapes::all_objects;
use schema_workbench::annotation::{tags, AnnotationKind, BodyShape, Diagnostic, ShapeRegistry};
use schema_workbench::model::{AnnotationStore, ObjectKind};
use schema_workbench::{CatalogModel, ObjectRef, WorkbenchError};

use crate::common::{author, document, load_catalog, table_object};

// ============================================================================
// Annotation Store Tests
// ============================================================================

#[test]
fn test_get_never_creates() {
    let model = load_catalog();
    let store = model.annotations(&table_object(&author())).unwrap();
    assert!(store.get(tags::VISIBLE_COLUMNS).is_none());
    assert!(store.is_empty());
}

#[test]
fn test_ensure_then_delete() {
    let mut store = AnnotationStore::new();
    store.ensure(tags::DISPLAY, || json!({}));
    assert!(store.contains(tags::DISPLAY));

    assert_eq!(store.delete(tags::DISPLAY), Some(json!({})));
    assert!(!store.contains(tags::DISPLAY));
    assert_eq!(store.delete(tags::DISPLAY), None);
}

#[test]
fn test_edit_object_rejects_non_object_body() {
    let mut store = AnnotationStore::new();
    store.set(tags::VISIBLE_COLUMNS, json!(["not", "contexts"]));
    let result = store.edit_object(tags::VISIBLE_COLUMNS, |body| {
        body.insert("compact".to_string(), json!([]));
        Ok(())
    });
    assert!(matches!(result, Err(WorkbenchError::MalformedEntry { .. })));
    assert_eq!(store.get(tags::VISIBLE_COLUMNS), Some(&json!(["not", "contexts"])));
}

#[test]
fn test_unknown_object_has_no_store() {
    let model = load_catalog();
    let missing = ObjectRef::Column(document(), "nope".to_string());
    assert!(!model.contains(&missing));
    assert!(matches!(
        model.annotations(&missing),
        Err(WorkbenchError::UnknownObject { .. })
    ));
}

// ============================================================================
// Shape Registry Tests
// ============================================================================

#[test]
fn test_every_builtin_kind_has_a_shape() {
    let registry = ShapeRegistry::with_builtins();
    for tag in tags::ALL {
        assert!(registry.get(tag).is_some(), "No shape for {}", tag);
    }
    for tag in [
        tags::VISIBLE_COLUMNS,
        tags::SOURCE_DEFINITIONS,
        tags::TABLE_DISPLAY,
        tags::KEY_DISPLAY,
    ] {
        let kind = AnnotationKind::from_tag(tag).unwrap();
        assert_eq!(kind.tag(), tag);
    }
    assert_eq!(AnnotationKind::from_tag(tags::CHAISE_CONFIG), None);
}

#[test]
fn test_tags_for_object_kinds() {
    let registry = ShapeRegistry::with_builtins();
    let table = registry.tags_for(ObjectKind::Table);
    assert!(table.contains(&tags::VISIBLE_COLUMNS));
    assert!(table.contains(&tags::DISPLAY));
    assert!(!table.contains(&tags::COLUMN_DISPLAY));

    let key = registry.tags_for(ObjectKind::Key);
    assert_eq!(key, vec![tags::DISPLAY, tags::KEY_DISPLAY]);
}

struct RequiresNote;

impl BodyShape for RequiresNote {
    fn tag(&self) -> &str {
        "tag:example.org,2024:note"
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        kind == ObjectKind::Table
    }

    fn default_body(&self) -> Value {
        json!({"note": ""})
    }

    fn validate(&self, _: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic> {
        if body.get("note").and_then(Value::as_str).is_some_and(|n| !n.is_empty()) {
            return Vec::new();
        }
        vec![Diagnostic {
            object: object.clone(),
            tag: self.tag().to_string(),
            location: "note".to_string(),
            message: "note is required".to_string(),
        }]
    }
}

#[test]
fn test_custom_shape_participates_in_validation() {
    let mut registry = ShapeRegistry::with_builtins();
    registry.register(RequiresNote);

    let mut model = load_catalog();
    model
        .table_mut(&author())
        .unwrap()
        .annotations
        .set("tag:example.org,2024:note", json!({"note": ""}));

    let diagnostics = registry.validate_model(&model);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].object, table_object(&author()));
    assert_eq!(
        diagnostics[0].to_string(),
        "public:Author note note: note is required"
    );
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_fixture_is_valid() {
    let model = load_catalog();
    let diagnostics = ShapeRegistry::with_builtins().validate_model(&model);
    assert!(diagnostics.is_empty(), "Unexpected: {:?}", diagnostics);
}

#[test]
fn test_validate_reports_each_bad_entry() {
    let mut model = load_catalog();
    model.table_mut(&document()).unwrap().annotations.set(
        tags::VISIBLE_COLUMNS,
        json!({
            "compact": ["title", 7, {"sourcekey": "undefined_key"}],
            "detailed": [{"source": [{"outbound": ["public", "fk1"]}, "nope"]}],
            "entry": [{"source": "title"}],
            "compact/brief": "no_such_context"
        }),
    );

    let diagnostics =
        ShapeRegistry::with_builtins().validate_object(&model, &table_object(&document()));
    let locations: Vec<_> = diagnostics.iter().map(|d| d.location.as_str()).collect();
    assert_eq!(
        locations,
        vec!["compact[1]", "compact[2]", "detailed[0]", "entry[0]", "compact/brief"]
    );
    assert!(diagnostics[2].message.contains("valid prefix is [public:fk1 (outbound)]"));
}

#[test]
fn test_validate_source_definitions() {
    let mut model = load_catalog();
    model.table_mut(&document()).unwrap().annotations.set(
        tags::SOURCE_DEFINITIONS,
        json!({
            "columns": ["id", "ghost"],
            "fkeys": [["public", "fk9"]],
            "sources": {
                "title": {"source": "title"},
                "broken": {"source": [{"inbound": ["public", "fk1"]}]},
                "search-box": {"or": [{"source": "missing"}]}
            }
        }),
    );
    let diagnostics =
        ShapeRegistry::with_builtins().validate_object(&model, &table_object(&document()));
    let locations: Vec<_> = diagnostics.iter().map(|d| d.location.as_str()).collect();
    assert_eq!(
        locations,
        vec!["columns", "fkeys", "sources.title", "sources.broken", "sources.search-box"]
    );
}

#[test]
fn test_all_objects_enumerates_model() {
    let model = load_catalog();
    let objects = all_objects(&model);
    assert_eq!(objects[0], ObjectRef::Catalog);
    // catalog + schema + 3 tables + 8 columns + 3 keys + 2 foreign keys
    assert_eq!(objects.len(), 18);
}
