//! Unit tests for the source definitions registry

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

use schema_workbench::annotation::source_definitions::edit_source_definitions;
use schema_workbench::annotation::tags;
use schema_workbench::annotation::{SearchColumn, Selection, SourceDefinitions, SEARCH_BOX};
use schema_workbench::model::ConstraintName;
use schema_workbench::WorkbenchError;

use crate::common::{author, document, load_catalog, table_object};

fn document_columns() -> Vec<String> {
    vec!["id".to_string(), "title".to_string(), "author".to_string()]
}

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected an object, got {}", other),
    }
}

fn search(column: &str, name: Option<&str>) -> SearchColumn {
    SearchColumn {
        column: column.to_string(),
        markdown_name: name.map(str::to_string),
    }
}

// ============================================================================
// Key Uniqueness Tests
// ============================================================================

#[test]
fn test_add_rejects_colliding_keys() {
    let mut map = body(json!({"sources": {"author_name": {"source": "title"}}}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    for key in ["author_name", "title", "id", SEARCH_BOX] {
        let result = defs.add(key, json!({"source": "title"}));
        assert!(
            matches!(result, Err(WorkbenchError::DuplicateKey { .. })),
            "{} should collide",
            key
        );
    }
    assert!(defs.add("fresh", json!({"source": "title"})).is_ok());
    assert_eq!(defs.source_keys(), vec!["author_name", "fresh"]);
}

#[test]
fn test_add_rejects_empty_key_and_non_object() {
    let mut map = Map::new();
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    assert!(matches!(
        defs.add("", json!({})),
        Err(WorkbenchError::InvalidSourceKey { .. })
    ));
    assert!(matches!(
        defs.add("k", json!("title")),
        Err(WorkbenchError::MalformedEntry { .. })
    ));
    assert!(map.is_empty());
}

// ============================================================================
// Rename Tests
// ============================================================================

#[test]
fn test_rename_keeps_body_and_position() {
    let mut map = body(json!({
        "sources": {
            "a": {"source": "id"},
            "b": {"source": "title"},
            "c": {"source": "author"}
        }
    }));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    defs.rename("b", "renamed").unwrap();

    assert_eq!(defs.source_keys(), vec!["a", "renamed", "c"]);
    assert_eq!(defs.get("renamed"), Some(&json!({"source": "title"})));
    assert!(!defs.contains("b"));
}

#[test]
fn test_rename_collision_rolls_back() {
    let original = json!({
        "sources": {
            "a": {"source": "id"},
            "b": {"source": "title"}
        }
    });
    let mut map = body(original.clone());
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    assert!(matches!(
        defs.rename("a", "b"),
        Err(WorkbenchError::DuplicateKey { .. })
    ));
    assert!(matches!(
        defs.rename("a", "title"),
        Err(WorkbenchError::DuplicateKey { .. })
    ));
    assert!(matches!(
        defs.rename("missing", "z"),
        Err(WorkbenchError::UnknownSourceKey { .. })
    ));
    assert_eq!(Value::Object(map), original);
}

#[test]
fn test_replace_under_same_key() {
    let mut map = body(json!({"sources": {"a": {"source": "id"}}}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    defs.replace("a", "a", json!({"source": "title", "markdown_name": "T"}))
        .unwrap();
    assert_eq!(
        Value::Object(map),
        json!({"sources": {"a": {"source": "title", "markdown_name": "T"}}})
    );
}

#[test]
fn test_duplicate_picks_free_copy_key() {
    let mut map = body(json!({"sources": {"a": {"source": "id"}, "a_copy_1": {}}}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    assert_eq!(defs.duplicate("a").unwrap(), "a_copy_2");
    assert_eq!(defs.get("a_copy_2"), Some(&json!({"source": "id"})));
}

#[test]
fn test_remove_absent_key_is_noop() {
    let mut map = body(json!({"sources": {"a": {"source": "id"}}}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    assert!(defs.remove("zzz").is_none());
    assert_eq!(defs.source_keys(), vec!["a"]);
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_columns_and_fkeys_selection() {
    let mut map = Map::new();
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    defs.set_columns(Selection::Subset(vec!["id".to_string()]));
    defs.set_fkeys(Selection::Subset(vec![ConstraintName::new("public", "fk1")]));
    assert_eq!(defs.columns(), Selection::Subset(vec!["id".to_string()]));

    defs.set_fkeys(Selection::All);
    assert_eq!(defs.fkeys(), Selection::All);
    assert_eq!(
        Value::Object(map),
        json!({"columns": ["id"], "fkeys": true})
    );
}

// ============================================================================
// Search Box Tests
// ============================================================================

#[test]
fn test_search_box_lifecycle() {
    let mut map = Map::new();
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    defs.add_search_column(search("title", Some("Title"))).unwrap();
    defs.add_search_column(search("id", None)).unwrap();
    assert_eq!(
        defs.search_columns(),
        vec![search("title", Some("Title")), search("id", None)]
    );
    assert!(defs.source_keys().is_empty());

    assert!(defs.remove_search_column(0).is_some());
    assert!(defs.remove_search_column(5).is_none());
    assert!(defs.remove_search_column(0).is_some());
    assert!(map.is_empty(), "no empty or-list may persist: {:?}", map);
}

#[test]
fn test_search_column_must_exist() {
    let mut map = Map::new();
    let mut defs = SourceDefinitions::new(&mut map, document_columns());
    assert!(matches!(
        defs.add_search_column(search("missing", None)),
        Err(WorkbenchError::UnresolvedPathComponent { .. })
    ));
    assert!(map.is_empty());
}

// ============================================================================
// Model Integration Tests
// ============================================================================

#[test]
fn test_edit_through_model() {
    let mut model = load_catalog();
    edit_source_definitions(&mut model, &document(), |defs| {
        defs.add("reviews", json!({"source": [{"inbound": ["public", "fk2"]}, "score"]}))
    })
    .unwrap();

    let store = model.annotations(&table_object(&document())).unwrap();
    let sources = &store.get(tags::SOURCE_DEFINITIONS).unwrap()["sources"];
    assert!(sources.get("author_name").is_some());
    assert!(sources.get("reviews").is_some());
}

#[test]
fn test_failed_edit_creates_no_annotation() {
    let mut model = load_catalog();
    let result = edit_source_definitions(&mut model, &author(), |defs| {
        defs.add("name", json!({"source": "id"}))
    });
    assert!(matches!(result, Err(WorkbenchError::DuplicateKey { .. })));

    let store = model.annotations(&table_object(&author())).unwrap();
    assert!(!store.contains(tags::SOURCE_DEFINITIONS));
}

// ============================================================================
// Definition Commit Tests
// ============================================================================

#[test]
fn test_add_stores_committed_definition() {
    let mut map = Map::new();
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    defs.add("k", json!({"source": [], "sourcekey": "x", "display": {}}))
        .unwrap();
    defs.add("named", json!({"source": "title", "markdown_name": "Title", "display": {}}))
        .unwrap();

    assert_eq!(
        Value::Object(map),
        json!({"sources": {
            "k": {"sourcekey": "x"},
            "named": {"source": "title", "markdown_name": "Title"}
        }})
    );
}

#[test]
fn test_replace_stores_committed_definition() {
    let mut map = body(json!({"sources": {"a": {"source": "id"}}}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    defs.replace("a", "b", json!({"source": ["title"], "sourcekey": "a2", "display": {}}))
        .unwrap();
    assert_eq!(defs.get("b"), Some(&json!({"sourcekey": "a2"})));
    assert!(!defs.contains("a"));
}

#[test]
fn test_edits_reject_malformed_sources_member() {
    let mut map = body(json!({"sources": []}));
    let mut defs = SourceDefinitions::new(&mut map, document_columns());

    assert!(matches!(
        defs.add("k", json!({"source": "title"})),
        Err(WorkbenchError::MalformedEntry { .. })
    ));
    assert!(matches!(
        defs.replace("k", "k", json!({"source": "title"})),
        Err(WorkbenchError::MalformedEntry { .. })
    ));
    assert!(matches!(
        defs.add_search_column(search("title", None)),
        Err(WorkbenchError::MalformedEntry { .. })
    ));
    assert!(!defs.contains("k"));
    assert_eq!(Value::Object(map), json!({"sources": []}));
}

#[test]
fn test_search_column_rejects_malformed_search_box() {
    for search_box in [json!("title"), json!({"or": "title"})] {
        let original = json!({"sources": {SEARCH_BOX: search_box}});
        let mut map = body(original.clone());
        let mut defs = SourceDefinitions::new(&mut map, document_columns());
        assert!(matches!(
            defs.add_search_column(search("title", None)),
            Err(WorkbenchError::MalformedEntry { .. })
        ));
        assert_eq!(Value::Object(map), original);
    }
}
