//! Unit tests for the catalog browser and editor dispatch

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use schema_workbench::annotation::{tags, AnnotationKind, ShapeRegistry};
use schema_workbench::browser::{
    self, add_annotation, addable_tags, delete_annotation, editor_view, BrowserItem, EditorView,
    SelectedItem,
};
use schema_workbench::model::ConstraintName;
use schema_workbench::{ObjectRef, TableRef};

use crate::common::{author, document, load_catalog, table_object};

// ============================================================================
// Tree Tests
// ============================================================================

#[test]
fn test_tree_lists_present_tags_only() {
    let model = load_catalog();
    let before = model.to_json().unwrap();
    let tree = browser::tree(&model);

    let annotations = tree
        .find(&BrowserItem::Annotations(table_object(&document())))
        .expect("Document annotations node");
    let labels: Vec<_> = annotations.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["visible-columns", "source-definitions"]);

    let author_annotations = tree
        .find(&BrowserItem::Annotations(table_object(&author())))
        .unwrap();
    assert!(author_annotations.children.is_empty());

    // browsing does not touch the stores
    assert_eq!(model.to_json().unwrap(), before);
}

#[test]
fn test_tree_groups_table_members() {
    let model = load_catalog();
    let tree = browser::tree(&model);
    let document_node = tree
        .find(&BrowserItem::Object(table_object(&document())))
        .unwrap();
    let groups: Vec<_> = document_node.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(groups, vec!["annotations", "columns", "keys", "foreign keys"]);

    let rendered = tree.render();
    assert!(rendered.starts_with("catalog\n  annotations\n  public\n"));
    assert!(rendered.contains("\n      foreign keys\n        fk1\n"));
}

#[test]
fn test_selection_from_items() {
    let item = BrowserItem::Annotation(table_object(&document()), tags::VISIBLE_COLUMNS.to_string());
    assert_eq!(
        item.selection(),
        Some(SelectedItem {
            object: table_object(&document()),
            tag: Some(tags::VISIBLE_COLUMNS.to_string()),
        })
    );
    assert_eq!(BrowserItem::Group("columns").selection(), None);
}

// ============================================================================
// Add / Delete Annotation Tests
// ============================================================================

#[test]
fn test_addable_tags_exclude_present() {
    let model = load_catalog();
    let registry = ShapeRegistry::with_builtins();
    let addable = addable_tags(&model, &registry, &table_object(&document())).unwrap();
    assert!(!addable.iter().any(|t| t == tags::VISIBLE_COLUMNS));
    assert!(addable.iter().any(|t| t == tags::VISIBLE_FOREIGN_KEYS));
    assert!(!addable.iter().any(|t| t == tags::COLUMN_DISPLAY));
}

#[test]
fn test_add_uses_shape_default() {
    let mut model = load_catalog();
    let registry = ShapeRegistry::with_builtins();
    let column = ObjectRef::Column(author(), "id".to_string());

    add_annotation(&mut model, &registry, &column, tags::REQUIRED).unwrap();
    add_annotation(&mut model, &registry, &column, tags::DISPLAY).unwrap();
    add_annotation(&mut model, &registry, &column, "tag:example.org,2024:other").unwrap();

    let store = model.annotations(&column).unwrap();
    assert_eq!(store.get(tags::REQUIRED), Some(&Value::Null));
    assert_eq!(store.get(tags::DISPLAY), Some(&json!({})));
    assert_eq!(store.get("tag:example.org,2024:other"), Some(&json!({})));
}

#[test]
fn test_add_keeps_existing_body_and_delete_removes_key() {
    let mut model = load_catalog();
    let registry = ShapeRegistry::with_builtins();
    let object = table_object(&document());

    add_annotation(&mut model, &registry, &object, tags::VISIBLE_COLUMNS).unwrap();
    let body = model.annotations(&object).unwrap().get(tags::VISIBLE_COLUMNS).cloned();
    assert!(body.is_some_and(|b| b.get("compact").is_some()));

    let removed = delete_annotation(&mut model, &object, tags::VISIBLE_COLUMNS).unwrap();
    assert!(removed.is_some());
    assert!(!model.annotations(&object).unwrap().contains(tags::VISIBLE_COLUMNS));
    assert_eq!(
        delete_annotation(&mut model, &object, tags::VISIBLE_COLUMNS).unwrap(),
        None
    );
}

// ============================================================================
// Editor Dispatch Tests
// ============================================================================

#[test]
fn test_editor_view_dispatch() {
    let object = table_object(&document());
    let select = |tag: Option<&str>| SelectedItem {
        object: object.clone(),
        tag: tag.map(str::to_string),
    };

    assert_eq!(editor_view(&select(None)), EditorView::ObjectJson(object.clone()));
    assert_eq!(
        editor_view(&select(Some(tags::SOURCE_DEFINITIONS))),
        EditorView::Dedicated {
            object: object.clone(),
            kind: AnnotationKind::SourceDefinitions,
        }
    );
    assert_eq!(
        editor_view(&select(Some(tags::APP_LINKS))),
        EditorView::GenericJson {
            object: object.clone(),
            tag: tags::APP_LINKS.to_string(),
        }
    );
}

// ============================================================================
// Object Spec Tests
// ============================================================================

#[test]
fn test_parse_object_specs() {
    let cases = [
        ("/", ObjectRef::Catalog),
        ("public", ObjectRef::Schema("public".to_string())),
        ("public:Document", table_object(&document())),
        (
            "public:Document.title",
            ObjectRef::Column(document(), "title".to_string()),
        ),
        (
            "public:Document/key/public:Document_pkey",
            ObjectRef::Key(document(), ConstraintName::new("public", "Document_pkey")),
        ),
        (
            "public:Document/fkey/public:fk1",
            ObjectRef::ForeignKey(document(), ConstraintName::new("public", "fk1")),
        ),
    ];
    for (spec, expected) in cases {
        assert_eq!(spec.parse::<ObjectRef>().unwrap(), expected, "{}", spec);
    }
}

#[test]
fn test_parse_rejects_bad_specs() {
    for spec in ["", "public:Doc:x", "public:Document/index/a:b"] {
        assert!(spec.parse::<ObjectRef>().is_err(), "{} should not parse", spec);
    }
    assert_eq!(
        "public:Document".parse::<ObjectRef>().unwrap().table(),
        Some(&TableRef::new("public", "Document"))
    );
}
