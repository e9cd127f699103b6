//! Unit tests for the display-style annotation editors

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

use schema_workbench::annotation::contextual_display::{
    self, ColumnDisplayOptions, ColumnOrder, KeyDisplayOptions, TableDisplayOptions, TablePattern,
    COLLAPSE_TOC_PANEL,
};
use schema_workbench::annotation::display::{
    self, CitationOptions, CitationPattern, Direction, DisplayOptions, ForeignKeyOptions, TITLE_CASE,
    UNDERLINE_SPACE,
};
use schema_workbench::annotation::properties::{CommentDisplay, SortKey, TemplateEngine};
use schema_workbench::annotation::shapes::ShapeRegistry;
use schema_workbench::annotation::tags;
use schema_workbench::model::ConstraintName;
use schema_workbench::{ObjectRef, WorkbenchError};

use crate::common::{document, load_catalog, table_object};

// ============================================================================
// Display Annotation Tests
// ============================================================================

#[test]
fn test_display_name_style_minimality() {
    let mut body = Map::new();
    let mut display = DisplayOptions::new(&mut body);

    display.set_name_style(UNDERLINE_SPACE, true);
    display.set_name_style(TITLE_CASE, true);
    assert!(display.name_style(TITLE_CASE));

    display.set_name_style(UNDERLINE_SPACE, false);
    display.set_name_style(TITLE_CASE, false);
    assert!(body.is_empty());
}

#[test]
fn test_display_comment_keeps_context_object() {
    let mut body = json!({"comment": {"compact": "Short"}})
        .as_object()
        .cloned()
        .unwrap();
    let mut display = DisplayOptions::new(&mut body);
    assert!(!display.set_comment("Plain"));
    assert_eq!(display.comment(), None);

    let mut plain = Map::new();
    let mut display = DisplayOptions::new(&mut plain);
    assert!(display.set_comment("Plain"));
    display.set_name("Doc");
    display.set_markdown_name("**Doc**");
    assert_eq!(
        Value::Object(plain),
        json!({"comment": "Plain", "name": "Doc", "markdown_name": "**Doc**"})
    );
}

#[test]
fn test_foreign_key_directions() {
    let mut body = Map::new();
    let mut fkey = ForeignKeyOptions::new(&mut body);
    fkey.set_name(Direction::To, "Author");
    fkey.set_name(Direction::From, "Documents");
    fkey.set_comment_display(Direction::From, Some(CommentDisplay::Inline));
    assert_eq!(fkey.name(Direction::From), Some("Documents"));

    fkey.set_name(Direction::To, "");
    assert_eq!(
        Value::Object(body),
        json!({"from_name": "Documents", "from_comment_display": "inline"})
    );
}

#[test]
fn test_citation_template_engine_text() {
    let mut body = Map::new();
    let mut citation = CitationOptions::new(&mut body);
    citation.set_pattern(CitationPattern::Title, "{{{title}}}");
    citation.set_template_engine("mustache");
    assert_eq!(citation.template_engine(), Some(TemplateEngine::Mustache));

    citation.set_template_engine("jinja");
    assert_eq!(citation.template_engine(), None);
    assert_eq!(Value::Object(body), json!({"title_pattern": "{{{title}}}"}));
}

#[test]
fn test_citation_pattern_keys_are_distinct() {
    let mut keys: Vec<_> = CitationPattern::ALL.iter().map(|p| p.key()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), CitationPattern::ALL.len());
}

// ============================================================================
// Table Display Tests
// ============================================================================

#[test]
fn test_row_order_push_pop() {
    let mut options = Map::new();
    let mut table = TableDisplayOptions::new(&mut options);
    {
        let mut order = table.row_order();
        order.push(SortKey::ascending("title"));
        order.push(SortKey::descending("id"));
        assert_eq!(
            order.keys(),
            vec![SortKey::ascending("title"), SortKey::descending("id")]
        );
        assert_eq!(order.pop(), Some(SortKey::descending("id")));
        assert_eq!(order.pop(), Some(SortKey::ascending("title")));
        assert_eq!(order.pop(), None);
    }
    table.set_pattern(TablePattern::Row, "{{{title}}}");
    table.set_flag(COLLAPSE_TOC_PANEL, true);
    assert_eq!(
        Value::Object(options),
        json!({"row_markdown_pattern": "{{{title}}}", "collapse_toc_panel": true})
    );
}

// ============================================================================
// Column / Key Display Tests
// ============================================================================

#[test]
fn test_pre_format_nested_minimality() {
    let mut options = Map::new();
    let mut column = ColumnDisplayOptions::new(&mut options);
    column.set_pre_format("format", "%d");
    assert_eq!(column.pre_format("format"), Some("%d"));
    column.set_pre_format("format", "");
    assert!(options.is_empty());
}

#[test]
fn test_key_column_order_restricted_to_key_columns() {
    let mut options = Map::new();
    let mut key = KeyDisplayOptions::new(&mut options, vec!["id".to_string()]);
    assert!(matches!(
        key.set_column_order(ColumnOrder::SortKeys(vec![SortKey::ascending("title")])),
        Err(WorkbenchError::UnresolvedPathComponent { .. })
    ));
    key.set_column_order(ColumnOrder::SortKeys(vec![SortKey::descending("id")]))
        .unwrap();
    assert_eq!(
        Value::Object(options),
        json!({"column_order": [{"column": "id", "descending": true}]})
    );
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_validate_table_display() {
    let model = load_catalog();
    let body = json!({
        "compact": {"row_order": [{"column": "title"}, "nope"]},
        "detailed": "row_name",
        "compact/brief": "missing_context",
        "entry": {"template_engine": "jinja"},
        "filter": 3
    });
    let diagnostics = contextual_display::validate(
        &model,
        &table_object(&document()),
        tags::TABLE_DISPLAY,
        &body,
    );
    let locations: Vec<_> = diagnostics.iter().map(|d| d.location.as_str()).collect();
    assert_eq!(
        locations,
        vec!["compact.row_order", "compact/brief", "entry", "filter"]
    );
}

#[test]
fn test_validate_key_display_uses_key_columns() {
    let model = load_catalog();
    let key = ObjectRef::Key(document(), ConstraintName::new("public", "Document_pkey"));
    let body = json!({"*": {"column_order": ["id", "title"]}});
    let diagnostics = contextual_display::validate(&model, &key, tags::KEY_DISPLAY, &body);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("title"));
}

#[test]
fn test_validate_display_value_types() {
    let model = load_catalog();
    let body = json!({
        "name": 3,
        "markdown_name": "**Doc**",
        "name_style": {"title_case": "yes", "underline_space": true}
    });
    let diagnostics =
        display::validate(&model, &table_object(&document()), tags::DISPLAY, &body);
    let locations: Vec<_> = diagnostics.iter().map(|d| d.location.as_str()).collect();
    assert_eq!(locations, vec!["name", "name_style.title_case"]);

    let diagnostics = display::validate(
        &model,
        &table_object(&document()),
        tags::DISPLAY,
        &json!({"name_style": true}),
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "true is not an object");
}

#[test]
fn test_validate_foreign_key_comment_display() {
    let model = load_catalog();
    let fk = ObjectRef::ForeignKey(document(), ConstraintName::new("public", "fk1"));
    let body = json!({
        "to_name": "Author",
        "to_comment_display": "popup",
        "from_comment_display": "tooltip"
    });
    let diagnostics = display::validate(&model, &fk, tags::FOREIGN_KEY, &body);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].location, "to_comment_display");
    assert_eq!(
        diagnostics[0].message,
        "unsupported comment display \"popup\""
    );
}

#[test]
fn test_validate_citation_engine_and_wait_for() {
    let model = load_catalog();
    let body = json!({
        "journal_pattern": "{{{title}}}",
        "template_engine": "jinja",
        "wait_for": ["author_name", "ghost"]
    });
    let diagnostics =
        display::validate(&model, &table_object(&document()), tags::CITATION, &body);
    let locations: Vec<_> = diagnostics.iter().map(|d| d.location.as_str()).collect();
    assert_eq!(locations, vec!["template_engine", "wait_for"]);
    assert_eq!(diagnostics[1].message, "Unknown source key: ghost");

    let diagnostics = display::validate(
        &model,
        &table_object(&document()),
        tags::CITATION,
        &json!({"wait_for": "author_name"}),
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].location, "wait_for");
}

#[test]
fn test_shape_registry_validates_display_bodies() {
    let mut model = load_catalog();
    let object = table_object(&document());
    model
        .annotations_mut(&object)
        .unwrap()
        .set(tags::DISPLAY, json!({"name": ["not", "text"]}));
    let diagnostics = ShapeRegistry::with_builtins().validate_object(&model, &object);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].tag, tags::DISPLAY);
    assert_eq!(diagnostics[0].location, "name");
}
