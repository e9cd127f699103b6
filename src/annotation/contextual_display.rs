//! Per-context options of table-display, column-display and key-display

use serde_json::{Map, Value};

use super::contexts::WELL_KNOWN;
use super::properties::{
    flag, get_choice, set_template_engine_text, Choice, SortKey, SortKeys, TemplateEngine, Toggle,
    ToggleField,
};
use super::shapes::Diagnostic;
use super::tags;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ObjectRef};
use crate::util::{edit_nested, get_text, set_or_remove, set_text};

pub const COLLAPSE_TOC_PANEL: ToggleField = flag("collapse_toc_panel");
pub const HIDE_COLUMN_HEADERS: ToggleField = flag("hide_column_headers");

/// Text properties of a table-display context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePattern {
    Page,
    Row,
    Separator,
    Prefix,
    Suffix,
}

impl TablePattern {
    pub fn key(self) -> &'static str {
        match self {
            TablePattern::Page => "page_markdown_pattern",
            TablePattern::Row => "row_markdown_pattern",
            TablePattern::Separator => "separator_pattern",
            TablePattern::Prefix => "prefix_pattern",
            TablePattern::Suffix => "suffix_pattern",
        }
    }
}

/// One context of a `table-display` body
pub struct TableDisplayOptions<'a> {
    options: &'a mut Map<String, Value>,
}

impl<'a> TableDisplayOptions<'a> {
    pub fn new(options: &'a mut Map<String, Value>) -> Self {
        Self { options }
    }

    pub fn row_order(&mut self) -> SortKeys<'_> {
        SortKeys::new(self.options, "row_order")
    }

    pub fn pattern(&self, pattern: TablePattern) -> Option<&str> {
        get_text(self.options, pattern.key())
    }

    pub fn set_pattern(&mut self, pattern: TablePattern, text: &str) {
        set_text(self.options, pattern.key(), text);
    }

    pub fn template_engine(&self) -> Option<TemplateEngine> {
        get_choice(self.options, "template_engine")
    }

    pub fn set_template_engine(&mut self, engine: &str) {
        set_template_engine_text(self.options, engine);
    }

    pub fn page_size(&self) -> Option<u64> {
        self.options.get("page_size").and_then(Value::as_u64)
    }

    pub fn set_page_size(&mut self, size: Option<u64>) {
        set_or_remove(
            self.options,
            size.is_some(),
            "page_size",
            Value::from(size.unwrap_or_default()),
        );
    }

    pub fn flag(&self, field: ToggleField) -> bool {
        field.is_enabled(self.options)
    }

    pub fn set_flag(&mut self, field: ToggleField, enabled: bool) {
        field.set(self.options, Toggle::from_bool(enabled));
    }
}

/// `column_order` of column-display and key-display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnOrder {
    /// Absent: the catalog's default ordering
    Default,
    /// `false`: sorting disabled
    Disabled,
    SortKeys(Vec<SortKey>),
}

fn get_column_order(options: &Map<String, Value>) -> ColumnOrder {
    match options.get("column_order") {
        Some(Value::Bool(false)) => ColumnOrder::Disabled,
        Some(Value::Array(items)) => {
            ColumnOrder::SortKeys(items.iter().filter_map(SortKey::from_value).collect())
        }
        _ => ColumnOrder::Default,
    }
}

fn set_column_order(options: &mut Map<String, Value>, order: ColumnOrder) {
    match order {
        ColumnOrder::Default => {
            options.shift_remove("column_order");
        }
        ColumnOrder::Disabled => {
            options.insert("column_order".to_string(), Value::Bool(false));
        }
        ColumnOrder::SortKeys(keys) => set_or_remove(
            options,
            !keys.is_empty(),
            "column_order",
            Value::Array(keys.iter().map(SortKey::to_value).collect()),
        ),
    }
}

/// One context of a `column-display` body
pub struct ColumnDisplayOptions<'a> {
    options: &'a mut Map<String, Value>,
}

impl<'a> ColumnDisplayOptions<'a> {
    pub fn new(options: &'a mut Map<String, Value>) -> Self {
        Self { options }
    }

    pub fn markdown_pattern(&self) -> Option<&str> {
        get_text(self.options, "markdown_pattern")
    }

    pub fn set_markdown_pattern(&mut self, pattern: &str) {
        set_text(self.options, "markdown_pattern", pattern);
    }

    pub fn template_engine(&self) -> Option<TemplateEngine> {
        get_choice(self.options, "template_engine")
    }

    pub fn set_template_engine(&mut self, engine: &str) {
        set_template_engine_text(self.options, engine);
    }

    pub fn column_order(&self) -> ColumnOrder {
        get_column_order(self.options)
    }

    pub fn set_column_order(&mut self, order: ColumnOrder) {
        set_column_order(self.options, order);
    }

    /// `pre_format.format`, `bool_true_value` or `bool_false_value`
    pub fn pre_format(&self, key: &str) -> Option<&str> {
        self.options
            .get("pre_format")
            .and_then(Value::as_object)
            .and_then(|pre| get_text(pre, key))
    }

    pub fn set_pre_format(&mut self, key: &str, text: &str) {
        edit_nested(self.options, "pre_format", |pre| set_text(pre, key, text));
    }
}

/// One context of a `key-display` body
pub struct KeyDisplayOptions<'a> {
    options: &'a mut Map<String, Value>,
    key_columns: Vec<String>,
}

impl<'a> KeyDisplayOptions<'a> {
    pub fn new(options: &'a mut Map<String, Value>, key_columns: Vec<String>) -> Self {
        Self {
            options,
            key_columns,
        }
    }

    pub fn markdown_pattern(&self) -> Option<&str> {
        get_text(self.options, "markdown_pattern")
    }

    pub fn set_markdown_pattern(&mut self, pattern: &str) {
        set_text(self.options, "markdown_pattern", pattern);
    }

    pub fn template_engine(&self) -> Option<TemplateEngine> {
        get_choice(self.options, "template_engine")
    }

    pub fn set_template_engine(&mut self, engine: &str) {
        set_template_engine_text(self.options, engine);
    }

    pub fn column_order(&self) -> ColumnOrder {
        get_column_order(self.options)
    }

    /// Sort keys may only name the key's own columns
    pub fn set_column_order(&mut self, order: ColumnOrder) -> Result<(), WorkbenchError> {
        if let ColumnOrder::SortKeys(keys) = &order {
            if let Some(key) = keys.iter().find(|k| !self.key_columns.contains(&k.column)) {
                return Err(WorkbenchError::UnresolvedPathComponent {
                    component: key.column.clone(),
                    context: "key columns".to_string(),
                });
            }
        }
        set_column_order(self.options, order);
        Ok(())
    }
}

/// Check every context of a per-context options body
pub fn validate(
    model: &CatalogModel,
    object: &ObjectRef,
    tag: &str,
    body: &Value,
) -> Vec<Diagnostic> {
    let diagnostic = |location: &str, message: String| Diagnostic {
        object: object.clone(),
        tag: tag.to_string(),
        location: location.to_string(),
        message,
    };
    let Some(contexts) = body.as_object() else {
        return vec![diagnostic("", format!("{} is not a context mapping", body))];
    };

    // sort keys must name columns of the owning table, or of the key
    let columns: Option<Vec<String>> = match object {
        ObjectRef::Key(table, name) => model
            .table(table)
            .and_then(|t| t.key(name))
            .map(|k| k.unique_columns.clone()),
        _ => object
            .table()
            .and_then(|t| model.table(t))
            .map(|t| t.column_names().map(str::to_string).collect()),
    };
    let sort_property = if tag == tags::TABLE_DISPLAY {
        "row_order"
    } else {
        "column_order"
    };

    let mut diagnostics = Vec::new();
    for (context, options) in contexts {
        if let Some(alias) = options.as_str() {
            if !contexts.contains_key(alias) && !WELL_KNOWN.contains(&alias) {
                diagnostics.push(diagnostic(
                    context,
                    format!("alias of undefined context {}", alias),
                ));
            }
            continue;
        }
        let Some(options) = options.as_object() else {
            diagnostics.push(diagnostic(
                context,
                format!("{} is not an options object", options),
            ));
            continue;
        };
        if let (Some(columns), Some(Value::Array(keys))) = (&columns, options.get(sort_property)) {
            for key in keys.iter().filter_map(SortKey::from_value) {
                if !columns.contains(&key.column) {
                    diagnostics.push(diagnostic(
                        &format!("{}.{}", context, sort_property),
                        format!("unknown sort column {}", key.column),
                    ));
                }
            }
        }
        if let Some(engine) = options.get("template_engine") {
            if engine
                .as_str()
                .and_then(TemplateEngine::parse)
                .is_none()
            {
                diagnostics.push(diagnostic(
                    context,
                    format!("unsupported template engine {}", engine),
                ));
            }
        }
    }
    diagnostics
}
