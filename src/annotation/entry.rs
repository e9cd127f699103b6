//! Visible-source entries and the pseudo-column property model

use serde_json::{Map, Value};

use super::path::{source_to_string, SourcePath};
use super::properties::{
    get_choice, get_string_list, set_choice, set_string_list, Choice, CommentDisplay,
    TemplateEngine, Toggle, ENTITY, SELF_LINK, SHOW_FOREIGN_KEY_LINK,
};
use crate::error::WorkbenchError;
use crate::model::ConstraintName;
use crate::util::{edit_nested, get_text, is_empty_value, set_text};

/// Kind of a classified entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Column,
    Constraint,
    Pseudo,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Column => "Column",
            EntryKind::Constraint => "Constraint",
            EntryKind::Pseudo => "Pseudo",
        }
    }
}

/// One entry of a visible-sources list.
///
/// Classification order: a string is a column, a two-string list is a
/// constraint, an object is a pseudo-column. Anything else is malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEntry {
    Column(String),
    Constraint(ConstraintName),
    Pseudo(Map<String, Value>),
}

impl SourceEntry {
    pub fn classify(value: &Value) -> Result<Self, WorkbenchError> {
        match value {
            Value::String(name) => Ok(SourceEntry::Column(name.clone())),
            Value::Object(map) => Ok(SourceEntry::Pseudo(map.clone())),
            _ => ConstraintName::from_value(value)
                .map(SourceEntry::Constraint)
                .ok_or_else(|| WorkbenchError::MalformedEntry {
                    location: "entry".to_string(),
                    detail: format!("{} is neither a column, a constraint nor an object", value),
                }),
        }
    }

    /// Classify without cloning the entry body
    pub fn kind_of(value: &Value) -> Option<EntryKind> {
        match value {
            Value::String(_) => Some(EntryKind::Column),
            Value::Object(_) => Some(EntryKind::Pseudo),
            _ => ConstraintName::from_value(value).map(|_| EntryKind::Constraint),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            SourceEntry::Column(_) => EntryKind::Column,
            SourceEntry::Constraint(_) => EntryKind::Constraint,
            SourceEntry::Pseudo(_) => EntryKind::Pseudo,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            SourceEntry::Column(name) => Value::String(name.clone()),
            SourceEntry::Constraint(name) => name.to_value(),
            SourceEntry::Pseudo(map) => Value::Object(map.clone()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            SourceEntry::Column(name) => Value::String(name),
            SourceEntry::Constraint(name) => name.to_value(),
            SourceEntry::Pseudo(map) => Value::Object(map),
        }
    }

    /// The `(type, source)` row shown in entry listings
    pub fn row(&self) -> (&'static str, String) {
        let source = match self {
            SourceEntry::Column(name) => name.clone(),
            SourceEntry::Constraint(name) => name.name.clone(),
            SourceEntry::Pseudo(map) => pseudo_source_text(map),
        };
        (self.kind().as_str(), source)
    }
}

fn pseudo_source_text(map: &Map<String, Value>) -> String {
    if let Some(source) = map.get("source").filter(|s| !is_empty_value(s)) {
        source_to_string(source)
    } else if let Some(key) = get_text(map, "sourcekey") {
        key.to_string()
    } else {
        "virtual".to_string()
    }
}

/// Aggregate function applied to a set-valued source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Count,
    CountDistinct,
    Array,
    ArrayDistinct,
}

impl Choice for Aggregate {
    const ALL: &'static [Self] = &[
        Aggregate::Min,
        Aggregate::Max,
        Aggregate::Count,
        Aggregate::CountDistinct,
        Aggregate::Array,
        Aggregate::ArrayDistinct,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "cnt",
            Aggregate::CountDistinct => "cnt_d",
            Aggregate::Array => "array",
            Aggregate::ArrayDistinct => "array_d",
        }
    }
}

/// How array values are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayUxMode {
    OrderedList,
    UnorderedList,
    Csv,
    Raw,
}

impl Choice for ArrayUxMode {
    const ALL: &'static [Self] = &[
        ArrayUxMode::OrderedList,
        ArrayUxMode::UnorderedList,
        ArrayUxMode::Csv,
        ArrayUxMode::Raw,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ArrayUxMode::OrderedList => "olist",
            ArrayUxMode::UnorderedList => "ulist",
            ArrayUxMode::Csv => "csv",
            ArrayUxMode::Raw => "raw",
        }
    }
}

/// Editing view over a pseudo-column object owned by its annotation body.
///
/// The view borrows the entry in place, so every setter is immediately
/// visible through the body. Setters follow set-or-delete: empty text, `None`
/// and toggles equal to their default remove the key.
pub struct PseudoColumn<'a> {
    entry: &'a mut Map<String, Value>,
}

impl<'a> PseudoColumn<'a> {
    pub fn new(entry: &'a mut Map<String, Value>) -> Self {
        Self { entry }
    }

    /// View an entry value that must be an object
    pub fn from_value(value: &'a mut Value) -> Result<Self, WorkbenchError> {
        match value {
            Value::Object(entry) => Ok(Self { entry }),
            other => Err(WorkbenchError::MalformedEntry {
                location: "pseudo-column".to_string(),
                detail: format!("{} is not an object", other),
            }),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        self.entry
    }

    /// Neither `source` nor `sourcekey`
    pub fn is_virtual(&self) -> bool {
        self.sourcekey().is_none()
            && self.entry.get("source").map_or(true, is_empty_value)
    }

    pub fn source(&self) -> Option<&Value> {
        self.entry.get("source")
    }

    /// Canonical list form of `source`, with the decode error if any
    pub fn source_path(&self) -> (SourcePath, Option<WorkbenchError>) {
        SourcePath::parse(self.entry.get("source").unwrap_or(&Value::Null))
    }

    pub fn set_source(&mut self, path: &SourcePath) {
        if path.is_empty() {
            self.entry.shift_remove("source");
        } else {
            self.entry.insert("source".to_string(), path.to_value());
        }
    }

    pub fn sourcekey(&self) -> Option<&str> {
        get_text(self.entry, "sourcekey")
    }

    pub fn set_sourcekey(&mut self, key: &str) {
        set_text(self.entry, "sourcekey", key);
    }

    pub fn markdown_name(&self) -> Option<&str> {
        get_text(self.entry, "markdown_name")
    }

    pub fn set_markdown_name(&mut self, text: &str) {
        set_text(self.entry, "markdown_name", text);
    }

    pub fn comment(&self) -> Option<&str> {
        get_text(self.entry, "comment")
    }

    pub fn set_comment(&mut self, text: &str) {
        set_text(self.entry, "comment", text);
    }

    pub fn comment_display(&self) -> Option<CommentDisplay> {
        get_choice(self.entry, "comment_display")
    }

    pub fn set_comment_display(&mut self, mode: Option<CommentDisplay>) {
        set_choice(self.entry, "comment_display", mode);
    }

    pub fn aggregate(&self) -> Option<Aggregate> {
        get_choice(self.entry, "aggregate")
    }

    pub fn set_aggregate(&mut self, aggregate: Option<Aggregate>) {
        set_choice(self.entry, "aggregate", aggregate);
    }

    pub fn entity(&self) -> Toggle {
        ENTITY.get(self.entry)
    }

    pub fn is_entity(&self) -> bool {
        ENTITY.is_enabled(self.entry)
    }

    pub fn set_entity(&mut self, toggle: Toggle) {
        ENTITY.set(self.entry, toggle);
    }

    pub fn self_link(&self) -> Toggle {
        SELF_LINK.get(self.entry)
    }

    pub fn set_self_link(&mut self, toggle: Toggle) {
        SELF_LINK.set(self.entry, toggle);
    }

    fn display(&self) -> Option<&Map<String, Value>> {
        self.entry.get("display").and_then(Value::as_object)
    }

    pub fn markdown_pattern(&self) -> Option<&str> {
        self.display().and_then(|d| get_text(d, "markdown_pattern"))
    }

    pub fn set_markdown_pattern(&mut self, pattern: &str) {
        edit_nested(self.entry, "display", |d| {
            set_text(d, "markdown_pattern", pattern)
        });
    }

    pub fn template_engine(&self) -> Option<TemplateEngine> {
        self.display().and_then(|d| get_choice(d, "template_engine"))
    }

    pub fn set_template_engine(&mut self, engine: Option<TemplateEngine>) {
        edit_nested(self.entry, "display", |d| {
            set_choice(d, "template_engine", engine)
        });
    }

    pub fn wait_for(&self) -> Vec<String> {
        self.display()
            .map(|d| get_string_list(d, "wait_for"))
            .unwrap_or_default()
    }

    pub fn set_wait_for(&mut self, keys: &[String]) {
        edit_nested(self.entry, "display", |d| set_string_list(d, "wait_for", keys));
    }

    pub fn show_foreign_key_link(&self) -> Toggle {
        self.display()
            .map(|d| SHOW_FOREIGN_KEY_LINK.get(d))
            .unwrap_or_default()
    }

    pub fn set_show_foreign_key_link(&mut self, toggle: Toggle) {
        edit_nested(self.entry, "display", |d| {
            SHOW_FOREIGN_KEY_LINK.set(d, toggle)
        });
    }

    pub fn array_ux_mode(&self) -> Option<ArrayUxMode> {
        self.display().and_then(|d| get_choice(d, "array_ux_mode"))
    }

    pub fn set_array_ux_mode(&mut self, mode: Option<ArrayUxMode>) {
        edit_nested(self.entry, "display", |d| {
            set_choice(d, "array_ux_mode", mode)
        });
    }

    /// Normalize the entry before it is persisted.
    ///
    /// Empty `source`, `sourcekey` and `display` members are dropped, and when
    /// both `source` and `sourcekey` are present only `sourcekey` is kept.
    pub fn commit(&mut self) {
        if self.entry.get("source").is_some_and(is_empty_value) {
            self.entry.shift_remove("source");
        }
        if self
            .entry
            .get("sourcekey")
            .is_some_and(|k| k.as_str().map_or(false, str::is_empty))
        {
            self.entry.shift_remove("sourcekey");
        }
        if self.sourcekey().is_some() {
            self.entry.shift_remove("source");
        }
        if self.entry.get("display").is_some_and(is_empty_value) {
            self.entry.shift_remove("display");
        }
    }
}
