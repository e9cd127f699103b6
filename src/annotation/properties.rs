//! Property helpers shared by the annotation editors
//!
//! Everything here writes with set-or-delete semantics: a default or empty
//! value removes the key, so "explicitly default" and "unset" are stored the
//! same way.

use serde_json::{json, Map, Value};

use crate::util::set_or_remove;

/// A closed set of string choices stored as a JSON string
pub trait Choice: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

/// Read a choice property; unknown strings read as absent
pub fn get_choice<C: Choice>(container: &Map<String, Value>, key: &str) -> Option<C> {
    container.get(key).and_then(Value::as_str).and_then(C::parse)
}

/// Write a choice property; `None` removes it
pub fn set_choice<C: Choice>(container: &mut Map<String, Value>, key: &str, choice: Option<C>) {
    match choice {
        Some(c) => {
            container.insert(key.to_string(), Value::String(c.as_str().to_string()));
        }
        None => {
            container.shift_remove(key);
        }
    }
}

/// Template engine for markdown patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateEngine {
    Handlebars,
    Mustache,
}

impl Choice for TemplateEngine {
    const ALL: &'static [Self] = &[TemplateEngine::Handlebars, TemplateEngine::Mustache];

    fn as_str(self) -> &'static str {
        match self {
            TemplateEngine::Handlebars => "handlebars",
            TemplateEngine::Mustache => "mustache",
        }
    }
}

/// How a comment is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDisplay {
    Inline,
    Tooltip,
}

impl Choice for CommentDisplay {
    const ALL: &'static [Self] = &[CommentDisplay::Inline, CommentDisplay::Tooltip];

    fn as_str(self) -> &'static str {
        match self {
            CommentDisplay::Inline => "inline",
            CommentDisplay::Tooltip => "tooltip",
        }
    }
}

/// Set `template_engine` from free text: only known engines are stored
pub fn set_template_engine_text(container: &mut Map<String, Value>, text: &str) {
    set_choice(container, "template_engine", TemplateEngine::parse(text));
}

/// Three-valued boolean property: absent, explicitly on, explicitly off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    #[default]
    Inherit,
    Enabled,
    Disabled,
}

impl Toggle {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Toggle::Enabled
        } else {
            Toggle::Disabled
        }
    }

    /// Effective value given the field's default
    pub fn resolve(self, default: bool) -> bool {
        match self {
            Toggle::Inherit => default,
            Toggle::Enabled => true,
            Toggle::Disabled => false,
        }
    }
}

/// A boolean property and the value it takes when absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleField {
    pub key: &'static str,
    pub default: bool,
}

/// `entity`: on unless explicitly `false`
pub const ENTITY: ToggleField = ToggleField {
    key: "entity",
    default: true,
};

/// `self_link`: off unless explicitly `true`
pub const SELF_LINK: ToggleField = ToggleField {
    key: "self_link",
    default: false,
};

/// `display.show_foreign_key_link`: on unless explicitly `false`
pub const SHOW_FOREIGN_KEY_LINK: ToggleField = ToggleField {
    key: "show_foreign_key_link",
    default: true,
};

/// Flags stored only when set (`collapse_toc_panel`, `name_style.*`, ...)
pub const fn flag(key: &'static str) -> ToggleField {
    ToggleField {
        key,
        default: false,
    }
}

impl ToggleField {
    pub fn get(self, container: &Map<String, Value>) -> Toggle {
        match container.get(self.key).and_then(Value::as_bool) {
            Some(value) => Toggle::from_bool(value),
            None => Toggle::Inherit,
        }
    }

    pub fn is_enabled(self, container: &Map<String, Value>) -> bool {
        self.get(container).resolve(self.default)
    }

    /// Store the toggle; a value equal to the field default is not stored.
    pub fn set(self, container: &mut Map<String, Value>, toggle: Toggle) {
        let store = match toggle {
            Toggle::Inherit => None,
            Toggle::Enabled if self.default => None,
            Toggle::Disabled if !self.default => None,
            Toggle::Enabled => Some(true),
            Toggle::Disabled => Some(false),
        };
        set_or_remove(
            container,
            store.is_some(),
            self.key,
            Value::Bool(store.unwrap_or(self.default)),
        );
    }
}

/// Read a list of strings, ignoring non-string members
pub fn get_string_list(container: &Map<String, Value>, key: &str) -> Vec<String> {
    container
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Write a list of strings; the empty list removes the key
pub fn set_string_list(container: &mut Map<String, Value>, key: &str, values: &[String]) {
    set_or_remove(container, !values.is_empty(), key, json!(values));
}

/// One sort key: a column and its direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Bare strings are accepted as ascending keys
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(column) => Some(Self::ascending(column)),
            Value::Object(map) => Some(Self {
                column: map.get("column")?.as_str()?.to_string(),
                descending: map
                    .get("descending")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            }),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        if self.descending {
            json!({ "column": self.column, "descending": true })
        } else {
            json!({ "column": self.column })
        }
    }
}

/// Sort keys stored under `key` of `container`
pub struct SortKeys<'a> {
    container: &'a mut Map<String, Value>,
    key: &'static str,
}

impl<'a> SortKeys<'a> {
    pub fn new(container: &'a mut Map<String, Value>, key: &'static str) -> Self {
        Self { container, key }
    }

    pub fn keys(&self) -> Vec<SortKey> {
        self.container
            .get(self.key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(SortKey::from_value).collect())
            .unwrap_or_default()
    }

    /// Append a key, creating the list on first push
    pub fn push(&mut self, key: SortKey) {
        match self.container.get_mut(self.key) {
            Some(Value::Array(items)) => items.push(key.to_value()),
            _ => {
                self.container
                    .insert(self.key.to_string(), Value::Array(vec![key.to_value()]));
            }
        }
    }

    /// Remove the last key; removing the last one removes the property
    pub fn pop(&mut self) -> Option<SortKey> {
        let (popped, now_empty) = match self.container.get_mut(self.key) {
            Some(Value::Array(items)) => {
                let popped = items.pop().and_then(|v| SortKey::from_value(&v));
                (popped, items.is_empty())
            }
            _ => return None,
        };
        if now_empty {
            self.container.shift_remove(self.key);
        }
        popped
    }
}
