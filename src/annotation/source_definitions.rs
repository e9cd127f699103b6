//! Table-scoped registry of reusable source keys
//!
//! Body shape:
//!
//! ```json
//! {
//!   "columns": true,
//!   "fkeys": [["public", "fk1"]],
//!   "sources": {
//!     "authors": {"source": [{"inbound": ["public", "fk2"]}, "id"]},
//!     "search-box": {"or": [{"source": "title", "markdown_name": "Title"}]}
//!   }
//! }
//! ```

use serde_json::{json, Map, Value};

use super::entry::PseudoColumn;
use super::tags;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ConstraintName, ObjectRef, TableRef};
use crate::util::{edit_nested, get_text};

/// Reserved source key of the search-box disjunction
pub const SEARCH_BOX: &str = "search-box";

/// `columns` / `fkeys` selection; absent reads as `All`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Subset(Vec<T>),
}

/// One disjunct of the search box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchColumn {
    pub column: String,
    pub markdown_name: Option<String>,
}

fn not_an(location: &str, value: &Value, expected: &str) -> WorkbenchError {
    WorkbenchError::MalformedEntry {
        location: location.to_string(),
        detail: format!("{} is not {}", value, expected),
    }
}

/// A definition body in its committed pseudo-column form
fn committed_entry(key: &str, mut entry: Value) -> Result<Value, WorkbenchError> {
    match &mut entry {
        Value::Object(map) => PseudoColumn::new(map).commit(),
        other => {
            return Err(not_an(
                &format!("sources.{}", key),
                other,
                "a pseudo-column object",
            ))
        }
    }
    Ok(entry)
}

/// Editing view over a source-definitions body.
///
/// Holds the table's column names so key collisions can be checked without
/// borrowing the model while its annotations are being edited.
pub struct SourceDefinitions<'a> {
    body: &'a mut Map<String, Value>,
    column_names: Vec<String>,
}

impl<'a> SourceDefinitions<'a> {
    pub fn new(body: &'a mut Map<String, Value>, column_names: Vec<String>) -> Self {
        Self { body, column_names }
    }

    pub fn from_value(
        body: &'a mut Value,
        column_names: Vec<String>,
    ) -> Result<Self, WorkbenchError> {
        match body {
            Value::Object(body) => Ok(Self::new(body, column_names)),
            other => Err(WorkbenchError::MalformedEntry {
                location: "source-definitions".to_string(),
                detail: format!("{} is not an object", other),
            }),
        }
    }

    pub fn columns(&self) -> Selection<String> {
        match self.body.get("columns") {
            Some(Value::Array(items)) => Selection::Subset(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => Selection::All,
        }
    }

    pub fn set_columns(&mut self, selection: Selection<String>) {
        let value = match selection {
            Selection::All => Value::Bool(true),
            Selection::Subset(columns) => json!(columns),
        };
        self.body.insert("columns".to_string(), value);
    }

    pub fn fkeys(&self) -> Selection<ConstraintName> {
        match self.body.get("fkeys") {
            Some(Value::Array(items)) => Selection::Subset(
                items.iter().filter_map(ConstraintName::from_value).collect(),
            ),
            _ => Selection::All,
        }
    }

    pub fn set_fkeys(&mut self, selection: Selection<ConstraintName>) {
        let value = match selection {
            Selection::All => Value::Bool(true),
            Selection::Subset(names) => {
                Value::Array(names.iter().map(ConstraintName::to_value).collect())
            }
        };
        self.body.insert("fkeys".to_string(), value);
    }

    /// Edits need `sources` to be an object when it is present
    fn check_sources(&self) -> Result<(), WorkbenchError> {
        match self.body.get("sources") {
            None | Some(Value::Object(_)) => Ok(()),
            Some(other) => Err(not_an("sources", other, "an object")),
        }
    }

    fn sources(&self) -> Option<&Map<String, Value>> {
        self.body.get("sources").and_then(Value::as_object)
    }

    /// Source keys in document order, without the search box
    pub fn source_keys(&self) -> Vec<String> {
        self.sources()
            .map(|s| {
                s.keys()
                    .filter(|k| k.as_str() != SEARCH_BOX)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sources().is_some_and(|s| s.contains_key(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.sources().and_then(|s| s.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.body
            .get_mut("sources")
            .and_then(Value::as_object_mut)
            .and_then(|s| s.get_mut(key))
    }

    /// Whether `key` may be added as a new source key
    pub fn check_key(&self, key: &str) -> Result<(), WorkbenchError> {
        if key.is_empty() {
            return Err(WorkbenchError::InvalidSourceKey {
                key: key.to_string(),
            });
        }
        if key == SEARCH_BOX || self.column_names.iter().any(|c| c == key) || self.contains(key)
        {
            return Err(WorkbenchError::DuplicateKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    pub fn add(&mut self, key: &str, entry: Value) -> Result<(), WorkbenchError> {
        self.check_sources()?;
        self.check_key(key)?;
        let entry = committed_entry(key, entry)?;
        edit_nested(self.body, "sources", |sources| {
            sources.insert(key.to_string(), entry);
        });
        Ok(())
    }

    /// Remove a source; the `sources` member goes with its last source
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if !self.contains(key) {
            return None;
        }
        edit_nested(self.body, "sources", |sources| sources.shift_remove(key))
    }

    /// Commit an edit of `old_key`: store `entry` under `new_key` at the same
    /// position. Nothing changes unless the whole edit is valid.
    pub fn replace(
        &mut self,
        old_key: &str,
        new_key: &str,
        entry: Value,
    ) -> Result<(), WorkbenchError> {
        self.check_sources()?;
        if !self.contains(old_key) || old_key == SEARCH_BOX {
            return Err(WorkbenchError::UnknownSourceKey {
                key: old_key.to_string(),
            });
        }
        if new_key != old_key {
            self.check_key(new_key)?;
        }
        let entry = committed_entry(new_key, entry)?;

        edit_nested(self.body, "sources", |sources| {
            let previous = std::mem::take(sources);
            let mut entry = Some(entry);
            for (key, value) in previous {
                if key == old_key {
                    if let Some(entry) = entry.take() {
                        sources.insert(new_key.to_string(), entry);
                    }
                } else {
                    sources.insert(key, value);
                }
            }
        });
        Ok(())
    }

    /// Move a source to a new key, keeping its body
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> Result<(), WorkbenchError> {
        let entry = self
            .get(old_key)
            .cloned()
            .ok_or_else(|| WorkbenchError::UnknownSourceKey {
                key: old_key.to_string(),
            })?;
        self.replace(old_key, new_key, entry)
    }

    /// Copy a source under the first free `<key>_copy_<n>`
    pub fn duplicate(&mut self, key: &str) -> Result<String, WorkbenchError> {
        let entry = self
            .get(key)
            .filter(|_| key != SEARCH_BOX)
            .cloned()
            .ok_or_else(|| WorkbenchError::UnknownSourceKey {
                key: key.to_string(),
            })?;
        let copy = (1..)
            .map(|n| format!("{}_copy_{}", key, n))
            .find(|candidate| self.check_key(candidate).is_ok())
            .unwrap_or_default();
        self.add(&copy, entry)?;
        Ok(copy)
    }

    pub fn search_columns(&self) -> Vec<SearchColumn> {
        self.get(SEARCH_BOX)
            .and_then(|s| s.get("or"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(|item| {
                        Some(SearchColumn {
                            column: item.get("source")?.as_str()?.to_string(),
                            markdown_name: get_text(item, "markdown_name").map(str::to_string),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_search_column(&mut self, column: SearchColumn) -> Result<(), WorkbenchError> {
        self.check_sources()?;
        if let Some(value) = self.get(SEARCH_BOX) {
            let Some(search) = value.as_object() else {
                return Err(not_an(SEARCH_BOX, value, "an object"));
            };
            if let Some(or) = search.get("or").filter(|or| !or.is_array()) {
                return Err(not_an(&format!("{}.or", SEARCH_BOX), or, "a list"));
            }
        }
        if !self.column_names.iter().any(|c| *c == column.column) {
            return Err(WorkbenchError::UnresolvedPathComponent {
                component: column.column,
                context: SEARCH_BOX.to_string(),
            });
        }
        let mut item = Map::new();
        item.insert("source".to_string(), Value::String(column.column));
        if let Some(name) = column.markdown_name.filter(|n| !n.is_empty()) {
            item.insert("markdown_name".to_string(), Value::String(name));
        }

        edit_nested(self.body, "sources", |sources| {
            edit_nested(sources, SEARCH_BOX, |search| {
                match search.get_mut("or") {
                    Some(Value::Array(items)) => items.push(Value::Object(item)),
                    _ => {
                        search.insert("or".to_string(), json!([item]));
                    }
                }
            })
        });
        Ok(())
    }

    /// Remove a disjunct; the search box goes with its last disjunct
    pub fn remove_search_column(&mut self, index: usize) -> Option<Value> {
        edit_nested(self.body, "sources", |sources| {
            let removed = match sources.get_mut(SEARCH_BOX).and_then(|s| s.get_mut("or")) {
                Some(Value::Array(items)) if index < items.len() => Some(items.remove(index)),
                _ => None,
            };
            let now_empty = sources
                .get(SEARCH_BOX)
                .and_then(|s| s.get("or"))
                .and_then(Value::as_array)
                .is_some_and(Vec::is_empty);
            if now_empty {
                sources.shift_remove(SEARCH_BOX);
            }
            removed
        })
    }
}

/// Run an edit on a table's source definitions.
///
/// The annotation is created only if the edit succeeds and leaves content.
pub fn edit_source_definitions<R>(
    model: &mut CatalogModel,
    table: &TableRef,
    edit: impl FnOnce(&mut SourceDefinitions<'_>) -> Result<R, WorkbenchError>,
) -> Result<R, WorkbenchError> {
    let column_names = model
        .require_table(table)?
        .column_names()
        .map(str::to_string)
        .collect::<Vec<_>>();
    model
        .annotations_mut(&ObjectRef::Table(table.clone()))?
        .edit_object(tags::SOURCE_DEFINITIONS, |body| {
            edit(&mut SourceDefinitions::new(body, column_names))
        })
}
