//! Named contexts inside one annotation body
//!
//! List-valued annotations (visible-columns, visible-foreign-keys) map each
//! context to an ordered entry list, except `filter` whose list lives under
//! `{"and": [...]}`. Object-valued annotations (table-display, column-display,
//! key-display) map each context to one options object.

use serde_json::{json, Map, Value};

use crate::error::WorkbenchError;

/// Context name with the `{"and": [...]}` body shape
pub const FILTER: &str = "filter";

/// Contexts offered when creating a new one
pub const WELL_KNOWN: &[&str] = &[
    "*",
    "compact",
    "compact/brief",
    "compact/select",
    "detailed",
    "entry",
    "entry/create",
    "entry/edit",
    FILTER,
    "row_name",
];

/// Shape of each context's body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextShape {
    Entries,
    Options,
}

/// Read-only view of a context's entry list
pub fn context_entries<'b>(
    body: &'b Map<String, Value>,
    name: &str,
) -> Result<&'b Vec<Value>, WorkbenchError> {
    let value = body.get(name).ok_or_else(|| WorkbenchError::UnknownContext {
        name: name.to_string(),
    })?;
    let list = if name == FILTER {
        value.get("and")
    } else {
        Some(value)
    };
    list.and_then(Value::as_array)
        .ok_or_else(|| not_a_list(name, value))
}

fn not_a_list(name: &str, value: &Value) -> WorkbenchError {
    WorkbenchError::MalformedEntry {
        location: format!("context {}", name),
        detail: format!("{} is not an entry list", value),
    }
}

/// Editing view over the contexts of an annotation body
pub struct ContextDocument<'a> {
    body: &'a mut Map<String, Value>,
    shape: ContextShape,
}

impl<'a> ContextDocument<'a> {
    pub fn new(body: &'a mut Map<String, Value>, shape: ContextShape) -> Self {
        Self { body, shape }
    }

    pub fn from_value(body: &'a mut Value, shape: ContextShape) -> Result<Self, WorkbenchError> {
        match body {
            Value::Object(body) => Ok(Self::new(body, shape)),
            other => Err(WorkbenchError::MalformedEntry {
                location: "annotation body".to_string(),
                detail: format!("{} is not a context mapping", other),
            }),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.body.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.body.contains_key(name)
    }

    /// Add an empty context.
    ///
    /// Names are compared exactly and case-sensitively.
    pub fn create_context(&mut self, name: &str) -> Result<(), WorkbenchError> {
        if name.is_empty() {
            return Err(WorkbenchError::InvalidContextName {
                name: name.to_string(),
            });
        }
        if self.contains(name) {
            return Err(WorkbenchError::DuplicateContext {
                name: name.to_string(),
            });
        }
        let empty = match self.shape {
            ContextShape::Entries if name == FILTER => json!({ "and": [] }),
            ContextShape::Entries => json!([]),
            ContextShape::Options => json!({}),
        };
        self.body.insert(name.to_string(), empty);
        Ok(())
    }

    /// Remove a context with everything in it, returning its body
    pub fn remove_context(&mut self, name: &str) -> Result<Value, WorkbenchError> {
        self.body
            .shift_remove(name)
            .ok_or_else(|| WorkbenchError::UnknownContext {
                name: name.to_string(),
            })
    }

    pub fn entries(&self, name: &str) -> Result<&Vec<Value>, WorkbenchError> {
        context_entries(self.body, name)
    }

    pub fn entries_mut(&mut self, name: &str) -> Result<&mut Vec<Value>, WorkbenchError> {
        let value = self
            .body
            .get_mut(name)
            .ok_or_else(|| WorkbenchError::UnknownContext {
                name: name.to_string(),
            })?;
        let detail = format!("{} is not an entry list", value);
        let list = if name == FILTER {
            value.get_mut("and")
        } else {
            Some(value)
        };
        list.and_then(Value::as_array_mut)
            .ok_or_else(|| WorkbenchError::MalformedEntry {
                location: format!("context {}", name),
                detail,
            })
    }

    /// Append an entry, returning its index
    pub fn append(&mut self, name: &str, entry: Value) -> Result<usize, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        entries.push(entry);
        Ok(entries.len() - 1)
    }

    pub fn remove(&mut self, name: &str, index: usize) -> Result<Value, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        check_index(name, index, entries.len())?;
        Ok(entries.remove(index))
    }

    /// Replace an entry in place, returning the previous one
    pub fn replace(
        &mut self,
        name: &str,
        index: usize,
        entry: Value,
    ) -> Result<Value, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        check_index(name, index, entries.len())?;
        Ok(std::mem::replace(&mut entries[index], entry))
    }

    /// Append a deep copy of an entry, returning the copy's index
    pub fn duplicate(&mut self, name: &str, index: usize) -> Result<usize, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        check_index(name, index, entries.len())?;
        let copy = entries[index].clone();
        entries.push(copy);
        Ok(entries.len() - 1)
    }

    /// Swap an entry with its predecessor; the first entry stays put
    pub fn move_up(&mut self, name: &str, index: usize) -> Result<usize, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        check_index(name, index, entries.len())?;
        if index == 0 {
            return Ok(0);
        }
        entries.swap(index - 1, index);
        Ok(index - 1)
    }

    /// Swap an entry with its successor; the last entry stays put
    pub fn move_down(&mut self, name: &str, index: usize) -> Result<usize, WorkbenchError> {
        let entries = self.entries_mut(name)?;
        check_index(name, index, entries.len())?;
        if index + 1 == entries.len() {
            return Ok(index);
        }
        entries.swap(index, index + 1);
        Ok(index + 1)
    }

    /// Options object of a context of an object-valued annotation
    pub fn options_mut(&mut self, name: &str) -> Result<&mut Map<String, Value>, WorkbenchError> {
        let value = self
            .body
            .get_mut(name)
            .ok_or_else(|| WorkbenchError::UnknownContext {
                name: name.to_string(),
            })?;
        let detail = format!("{} is not an options object", value);
        value
            .as_object_mut()
            .ok_or_else(|| WorkbenchError::MalformedEntry {
                location: format!("context {}", name),
                detail,
            })
    }
}

fn check_index(name: &str, index: usize, len: usize) -> Result<(), WorkbenchError> {
    if index < len {
        Ok(())
    } else {
        Err(WorkbenchError::EntryIndexOutOfRange {
            context: name.to_string(),
            index,
            len,
        })
    }
}
