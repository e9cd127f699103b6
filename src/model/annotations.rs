//! Per-object annotation store
//!
//! Maps annotation tags to JSON bodies. Reading never inserts: a tag is
//! present only once an editor is about to mutate it (`ensure`) or it came
//! from the catalog document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorkbenchError;

/// Annotation tag → body mapping owned by one model object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore(Map<String, Value>);

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The body stored under `tag`, or `None` when the tag is absent
    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.0.get(tag)
    }

    pub fn get_mut(&mut self, tag: &str) -> Option<&mut Value> {
        self.0.get_mut(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    /// Return the body under `tag`, creating it with `default` first if absent.
    ///
    /// Only call this at the point a mutation is about to happen.
    pub fn ensure<F>(&mut self, tag: &str, default: F) -> &mut Value
    where
        F: FnOnce() -> Value,
    {
        self.0.entry(tag).or_insert_with(default)
    }

    /// Replace (or insert) the body under `tag`
    pub fn set(&mut self, tag: &str, body: Value) {
        self.0.insert(tag.to_string(), body);
    }

    /// Run `edit` on the object body under `tag`.
    ///
    /// An absent tag is edited as an empty object that is stored only if the
    /// edit succeeds and leaves something behind, so a failed edit never
    /// creates a placeholder body.
    pub fn edit_object<R>(
        &mut self,
        tag: &str,
        edit: impl FnOnce(&mut Map<String, Value>) -> Result<R, WorkbenchError>,
    ) -> Result<R, WorkbenchError> {
        match self.0.get_mut(tag) {
            Some(Value::Object(body)) => edit(body),
            Some(other) => Err(WorkbenchError::MalformedEntry {
                location: tag.to_string(),
                detail: format!("{} is not an object", other),
            }),
            None => {
                let mut body = Map::new();
                let result = edit(&mut body)?;
                if !body.is_empty() {
                    self.0.insert(tag.to_string(), Value::Object(body));
                }
                Ok(result)
            }
        }
    }

    /// Remove the tag; a missing tag is a no-op.
    pub fn delete(&mut self, tag: &str) -> Option<Value> {
        self.0.shift_remove(tag)
    }

    /// Tags actually present, in document order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AnnotationStore {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
