//! Catalog model representation

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorkbenchError;

use super::{AnnotationStore, ObjectRef, SchemaElement, TableElement, TableRef};

/// A snapshot of the catalog's table graph and its annotations.
///
/// The graph (schemas, tables, columns, keys, foreign keys) is treated as
/// immutable for the length of an editing session; only annotation bodies are
/// edited in place. A refresh replaces the whole snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogModel {
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// SHA-256 of the document this snapshot was built from
    #[serde(skip)]
    pub(crate) fingerprint: String,
}

impl CatalogModel {
    /// Parse a catalog schema document and build the derived indexes
    pub fn from_json(text: &str) -> Result<Self, WorkbenchError> {
        let model: CatalogModel = serde_json::from_str(text)
            .map_err(|source| WorkbenchError::ModelParseError { source })?;
        Ok(super::build_model(model, text.as_bytes()))
    }

    /// Build from an already-decoded document
    pub fn from_value(value: Value) -> Result<Self, WorkbenchError> {
        let text = value.to_string();
        let model: CatalogModel = serde_json::from_value(value)
            .map_err(|source| WorkbenchError::ModelParseError { source })?;
        Ok(super::build_model(model, text.as_bytes()))
    }

    /// Read a catalog schema document from disk
    pub fn load(path: &Path) -> Result<Self, WorkbenchError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| WorkbenchError::ModelReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_json(&content)
    }

    /// Serialize back to the catalog's document form
    pub fn to_json(&self) -> Result<String, WorkbenchError> {
        serde_json::to_string_pretty(self)
            .map_err(|source| WorkbenchError::ModelEncodeError { source })
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkbenchError> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|e| WorkbenchError::ModelWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Identity of the snapshot; resolutions computed against a different
    /// fingerprint are stale.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaElement> {
        self.schemas.get(name)
    }

    pub fn table(&self, table: &TableRef) -> Option<&TableElement> {
        self.schemas.get(&table.schema)?.tables.get(&table.table)
    }

    pub fn table_mut(&mut self, table: &TableRef) -> Option<&mut TableElement> {
        self.schemas
            .get_mut(&table.schema)?
            .tables
            .get_mut(&table.table)
    }

    /// Look up a table, failing with `UnknownObject`
    pub fn require_table(&self, table: &TableRef) -> Result<&TableElement, WorkbenchError> {
        self.table(table).ok_or_else(|| WorkbenchError::UnknownObject {
            object: table.to_string(),
        })
    }

    /// All tables across all schemas
    pub fn tables(&self) -> impl Iterator<Item = &TableElement> {
        self.schemas.values().flat_map(|s| s.tables.values())
    }

    /// Whether the handle names an object of this snapshot
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.annotations(object).is_ok()
    }

    /// The annotation store of any annotatable object
    pub fn annotations(&self, object: &ObjectRef) -> Result<&AnnotationStore, WorkbenchError> {
        let found = match object {
            ObjectRef::Catalog => Some(&self.annotations),
            ObjectRef::Schema(name) => self.schemas.get(name).map(|s| &s.annotations),
            ObjectRef::Table(t) => self.table(t).map(|t| &t.annotations),
            ObjectRef::Column(t, c) => self
                .table(t)
                .and_then(|t| t.column(c))
                .map(|c| &c.annotations),
            ObjectRef::Key(t, k) => self.table(t).and_then(|t| t.key(k)).map(|k| &k.annotations),
            ObjectRef::ForeignKey(t, k) => self
                .table(t)
                .and_then(|t| t.foreign_key(k))
                .map(|fk| &fk.annotations),
        };
        found.ok_or_else(|| WorkbenchError::UnknownObject {
            object: object.to_string(),
        })
    }

    pub fn annotations_mut(
        &mut self,
        object: &ObjectRef,
    ) -> Result<&mut AnnotationStore, WorkbenchError> {
        let found = match object {
            ObjectRef::Catalog => Some(&mut self.annotations),
            ObjectRef::Schema(name) => self.schemas.get_mut(name).map(|s| &mut s.annotations),
            ObjectRef::Table(t) => self.table_mut(t).map(|t| &mut t.annotations),
            ObjectRef::Column(t, c) => self
                .table_mut(t)
                .and_then(|t| t.column_mut(c))
                .map(|c| &mut c.annotations),
            ObjectRef::Key(t, k) => self
                .table_mut(t)
                .and_then(|t| t.key_mut(k))
                .map(|k| &mut k.annotations),
            ObjectRef::ForeignKey(t, k) => self
                .table_mut(t)
                .and_then(|t| t.foreign_key_mut(k))
                .map(|fk| &mut fk.annotations),
        };
        found.ok_or_else(|| WorkbenchError::UnknownObject {
            object: object.to_string(),
        })
    }

    /// The object's own document form, for the raw JSON view
    pub fn object_json(&self, object: &ObjectRef) -> Result<Value, WorkbenchError> {
        let unknown = || WorkbenchError::UnknownObject {
            object: object.to_string(),
        };
        let value = match object {
            ObjectRef::Catalog => serde_json::to_value(self),
            ObjectRef::Schema(name) => serde_json::to_value(self.schema(name).ok_or_else(unknown)?),
            ObjectRef::Table(t) => serde_json::to_value(self.require_table(t)?),
            ObjectRef::Column(t, c) => {
                serde_json::to_value(self.require_table(t)?.column(c).ok_or_else(unknown)?)
            }
            ObjectRef::Key(t, k) => {
                serde_json::to_value(self.require_table(t)?.key(k).ok_or_else(unknown)?)
            }
            ObjectRef::ForeignKey(t, k) => {
                serde_json::to_value(self.require_table(t)?.foreign_key(k).ok_or_else(unknown)?)
            }
        };
        value.map_err(|source| WorkbenchError::ModelEncodeError { source })
    }
}
