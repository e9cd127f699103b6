//! Catalog model element types
//!
//! The field names follow the catalog's JSON schema document so that a model
//! fetched from the server can be written back unchanged. Members the editor
//! does not understand (ACLs, rights, table kinds, ...) are kept in `extra`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AnnotationStore;

/// Two-part constraint name: owning schema (empty when absent) and local name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConstraintName {
    pub schema: String,
    pub name: String,
}

impl ConstraintName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Read a `[schema, name]` pair; anything else is not a constraint name.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_array()?.as_slice() {
            [Value::String(schema), Value::String(name)] => Some(Self::new(schema, name)),
            _ => None,
        }
    }

    /// The annotation-friendly `[schema, name]` form.
    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::String(self.schema.clone()),
            Value::String(self.name.clone()),
        ])
    }
}

impl From<(String, String)> for ConstraintName {
    fn from((schema, name): (String, String)) -> Self {
        Self { schema, name }
    }
}

impl From<ConstraintName> for (String, String) {
    fn from(c: ConstraintName) -> Self {
        (c.schema, c.name)
    }
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.name)
    }
}

/// Owned handle to a table (schema name + table name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.schema, self.table)
    }
}

/// Schema element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaElement {
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(default)]
    pub tables: std::collections::BTreeMap<String, TableElement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Column data type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnType {
    #[serde(default)]
    pub typename: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_nullok() -> bool {
    true
}

/// Column element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnElement {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default = "default_nullok")]
    pub nullok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key (unique constraint) element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyElement {
    pub unique_columns: Vec<String>,
    #[serde(default)]
    pub names: Vec<ConstraintName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeyElement {
    /// The primary name of the key, if the server assigned one
    pub fn constraint_name(&self) -> Option<&ConstraintName> {
        self.names.first()
    }
}

/// Column reference used by foreign key column pairings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyColumn {
    pub schema_name: String,
    pub table_name: String,
    pub column_name: String,
}

/// Foreign key element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyElement {
    pub foreign_key_columns: Vec<ForeignKeyColumn>,
    pub referenced_columns: Vec<ForeignKeyColumn>,
    #[serde(default)]
    pub names: Vec<ConstraintName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForeignKeyElement {
    pub fn constraint_name(&self) -> Option<&ConstraintName> {
        self.names.first()
    }

    /// The referencing table (owner of the foreign key columns)
    pub fn table(&self) -> Option<TableRef> {
        self.foreign_key_columns
            .first()
            .map(|c| TableRef::new(&c.schema_name, &c.table_name))
    }

    /// The referenced (primary key) table
    pub fn referenced_table(&self) -> Option<TableRef> {
        self.referenced_columns
            .first()
            .map(|c| TableRef::new(&c.schema_name, &c.table_name))
    }
}

/// A foreign key declared elsewhere that targets this table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReference {
    /// The referencing table
    pub table: TableRef,
    pub name: ConstraintName,
}

/// Table element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableElement {
    pub schema_name: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub column_definitions: Vec<ColumnElement>,
    #[serde(default)]
    pub keys: Vec<KeyElement>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyElement>,
    #[serde(default)]
    pub annotations: AnnotationStore,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Computed by the model builder; not part of the document
    #[serde(skip)]
    pub referenced_by: Vec<InboundReference>,
}

impl TableElement {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema_name, &self.table_name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnElement> {
        self.column_definitions.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnElement> {
        self.column_definitions.iter_mut().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.column_definitions.iter().map(|c| c.name.as_str())
    }

    pub fn key(&self, name: &ConstraintName) -> Option<&KeyElement> {
        self.keys.iter().find(|k| k.names.contains(name))
    }

    pub fn key_mut(&mut self, name: &ConstraintName) -> Option<&mut KeyElement> {
        self.keys.iter_mut().find(|k| k.names.contains(name))
    }

    /// Outbound foreign key by name
    pub fn foreign_key(&self, name: &ConstraintName) -> Option<&ForeignKeyElement> {
        self.foreign_keys.iter().find(|fk| fk.names.contains(name))
    }

    pub fn foreign_key_mut(&mut self, name: &ConstraintName) -> Option<&mut ForeignKeyElement> {
        self.foreign_keys.iter_mut().find(|fk| fk.names.contains(name))
    }

    /// Inbound reference by name
    pub fn inbound(&self, name: &ConstraintName) -> Option<&InboundReference> {
        self.referenced_by.iter().find(|r| &r.name == name)
    }
}
