//! Owned handles to annotatable model objects

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{ConstraintName, TableRef};
use crate::error::WorkbenchError;

/// `schema[:table[.column | /key/cschema:cname | /fkey/cschema:cname]]`
static OBJECT_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<schema>[^:/.]+)(?::(?P<table>[^:./]+)(?:\.(?P<column>[^/]+)|/(?P<kind>key|fkey)/(?P<cschema>[^:]*):(?P<cname>.+))?)?$",
    )
    .unwrap()
});

/// Kind of annotatable object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Catalog,
    Schema,
    Table,
    Column,
    Key,
    ForeignKey,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Catalog => "catalog",
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::Column => "column",
            ObjectKind::Key => "key",
            ObjectKind::ForeignKey => "foreign key",
        }
    }
}

/// Handle to a schema object.
///
/// Handles are plain names, so holding one never borrows the model; they are
/// re-resolved against whatever snapshot is current.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Catalog,
    Schema(String),
    Table(TableRef),
    Column(TableRef, String),
    Key(TableRef, ConstraintName),
    ForeignKey(TableRef, ConstraintName),
}

impl ObjectRef {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectRef::Catalog => ObjectKind::Catalog,
            ObjectRef::Schema(_) => ObjectKind::Schema,
            ObjectRef::Table(_) => ObjectKind::Table,
            ObjectRef::Column(..) => ObjectKind::Column,
            ObjectRef::Key(..) => ObjectKind::Key,
            ObjectRef::ForeignKey(..) => ObjectKind::ForeignKey,
        }
    }

    /// The table this object belongs to, for table-scoped objects
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            ObjectRef::Table(t)
            | ObjectRef::Column(t, _)
            | ObjectRef::Key(t, _)
            | ObjectRef::ForeignKey(t, _) => Some(t),
            ObjectRef::Catalog | ObjectRef::Schema(_) => None,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Catalog => write!(f, "catalog"),
            ObjectRef::Schema(s) => write!(f, "{}", s),
            ObjectRef::Table(t) => write!(f, "{}", t),
            ObjectRef::Column(t, c) => write!(f, "{}.{}", t, c),
            ObjectRef::Key(t, k) => write!(f, "{} key {}", t, k),
            ObjectRef::ForeignKey(t, k) => write!(f, "{} foreign key {}", t, k),
        }
    }
}

impl FromStr for ObjectRef {
    type Err = WorkbenchError;

    /// Parse an object spec; `/` names the catalog itself
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        if spec == "/" {
            return Ok(ObjectRef::Catalog);
        }
        let caps = OBJECT_SPEC_RE
            .captures(spec)
            .ok_or_else(|| WorkbenchError::UnknownObject {
                object: spec.to_string(),
            })?;
        let schema = caps["schema"].to_string();
        let Some(table) = caps.name("table") else {
            return Ok(ObjectRef::Schema(schema));
        };
        let table = TableRef::new(schema, table.as_str());

        if let Some(column) = caps.name("column") {
            return Ok(ObjectRef::Column(table, column.as_str().to_string()));
        }
        match (caps.name("kind"), caps.name("cschema"), caps.name("cname")) {
            (Some(kind), Some(cschema), Some(cname)) => {
                let name = ConstraintName::new(cschema.as_str(), cname.as_str());
                if kind.as_str() == "key" {
                    Ok(ObjectRef::Key(table, name))
                } else {
                    Ok(ObjectRef::ForeignKey(table, name))
                }
            }
            _ => Ok(ObjectRef::Table(table)),
        }
    }
}
