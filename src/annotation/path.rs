//! Source path resolution
//!
//! A source path is a list of steps rooted at a table: outbound and inbound
//! foreign key traversals, optionally ending in a column name. Resolution is a
//! pure function of a model snapshot and a path. It yields one frame per step
//! plus the root, and stops at the first step that does not resolve, keeping
//! the valid prefix.

use std::fmt;

use serde_json::{json, Value};
use tracing::warn;

use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ConstraintName, TableRef};

/// One step of a source path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// Terminal column of the current table
    Column(String),
    /// Follow a foreign key of the current table to its referenced table
    Outbound(ConstraintName),
    /// Follow a foreign key that targets the current table back to its owner
    Inbound(ConstraintName),
}

impl PathComponent {
    /// Decode a single component; `None` for anything that is not a column
    /// name or an `{outbound|inbound: [schema, name]}` object.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(PathComponent::Column(name.clone())),
            Value::Object(map) => {
                if let Some(name) = map.get("outbound").and_then(ConstraintName::from_value) {
                    Some(PathComponent::Outbound(name))
                } else {
                    map.get("inbound")
                        .and_then(ConstraintName::from_value)
                        .map(PathComponent::Inbound)
                }
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            PathComponent::Column(name) => Value::String(name.clone()),
            PathComponent::Outbound(name) => json!({ "outbound": name.to_value() }),
            PathComponent::Inbound(name) => json!({ "inbound": name.to_value() }),
        }
    }

    pub fn is_column(&self) -> bool {
        matches!(self, PathComponent::Column(_))
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Column(name) => write!(f, "{}", name),
            PathComponent::Outbound(name) => write!(f, "{} (outbound)", name),
            PathComponent::Inbound(name) => write!(f, "{} (inbound)", name),
        }
    }
}

/// An ordered list of path components, always serialized in list form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePath(Vec<PathComponent>);

impl SourcePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a `source` value into its canonical list form.
    ///
    /// A bare string is a one-column path and a `[schema, name]` pair is a
    /// single outbound step. Decoding stops at the first component that is not
    /// understood; the returned error describes it and the path holds the
    /// components before it. A missing (`null`) source is the empty path.
    pub fn parse(value: &Value) -> (SourcePath, Option<WorkbenchError>) {
        match value {
            Value::Null => (SourcePath::new(), None),
            Value::String(name) => (
                SourcePath(vec![PathComponent::Column(name.clone())]),
                None,
            ),
            Value::Array(items) => {
                if let Some(name) = ConstraintName::from_value(value) {
                    return (SourcePath(vec![PathComponent::Outbound(name)]), None);
                }
                let mut components = Vec::with_capacity(items.len());
                for item in items {
                    match PathComponent::from_value(item) {
                        Some(component) => components.push(component),
                        None => {
                            let error = WorkbenchError::UnresolvedPathComponent {
                                component: item.to_string(),
                                context: "source path".to_string(),
                            };
                            warn!("{}; keeping the first {} components", error, components.len());
                            return (SourcePath(components), Some(error));
                        }
                    }
                }
                (SourcePath(components), None)
            }
            other => (
                SourcePath::new(),
                Some(WorkbenchError::MalformedEntry {
                    location: "source".to_string(),
                    detail: format!("{} is not a valid source path", other),
                }),
            ),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(PathComponent::to_value).collect())
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathComponent> {
        self.0.last()
    }

    fn push(&mut self, component: PathComponent) {
        self.0.push(component);
    }

    fn pop(&mut self) -> Option<PathComponent> {
        self.0.pop()
    }
}

impl From<Vec<PathComponent>> for SourcePath {
    fn from(components: Vec<PathComponent>) -> Self {
        Self(components)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// Readable form of any `source` value, as shown in entry listings
pub fn source_to_string(source: &Value) -> String {
    match source {
        Value::String(name) => name.clone(),
        _ => match ConstraintName::from_value(source) {
            Some(name) => name.name,
            None => SourcePath::parse(source).0.to_string(),
        },
    }
}

/// The table or column reached after a number of path steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Table(TableRef),
    Column(TableRef, String),
}

impl Frame {
    /// The table of a table frame; column frames have no further hops
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Frame::Table(t) => Some(t),
            Frame::Column(..) => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Table(t) => write!(f, "{}", t),
            Frame::Column(t, c) => write!(f, "{}.{}", t, c),
        }
    }
}

/// Outcome of resolving a path: the valid prefix, its frames, and the reason
/// resolution stopped early, if it did.
#[derive(Debug)]
pub struct Resolution {
    /// The longest resolvable prefix of the input path
    pub path: SourcePath,
    /// `path.len() + 1` frames, starting with the root table
    pub frames: Vec<Frame>,
    /// Why the remainder of the input was dropped
    pub error: Option<WorkbenchError>,
    snapshot: String,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn terminal(&self) -> &Frame {
        // frames always holds at least the root
        &self.frames[self.frames.len() - 1]
    }

    /// Whether this resolution was computed against a different snapshot
    pub fn is_stale(&self, model: &CatalogModel) -> bool {
        self.snapshot != model.fingerprint()
    }
}

/// Apply one component to a frame
pub fn step(
    model: &CatalogModel,
    frame: &Frame,
    component: &PathComponent,
) -> Result<Frame, WorkbenchError> {
    let table_ref = match frame {
        Frame::Table(t) => t,
        Frame::Column(..) => {
            return Err(WorkbenchError::UnresolvedPathComponent {
                component: component.to_string(),
                context: format!("column {}", frame),
            })
        }
    };
    let table = model.require_table(table_ref)?;

    match component {
        PathComponent::Column(name) => table
            .column(name)
            .map(|c| Frame::Column(table_ref.clone(), c.name.clone()))
            .ok_or_else(|| WorkbenchError::UnresolvedPathComponent {
                component: name.clone(),
                context: table_ref.to_string(),
            }),
        PathComponent::Outbound(name) => table
            .foreign_key(name)
            .and_then(|fk| fk.referenced_table())
            .filter(|target| model.table(target).is_some())
            .map(Frame::Table)
            .ok_or_else(|| unresolved_constraint(name, "outbound", table_ref)),
        PathComponent::Inbound(name) => table
            .inbound(name)
            .map(|r| Frame::Table(r.table.clone()))
            .ok_or_else(|| unresolved_constraint(name, "inbound", table_ref)),
    }
}

fn unresolved_constraint(
    name: &ConstraintName,
    direction: &'static str,
    context: &TableRef,
) -> WorkbenchError {
    WorkbenchError::UnresolvedConstraint {
        schema: name.schema.clone(),
        name: name.name.clone(),
        direction,
        context: context.to_string(),
    }
}

/// Resolve `path` from `root`.
///
/// Only an unknown root is an error; a component that does not resolve ends
/// the walk and is reported in [`Resolution::error`].
pub fn resolve(
    model: &CatalogModel,
    root: &TableRef,
    path: &SourcePath,
) -> Result<Resolution, WorkbenchError> {
    model.require_table(root)?;

    let mut frames = vec![Frame::Table(root.clone())];
    let mut valid = SourcePath::new();
    let mut error = None;

    for component in path.components() {
        let current = &frames[frames.len() - 1];
        match step(model, current, component) {
            Ok(frame) => {
                frames.push(frame);
                valid.push(component.clone());
            }
            Err(e) => {
                warn!(
                    "Invalid path component {} in source {}: {}",
                    component, path, e
                );
                error = Some(e);
                break;
            }
        }
    }

    Ok(Resolution {
        path: valid,
        frames,
        error,
        snapshot: model.fingerprint().to_string(),
    })
}

/// Decode and resolve a raw `source` value in one go
pub fn resolve_source(
    model: &CatalogModel,
    root: &TableRef,
    source: &Value,
) -> Result<Resolution, WorkbenchError> {
    let (path, parse_error) = SourcePath::parse(source);
    let mut resolution = resolve(model, root, &path)?;
    if resolution.error.is_none() {
        resolution.error = parse_error;
    }
    Ok(resolution)
}

/// A choice for extending a path from a table frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextHop {
    pub component: PathComponent,
    pub label: String,
}

/// Every column, outbound foreign key and inbound reference of the frame's
/// table, in that order. Column frames have no next hops.
pub fn next_hops(model: &CatalogModel, frame: &Frame) -> Vec<NextHop> {
    let Some(table) = frame.table().and_then(|t| model.table(t)) else {
        return Vec::new();
    };

    let columns = table
        .column_definitions
        .iter()
        .map(|c| PathComponent::Column(c.name.clone()));
    let outbound = table
        .foreign_keys
        .iter()
        .filter_map(|fk| fk.constraint_name().cloned())
        .map(PathComponent::Outbound);
    let inbound = table
        .referenced_by
        .iter()
        .map(|r| PathComponent::Inbound(r.name.clone()));

    columns
        .chain(outbound)
        .chain(inbound)
        .map(|component| NextHop {
            label: component.to_string(),
            component,
        })
        .collect()
}

/// Interactive path builder with push/pop over a frame stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEditor {
    path: SourcePath,
    frames: Vec<Frame>,
    snapshot: String,
}

impl SourceEditor {
    /// Start an empty path at `root`
    pub fn new(model: &CatalogModel, root: &TableRef) -> Result<Self, WorkbenchError> {
        Ok(resolve(model, root, &SourcePath::new())?.into())
    }

    pub fn path(&self) -> &SourcePath {
        &self.path
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn root(&self) -> &Frame {
        &self.frames[0]
    }

    pub fn terminal(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// Choices for the next push; empty once the path ends in a column
    pub fn next_hops(&self, model: &CatalogModel) -> Vec<NextHop> {
        next_hops(model, self.terminal())
    }

    /// Extend the path by one resolvable component
    pub fn push(
        &mut self,
        model: &CatalogModel,
        component: PathComponent,
    ) -> Result<(), WorkbenchError> {
        let frame = step(model, self.terminal(), &component)?;
        self.frames.push(frame);
        self.path.push(component);
        Ok(())
    }

    /// Remove the last component, restoring the previous frame stack
    pub fn pop(&mut self) -> Option<PathComponent> {
        let component = self.path.pop()?;
        self.frames.pop();
        Some(component)
    }

    pub fn to_value(&self) -> Value {
        self.path.to_value()
    }

    pub fn is_stale(&self, model: &CatalogModel) -> bool {
        self.snapshot != model.fingerprint()
    }
}

impl From<Resolution> for SourceEditor {
    fn from(resolution: Resolution) -> Self {
        Self {
            path: resolution.path,
            frames: resolution.frames,
            snapshot: resolution.snapshot,
        }
    }
}
