//! Editing policy for the visible-columns and visible-foreign-keys annotations
//!
//! Entries are checked against the table before they are stored: which entry
//! kinds a context accepts depends on the annotation, and column and
//! constraint references must name something the table actually has.

use serde_json::Value;
use tracing::warn;

use super::contexts::{context_entries, ContextDocument, ContextShape};
use super::entry::{EntryKind, PseudoColumn, SourceEntry};
use super::path::resolve_source;
use super::shapes::Diagnostic;
use super::source_definitions::SEARCH_BOX;
use super::tags;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ObjectRef, TableRef};

/// Which of the two list-valued annotations is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleSourcesKind {
    Columns,
    ForeignKeys,
}

impl VisibleSourcesKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            tags::VISIBLE_COLUMNS => Some(VisibleSourcesKind::Columns),
            tags::VISIBLE_FOREIGN_KEYS => Some(VisibleSourcesKind::ForeignKeys),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            VisibleSourcesKind::Columns => tags::VISIBLE_COLUMNS,
            VisibleSourcesKind::ForeignKeys => tags::VISIBLE_FOREIGN_KEYS,
        }
    }
}

/// Entry kinds a context accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllowedKinds {
    pub columns: bool,
    pub keys: bool,
    pub outbound: bool,
    pub inbound: bool,
    pub pseudo: bool,
}

fn is_entry_context(context: &str) -> bool {
    context == "entry" || context.starts_with("entry/")
}

pub fn allowed_kinds(kind: VisibleSourcesKind, context: &str) -> AllowedKinds {
    match kind {
        VisibleSourcesKind::Columns => AllowedKinds {
            columns: true,
            keys: true,
            outbound: true,
            inbound: false,
            pseudo: !is_entry_context(context),
        },
        VisibleSourcesKind::ForeignKeys => AllowedKinds {
            inbound: true,
            pseudo: true,
            ..AllowedKinds::default()
        },
    }
}

/// Classify an entry and check it against the table and the context policy
pub fn check_entry(
    model: &CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
    entry: &Value,
) -> Result<SourceEntry, WorkbenchError> {
    let element = model.require_table(table)?;
    let allowed = allowed_kinds(kind, context);
    let entry = SourceEntry::classify(entry)?;
    let not_allowed = |kind: EntryKind| WorkbenchError::EntryNotAllowed {
        kind: kind.as_str(),
        context: context.to_string(),
    };

    match &entry {
        SourceEntry::Column(name) => {
            if !allowed.columns {
                return Err(not_allowed(EntryKind::Column));
            }
            if element.column(name).is_none() {
                return Err(WorkbenchError::UnresolvedPathComponent {
                    component: name.clone(),
                    context: table.to_string(),
                });
            }
        }
        SourceEntry::Constraint(name) => {
            let is_key = element.key(name).is_some();
            let is_outbound = element.foreign_key(name).is_some();
            let is_inbound = element.inbound(name).is_some();
            let accepted = (is_key && allowed.keys)
                || (is_outbound && allowed.outbound)
                || (is_inbound && allowed.inbound);
            if !accepted {
                if is_key || is_outbound || is_inbound {
                    return Err(not_allowed(EntryKind::Constraint));
                }
                return Err(WorkbenchError::UnresolvedConstraint {
                    schema: name.schema.clone(),
                    name: name.name.clone(),
                    direction: match kind {
                        VisibleSourcesKind::Columns => "outbound",
                        VisibleSourcesKind::ForeignKeys => "inbound",
                    },
                    context: table.to_string(),
                });
            }
        }
        SourceEntry::Pseudo(_) => {
            if !allowed.pseudo {
                return Err(not_allowed(EntryKind::Pseudo));
            }
        }
    }
    Ok(entry)
}

/// One line of an entry listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub index: usize,
    /// `None` for a malformed entry
    pub kind: Option<EntryKind>,
    pub source: String,
}

impl EntryRow {
    pub fn type_label(&self) -> &'static str {
        self.kind.map_or("Malformed", EntryKind::as_str)
    }
}

/// List a context's entries; malformed entries are listed, not dropped
pub fn rows(
    model: &CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
) -> Result<Vec<EntryRow>, WorkbenchError> {
    let store = model.annotations(&ObjectRef::Table(table.clone()))?;
    let body = store
        .get(kind.tag())
        .and_then(Value::as_object)
        .ok_or_else(|| WorkbenchError::UnknownContext {
            name: context.to_string(),
        })?;
    let entries = context_entries(body, context)?;

    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, value)| match SourceEntry::classify(value) {
            Ok(entry) => {
                let (_, source) = entry.row();
                EntryRow {
                    index,
                    kind: Some(entry.kind()),
                    source,
                }
            }
            Err(_) => EntryRow {
                index,
                kind: None,
                source: value.to_string(),
            },
        })
        .collect())
}

/// Run a context edit on the table's annotation body
fn edit_document<R>(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    edit: impl FnOnce(&mut ContextDocument<'_>) -> Result<R, WorkbenchError>,
) -> Result<R, WorkbenchError> {
    model
        .annotations_mut(&ObjectRef::Table(table.clone()))?
        .edit_object(kind.tag(), |body| {
            edit(&mut ContextDocument::new(body, ContextShape::Entries))
        })
}

pub fn create_context(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
) -> Result<(), WorkbenchError> {
    edit_document(model, table, kind, |doc| doc.create_context(context))
}

pub fn remove_context(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
) -> Result<Value, WorkbenchError> {
    edit_document(model, table, kind, |doc| doc.remove_context(context))
}

/// Check an entry and bring a pseudo-column into its committed form.
///
/// An unresolvable `source` is cut back to its valid prefix; the reason is
/// returned next to the entry so the caller can surface it.
fn prepare_entry(
    model: &CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
    entry: &Value,
) -> Result<(Value, Option<WorkbenchError>), WorkbenchError> {
    let SourceEntry::Pseudo(mut map) = check_entry(model, table, kind, context, entry)? else {
        return Ok((entry.clone(), None));
    };

    let mut pseudo = PseudoColumn::new(&mut map);
    pseudo.commit();
    let mut truncated = None;
    if let Some(source) = pseudo.source().cloned() {
        let resolution = resolve_source(model, table, &source)?;
        if let Some(e) = resolution.error {
            warn!("Truncating source of new {} entry: {}", context, e);
            pseudo.set_source(&resolution.path);
            pseudo.commit();
            truncated = Some(e);
        }
    }
    Ok((Value::Object(map), truncated))
}

/// Check and append an entry.
///
/// Returns the new index and, for a pseudo-column whose source had to be
/// truncated, the reason.
pub fn append_entry(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
    entry: &Value,
) -> Result<(usize, Option<WorkbenchError>), WorkbenchError> {
    let (entry, truncated) = prepare_entry(model, table, kind, context, entry)?;
    let index = edit_document(model, table, kind, |doc| doc.append(context, entry))?;
    Ok((index, truncated))
}

/// Check and store an edited entry in place.
///
/// Returns the previous entry and the truncation reason, as for
/// [`append_entry`].
pub fn replace_entry(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
    index: usize,
    entry: &Value,
) -> Result<(Value, Option<WorkbenchError>), WorkbenchError> {
    let (entry, truncated) = prepare_entry(model, table, kind, context, entry)?;
    let previous = edit_document(model, table, kind, |doc| doc.replace(context, index, entry))?;
    Ok((previous, truncated))
}

/// Rewrite a pseudo-column's source to its canonical resolvable prefix.
///
/// Returns the diagnostic for the dropped remainder, if any. Non-pseudo
/// entries are left as they are.
pub fn salvage_source(
    model: &mut CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    context: &str,
    index: usize,
) -> Result<Option<WorkbenchError>, WorkbenchError> {
    let source = {
        let store = model.annotations(&ObjectRef::Table(table.clone()))?;
        let body = store
            .get(kind.tag())
            .and_then(Value::as_object)
            .ok_or_else(|| WorkbenchError::UnknownContext {
                name: context.to_string(),
            })?;
        let entries = context_entries(body, context)?;
        let entry = entries
            .get(index)
            .ok_or_else(|| WorkbenchError::EntryIndexOutOfRange {
                context: context.to_string(),
                index,
                len: entries.len(),
            })?;
        match entry.get("source") {
            Some(source) if entry.is_object() => source.clone(),
            _ => return Ok(None),
        }
    };

    let resolution = resolve_source(model, table, &source)?;
    edit_document(model, table, kind, |doc| {
        let entries = doc.entries_mut(context)?;
        let mut pseudo = PseudoColumn::from_value(&mut entries[index])?;
        pseudo.set_source(&resolution.path);
        pseudo.commit();
        Ok(())
    })?;
    Ok(resolution.error)
}

/// Check every context of a visible-sources body
pub fn validate(
    model: &CatalogModel,
    table: &TableRef,
    kind: VisibleSourcesKind,
    body: &Value,
) -> Vec<Diagnostic> {
    let object = ObjectRef::Table(table.clone());
    let diagnostic = |location: String, message: String| Diagnostic {
        object: object.clone(),
        tag: kind.tag().to_string(),
        location,
        message,
    };

    let Some(contexts) = body.as_object() else {
        return vec![diagnostic(
            String::new(),
            format!("{} is not a context mapping", body),
        )];
    };
    let source_keys = defined_source_keys(model, table);
    let mut diagnostics = Vec::new();

    for (context, value) in contexts {
        if let Some(alias) = value.as_str() {
            if !contexts.contains_key(alias) {
                diagnostics.push(diagnostic(
                    context.clone(),
                    format!("alias of undefined context {}", alias),
                ));
            }
            continue;
        }
        let entries = match context_entries(contexts, context) {
            Ok(entries) => entries,
            Err(e) => {
                diagnostics.push(diagnostic(context.clone(), e.to_string()));
                continue;
            }
        };

        for (index, value) in entries.iter().enumerate() {
            let location = format!("{}[{}]", context, index);
            let entry = match check_entry(model, table, kind, context, value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping entry {} of {}: {}", location, kind.tag(), e);
                    diagnostics.push(diagnostic(location, e.to_string()));
                    continue;
                }
            };
            let SourceEntry::Pseudo(map) = entry else {
                continue;
            };
            if let Some(key) = map.get("sourcekey").and_then(Value::as_str) {
                if !source_keys.iter().any(|k| k == key) {
                    let e = WorkbenchError::UnknownSourceKey {
                        key: key.to_string(),
                    };
                    diagnostics.push(diagnostic(location.clone(), e.to_string()));
                }
            }
            if let Some(source) = map.get("source") {
                match resolve_source(model, table, source) {
                    Ok(resolution) => {
                        if let Some(e) = resolution.error {
                            diagnostics.push(diagnostic(
                                location,
                                format!("{}; valid prefix is [{}]", e, resolution.path),
                            ));
                        }
                    }
                    Err(e) => diagnostics.push(diagnostic(location, e.to_string())),
                }
            }
        }
    }
    diagnostics
}

/// Source keys defined for `table`, without the search box
pub(crate) fn defined_source_keys(model: &CatalogModel, table: &TableRef) -> Vec<String> {
    model
        .table(table)
        .and_then(|t| t.annotations.get(tags::SOURCE_DEFINITIONS))
        .and_then(|body| body.get("sources"))
        .and_then(Value::as_object)
        .map(|sources| {
            sources
                .keys()
                .filter(|k| k.as_str() != SEARCH_BOX)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
