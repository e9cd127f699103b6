//! Body shapes: per-tag defaults, applicability and validation
//!
//! Each annotation tag is handled by one [`BodyShape`]. The registry comes
//! preloaded with the well-known tags; a new tag is supported by registering
//! another shape. Tags without a shape are treated as opaque JSON.

use std::fmt;

use serde_json::{json, Value};

use super::contextual_display;
use super::display;
use super::source_definitions::SEARCH_BOX;
use super::tags;
use super::visible_sources::{self, VisibleSourcesKind};
use crate::model::{CatalogModel, ObjectKind, ObjectRef};

/// A validation finding, located within one annotation body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub object: ObjectRef,
    pub tag: String,
    /// Context / entry position inside the body; empty for the whole body
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{} {}: {}", self.object, tags::short_name(&self.tag), self.message)
        } else {
            write!(
                f,
                "{} {} {}: {}",
                self.object,
                tags::short_name(&self.tag),
                self.location,
                self.message
            )
        }
    }
}

/// Handler for one annotation tag
pub trait BodyShape: Send + Sync {
    fn tag(&self) -> &str;

    /// Whether the tag may be attached to objects of this kind
    fn applies_to(&self, kind: ObjectKind) -> bool;

    /// Body inserted by "add annotation"
    fn default_body(&self) -> Value {
        json!({})
    }

    fn validate(&self, model: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic>;
}

/// Closed set of the built-in annotation kinds, used to pick an editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Display,
    VisibleColumns,
    VisibleForeignKeys,
    SourceDefinitions,
    Citation,
    TableDisplay,
    ColumnDisplay,
    KeyDisplay,
    ForeignKey,
}

impl AnnotationKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            tags::DISPLAY => AnnotationKind::Display,
            tags::VISIBLE_COLUMNS => AnnotationKind::VisibleColumns,
            tags::VISIBLE_FOREIGN_KEYS => AnnotationKind::VisibleForeignKeys,
            tags::SOURCE_DEFINITIONS => AnnotationKind::SourceDefinitions,
            tags::CITATION => AnnotationKind::Citation,
            tags::TABLE_DISPLAY => AnnotationKind::TableDisplay,
            tags::COLUMN_DISPLAY => AnnotationKind::ColumnDisplay,
            tags::KEY_DISPLAY => AnnotationKind::KeyDisplay,
            tags::FOREIGN_KEY => AnnotationKind::ForeignKey,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tag(self) -> &'static str {
        match self {
            AnnotationKind::Display => tags::DISPLAY,
            AnnotationKind::VisibleColumns => tags::VISIBLE_COLUMNS,
            AnnotationKind::VisibleForeignKeys => tags::VISIBLE_FOREIGN_KEYS,
            AnnotationKind::SourceDefinitions => tags::SOURCE_DEFINITIONS,
            AnnotationKind::Citation => tags::CITATION,
            AnnotationKind::TableDisplay => tags::TABLE_DISPLAY,
            AnnotationKind::ColumnDisplay => tags::COLUMN_DISPLAY,
            AnnotationKind::KeyDisplay => tags::KEY_DISPLAY,
            AnnotationKind::ForeignKey => tags::FOREIGN_KEY,
        }
    }
}

fn diagnostic(object: &ObjectRef, tag: &str, location: &str, message: String) -> Diagnostic {
    Diagnostic {
        object: object.clone(),
        tag: tag.to_string(),
        location: location.to_string(),
        message,
    }
}

/// visible-columns / visible-foreign-keys
struct VisibleSourcesShape(VisibleSourcesKind);

impl BodyShape for VisibleSourcesShape {
    fn tag(&self) -> &str {
        self.0.tag()
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        kind == ObjectKind::Table
    }

    fn validate(&self, model: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic> {
        match object {
            ObjectRef::Table(table) => visible_sources::validate(model, table, self.0, body),
            _ => Vec::new(),
        }
    }
}

struct SourceDefinitionsShape;

impl BodyShape for SourceDefinitionsShape {
    fn tag(&self) -> &str {
        tags::SOURCE_DEFINITIONS
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        kind == ObjectKind::Table
    }

    fn validate(&self, model: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic> {
        let tag = self.tag();
        let Some(table) = object.table().and_then(|t| model.table(t)) else {
            return Vec::new();
        };
        let Some(body) = body.as_object() else {
            return vec![diagnostic(object, tag, "", format!("{} is not an object", body))];
        };
        let mut diagnostics = Vec::new();

        if let Some(Value::Array(columns)) = body.get("columns") {
            for column in columns {
                let known = column.as_str().is_some_and(|c| table.column(c).is_some());
                if !known {
                    diagnostics.push(diagnostic(
                        object,
                        tag,
                        "columns",
                        format!("{} is not a column of {}", column, table.table_ref()),
                    ));
                }
            }
        }
        if let Some(Value::Array(fkeys)) = body.get("fkeys") {
            for fkey in fkeys {
                let known = crate::model::ConstraintName::from_value(fkey)
                    .is_some_and(|name| table.foreign_key(&name).is_some());
                if !known {
                    diagnostics.push(diagnostic(
                        object,
                        tag,
                        "fkeys",
                        format!("{} is not a foreign key of {}", fkey, table.table_ref()),
                    ));
                }
            }
        }

        let Some(sources) = body.get("sources").and_then(Value::as_object) else {
            return diagnostics;
        };
        for (key, entry) in sources {
            let location = format!("sources.{}", key);
            if key == SEARCH_BOX {
                let columns = entry.get("or").and_then(Value::as_array);
                for item in columns.into_iter().flatten() {
                    let source = item.get("source").and_then(Value::as_str);
                    if !source.is_some_and(|c| table.column(c).is_some()) {
                        diagnostics.push(diagnostic(
                            object,
                            tag,
                            &location,
                            format!("{} is not a column search source", item),
                        ));
                    }
                }
                continue;
            }
            if table.column(key).is_some() {
                diagnostics.push(diagnostic(
                    object,
                    tag,
                    &location,
                    format!("source key {} shadows a column", key),
                ));
            }
            let Some(source) = entry.get("source") else {
                continue;
            };
            match super::path::resolve_source(model, &table.table_ref(), source) {
                Ok(resolution) => {
                    if let Some(e) = resolution.error {
                        diagnostics.push(diagnostic(object, tag, &location, e.to_string()));
                    }
                }
                Err(e) => diagnostics.push(diagnostic(object, tag, &location, e.to_string())),
            }
        }
        diagnostics
    }
}

/// table-display / column-display / key-display
struct ContextOptionsShape {
    tag: &'static str,
    kinds: &'static [ObjectKind],
}

impl BodyShape for ContextOptionsShape {
    fn tag(&self) -> &str {
        self.tag
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn validate(&self, model: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic> {
        contextual_display::validate(model, object, self.tag, body)
    }
}

/// A single options object (display, citation, foreign-key)
struct ObjectShape {
    tag: &'static str,
    kinds: &'static [ObjectKind],
}

impl BodyShape for ObjectShape {
    fn tag(&self) -> &str {
        self.tag
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn validate(&self, model: &CatalogModel, object: &ObjectRef, body: &Value) -> Vec<Diagnostic> {
        display::validate(model, object, self.tag, body)
    }
}

/// Tags edited as raw JSON only
struct OpaqueShape {
    tag: &'static str,
    kinds: &'static [ObjectKind],
    default: fn() -> Value,
}

impl BodyShape for OpaqueShape {
    fn tag(&self) -> &str {
        self.tag
    }

    fn applies_to(&self, kind: ObjectKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn default_body(&self) -> Value {
        (self.default)()
    }

    fn validate(&self, _: &CatalogModel, _: &ObjectRef, _: &Value) -> Vec<Diagnostic> {
        Vec::new()
    }
}

const ANY: &[ObjectKind] = &[
    ObjectKind::Catalog,
    ObjectKind::Schema,
    ObjectKind::Table,
    ObjectKind::Column,
    ObjectKind::Key,
    ObjectKind::ForeignKey,
];
const TABLE: &[ObjectKind] = &[ObjectKind::Table];
const SCHEMA_TABLE: &[ObjectKind] = &[ObjectKind::Catalog, ObjectKind::Schema, ObjectKind::Table];
const COLUMN: &[ObjectKind] = &[ObjectKind::Column];
const KEY: &[ObjectKind] = &[ObjectKind::Key];
const FOREIGN_KEY: &[ObjectKind] = &[ObjectKind::ForeignKey];
const MODEL_OBJECTS: &[ObjectKind] = &[
    ObjectKind::Catalog,
    ObjectKind::Schema,
    ObjectKind::Table,
    ObjectKind::Column,
];

/// Tag → shape lookup
pub struct ShapeRegistry {
    shapes: Vec<Box<dyn BodyShape>>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ShapeRegistry {
    pub fn empty() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Registry with a shape for every well-known tag
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(ObjectShape {
            tag: tags::DISPLAY,
            kinds: ANY,
        });
        registry.register(VisibleSourcesShape(VisibleSourcesKind::Columns));
        registry.register(VisibleSourcesShape(VisibleSourcesKind::ForeignKeys));
        registry.register(SourceDefinitionsShape);
        registry.register(ObjectShape {
            tag: tags::CITATION,
            kinds: TABLE,
        });
        registry.register(ContextOptionsShape {
            tag: tags::TABLE_DISPLAY,
            kinds: SCHEMA_TABLE,
        });
        registry.register(ContextOptionsShape {
            tag: tags::COLUMN_DISPLAY,
            kinds: COLUMN,
        });
        registry.register(ContextOptionsShape {
            tag: tags::KEY_DISPLAY,
            kinds: KEY,
        });
        registry.register(ObjectShape {
            tag: tags::FOREIGN_KEY,
            kinds: FOREIGN_KEY,
        });

        let flag = || Value::Null;
        for tag in [tags::GENERATED, tags::IMMUTABLE, tags::NON_DELETABLE] {
            registry.register(OpaqueShape {
                tag,
                kinds: MODEL_OBJECTS,
                default: flag,
            });
        }
        registry.register(OpaqueShape {
            tag: tags::APP_LINKS,
            kinds: SCHEMA_TABLE,
            default: || json!({}),
        });
        registry.register(OpaqueShape {
            tag: tags::TABLE_ALTERNATIVES,
            kinds: TABLE,
            default: || json!({}),
        });
        registry.register(OpaqueShape {
            tag: tags::ASSET,
            kinds: &[ObjectKind::Column],
            default: || json!({}),
        });
        registry.register(OpaqueShape {
            tag: tags::REQUIRED,
            kinds: &[ObjectKind::Column],
            default: flag,
        });
        registry.register(OpaqueShape {
            tag: tags::EXPORT,
            kinds: SCHEMA_TABLE,
            default: || json!({}),
        });
        registry.register(OpaqueShape {
            tag: tags::CHAISE_CONFIG,
            kinds: &[ObjectKind::Catalog],
            default: || json!({}),
        });
        registry
    }

    /// Add a shape, replacing any shape already registered for its tag
    pub fn register(&mut self, shape: impl BodyShape + 'static) {
        self.shapes.retain(|s| s.tag() != shape.tag());
        self.shapes.push(Box::new(shape));
    }

    pub fn get(&self, tag: &str) -> Option<&dyn BodyShape> {
        self.shapes
            .iter()
            .find(|s| s.tag() == tag)
            .map(|s| s.as_ref())
    }

    /// Registered tags applicable to `kind`, in registration order
    pub fn tags_for(&self, kind: ObjectKind) -> Vec<&str> {
        self.shapes
            .iter()
            .filter(|s| s.applies_to(kind))
            .map(|s| s.tag())
            .collect()
    }

    /// Validate every annotation of one object that has a shape
    pub fn validate_object(&self, model: &CatalogModel, object: &ObjectRef) -> Vec<Diagnostic> {
        let Ok(store) = model.annotations(object) else {
            return Vec::new();
        };
        store
            .as_map()
            .iter()
            .filter_map(|(tag, body)| self.get(tag).map(|shape| (shape, body)))
            .flat_map(|(shape, body)| shape.validate(model, object, body))
            .collect()
    }

    /// Validate every object of the model
    pub fn validate_model(&self, model: &CatalogModel) -> Vec<Diagnostic> {
        all_objects(model)
            .iter()
            .flat_map(|object| self.validate_object(model, object))
            .collect()
    }
}

/// Every annotatable object, catalog first, in document order
pub fn all_objects(model: &CatalogModel) -> Vec<ObjectRef> {
    let mut objects = vec![ObjectRef::Catalog];
    for (name, schema) in &model.schemas {
        objects.push(ObjectRef::Schema(name.clone()));
        for table in schema.tables.values() {
            let table_ref = table.table_ref();
            objects.push(ObjectRef::Table(table_ref.clone()));
            objects.extend(
                table
                    .column_definitions
                    .iter()
                    .map(|c| ObjectRef::Column(table_ref.clone(), c.name.clone())),
            );
            objects.extend(
                table
                    .keys
                    .iter()
                    .filter_map(|k| k.constraint_name())
                    .map(|n| ObjectRef::Key(table_ref.clone(), n.clone())),
            );
            objects.extend(
                table
                    .foreign_keys
                    .iter()
                    .filter_map(|fk| fk.constraint_name())
                    .map(|n| ObjectRef::ForeignKey(table_ref.clone(), n.clone())),
            );
        }
    }
    objects
}
