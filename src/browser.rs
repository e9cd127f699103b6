//! Catalog browser: the object tree, the annotation menu and editor dispatch

use serde_json::Value;

use crate::annotation::shapes::{AnnotationKind, ShapeRegistry};
use crate::annotation::tags;
use crate::error::WorkbenchError;
use crate::model::{CatalogModel, ObjectRef, TableElement};

/// What a tree node stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserItem {
    Object(ObjectRef),
    /// The annotations node of an object
    Annotations(ObjectRef),
    Annotation(ObjectRef, String),
    /// Grouping node (`columns`, `keys`, `foreign keys`)
    Group(&'static str),
}

/// The object/tag pair the presentation layer has selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub object: ObjectRef,
    pub tag: Option<String>,
}

impl BrowserItem {
    pub fn selection(&self) -> Option<SelectedItem> {
        match self {
            BrowserItem::Object(object) | BrowserItem::Annotations(object) => Some(SelectedItem {
                object: object.clone(),
                tag: None,
            }),
            BrowserItem::Annotation(object, tag) => Some(SelectedItem {
                object: object.clone(),
                tag: Some(tag.clone()),
            }),
            BrowserItem::Group(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserNode {
    pub label: String,
    pub item: BrowserItem,
    pub children: Vec<BrowserNode>,
}

impl BrowserNode {
    fn leaf(label: impl Into<String>, item: BrowserItem) -> Self {
        Self {
            label: label.into(),
            item,
            children: Vec::new(),
        }
    }

    /// Depth-first search for the first node matching `item`
    pub fn find(&self, item: &BrowserItem) -> Option<&BrowserNode> {
        if &self.item == item {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(item))
    }

    /// Indented text rendering, two spaces per level
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.label);
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// Annotations node listing the tags actually present
fn annotations_node(model: &CatalogModel, object: &ObjectRef) -> BrowserNode {
    let tags = model
        .annotations(object)
        .map(|store| store.tags().map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();
    BrowserNode {
        label: "annotations".to_string(),
        item: BrowserItem::Annotations(object.clone()),
        children: tags
            .into_iter()
            .map(|tag| {
                BrowserNode::leaf(
                    tags::short_name(&tag).to_string(),
                    BrowserItem::Annotation(object.clone(), tag),
                )
            })
            .collect(),
    }
}

fn object_node(model: &CatalogModel, label: String, object: ObjectRef) -> BrowserNode {
    BrowserNode {
        label,
        children: vec![annotations_node(model, &object)],
        item: BrowserItem::Object(object),
    }
}

fn table_node(model: &CatalogModel, table: &TableElement) -> BrowserNode {
    let table_ref = table.table_ref();
    let mut node = object_node(
        model,
        table.table_name.clone(),
        ObjectRef::Table(table_ref.clone()),
    );

    let columns = table
        .column_definitions
        .iter()
        .map(|c| {
            object_node(
                model,
                c.name.clone(),
                ObjectRef::Column(table_ref.clone(), c.name.clone()),
            )
        })
        .collect();
    let keys = table
        .keys
        .iter()
        .filter_map(|k| k.constraint_name())
        .map(|name| {
            object_node(
                model,
                name.name.clone(),
                ObjectRef::Key(table_ref.clone(), name.clone()),
            )
        })
        .collect();
    let foreign_keys = table
        .foreign_keys
        .iter()
        .filter_map(|fk| fk.constraint_name())
        .map(|name| {
            object_node(
                model,
                name.name.clone(),
                ObjectRef::ForeignKey(table_ref.clone(), name.clone()),
            )
        })
        .collect();

    for (label, children) in [
        ("columns", columns),
        ("keys", keys),
        ("foreign keys", foreign_keys),
    ] {
        node.children.push(BrowserNode {
            label: label.to_string(),
            item: BrowserItem::Group(label),
            children,
        });
    }
    node
}

/// Build the browser tree. Enumeration never touches the annotation stores.
pub fn tree(model: &CatalogModel) -> BrowserNode {
    let mut root = object_node(model, "catalog".to_string(), ObjectRef::Catalog);
    for (name, schema) in &model.schemas {
        let mut node = object_node(model, name.clone(), ObjectRef::Schema(name.clone()));
        node.children
            .extend(schema.tables.values().map(|t| table_node(model, t)));
        root.children.push(node);
    }
    root
}

/// Tags applicable to the object's kind that are not yet present
pub fn addable_tags(
    model: &CatalogModel,
    registry: &ShapeRegistry,
    object: &ObjectRef,
) -> Result<Vec<String>, WorkbenchError> {
    let store = model.annotations(object)?;
    Ok(registry
        .tags_for(object.kind())
        .into_iter()
        .filter(|tag| !store.contains(tag))
        .map(str::to_string)
        .collect())
}

/// Attach the shape's default body under `tag`; an existing body is kept
pub fn add_annotation(
    model: &mut CatalogModel,
    registry: &ShapeRegistry,
    object: &ObjectRef,
    tag: &str,
) -> Result<(), WorkbenchError> {
    let default = registry
        .get(tag)
        .map(|shape| shape.default_body())
        .unwrap_or_else(|| Value::Object(Default::default()));
    model.annotations_mut(object)?.ensure(tag, || default);
    Ok(())
}

pub fn delete_annotation(
    model: &mut CatalogModel,
    object: &ObjectRef,
    tag: &str,
) -> Result<Option<Value>, WorkbenchError> {
    Ok(model.annotations_mut(object)?.delete(tag))
}

/// Editor to open for a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorView {
    /// Raw document of the object itself
    ObjectJson(ObjectRef),
    Dedicated {
        object: ObjectRef,
        kind: AnnotationKind,
    },
    /// Opaque annotation body
    GenericJson { object: ObjectRef, tag: String },
}

pub fn editor_view(selected: &SelectedItem) -> EditorView {
    let object = selected.object.clone();
    match &selected.tag {
        None => EditorView::ObjectJson(object),
        Some(tag) => match AnnotationKind::from_tag(tag) {
            Some(kind) => EditorView::Dedicated { object, kind },
            None => EditorView::GenericJson {
                object,
                tag: tag.clone(),
            },
        },
    }
}
