//! Catalog model: the table graph and per-object annotation stores

mod annotations;
mod builder;
mod catalog_model;
mod elements;
mod object;

pub use annotations::AnnotationStore;
pub use builder::build_model;
pub use catalog_model::CatalogModel;
pub use elements::*;
pub use object::{ObjectKind, ObjectRef};
