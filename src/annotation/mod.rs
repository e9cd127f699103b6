//! Annotation documents: source paths, pseudo-columns, contexts and the
//! per-tag editors built on them

pub mod contexts;
pub mod contextual_display;
pub mod display;
pub mod entry;
pub mod path;
pub mod properties;
pub mod shapes;
pub mod source_definitions;
pub mod tags;
pub mod visible_sources;

pub use contexts::{ContextDocument, ContextShape, FILTER};
pub use entry::{EntryKind, PseudoColumn, SourceEntry};
pub use path::{
    next_hops, resolve, resolve_source, Frame, NextHop, PathComponent, Resolution, SourceEditor,
    SourcePath,
};
pub use properties::{Toggle, ToggleField};
pub use shapes::{AnnotationKind, BodyShape, Diagnostic, ShapeRegistry};
pub use source_definitions::{SearchColumn, Selection, SourceDefinitions, SEARCH_BOX};
pub use visible_sources::VisibleSourcesKind;
