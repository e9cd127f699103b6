//! schema-workbench: structured editing of catalog schema annotations
//!
//! This library loads a catalog's schema document (schemas, tables, columns,
//! keys, foreign keys and their annotations) and edits the annotation bodies
//! in place: source paths resolved against the foreign-key graph,
//! pseudo-columns, source definitions, and contextual display settings.
//! Fetching, applying and validating run as background tasks against a
//! [`tasks::CatalogSession`].

pub mod annotation;
pub mod browser;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod tasks;
mod util;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

pub use annotation::{Diagnostic, ShapeRegistry};
pub use error::WorkbenchError;
pub use model::{CatalogModel, ObjectRef, TableRef};

/// Options for validating a catalog document
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Path to the catalog schema document
    pub catalog_path: PathBuf,
    /// Validate only this object instead of the whole catalog
    pub object: Option<ObjectRef>,
}

/// Validate the annotations of a catalog document
pub fn validate_catalog(options: ValidateOptions) -> Result<Vec<Diagnostic>> {
    info!("Validating catalog: {}", options.catalog_path.display());

    // Step 1: Load the model
    let model = CatalogModel::load(&options.catalog_path)?;
    debug!(
        "Loaded {} schemas, {} tables",
        model.schemas.len(),
        model.tables().count()
    );

    // Step 2: Run the shape validators
    let registry = ShapeRegistry::with_builtins();
    let diagnostics = match &options.object {
        Some(object) => {
            if !model.contains(object) {
                return Err(WorkbenchError::UnknownObject {
                    object: object.to_string(),
                }
                .into());
            }
            registry.validate_object(&model, object)
        }
        None => registry.validate_model(&model),
    };

    info!("Found {} error(s)", diagnostics.len());
    Ok(diagnostics)
}
