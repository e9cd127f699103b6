//! File-backed catalog session
//!
//! Stands in for a remote catalog: the "catalog" is a JSON schema document
//! on disk. Fetch reads it, apply writes the edited model back, and validate
//! runs the local body-shape validators.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::annotation::{Diagnostic, ShapeRegistry};
use crate::model::{CatalogModel, ObjectRef};
use crate::tasks::CatalogSession;

pub struct LocalCatalogSession {
    path: PathBuf,
    registry: ShapeRegistry,
}

impl LocalCatalogSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_registry(path, ShapeRegistry::with_builtins())
    }

    pub fn with_registry(path: impl Into<PathBuf>, registry: ShapeRegistry) -> Self {
        Self {
            path: path.into(),
            registry,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSession for LocalCatalogSession {
    async fn fetch_model(&self) -> Result<CatalogModel> {
        debug!("Reading catalog document {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog document {}", self.path.display()))?;
        Ok(CatalogModel::from_json(&text)?)
    }

    async fn apply(&self, model: &CatalogModel) -> Result<()> {
        debug!("Writing catalog document {}", self.path.display());
        let text = model.to_json()?;
        tokio::fs::write(&self.path, text)
            .await
            .with_context(|| format!("Failed to write catalog document {}", self.path.display()))
    }

    async fn validate(&self, model: &CatalogModel, object: &ObjectRef) -> Result<Vec<Diagnostic>> {
        if !model.contains(object) {
            bail!("Cannot validate {}: no such object in the catalog model", object);
        }
        Ok(self.registry.validate_object(model, object))
    }
}
