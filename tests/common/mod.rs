//! Common test utilities for schema-workbench tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use schema_workbench::{CatalogModel, ObjectRef, TableRef};
use tempfile::TempDir;

/// Path to a file under tests/fixtures
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load the standard catalog fixture
pub fn load_catalog() -> CatalogModel {
    CatalogModel::load(&fixture_path("catalog.json")).expect("Failed to load catalog fixture")
}

pub fn document() -> TableRef {
    TableRef::new("public", "Document")
}

pub fn author() -> TableRef {
    TableRef::new("public", "Author")
}

pub fn review() -> TableRef {
    TableRef::new("public", "Review")
}

pub fn table_object(table: &TableRef) -> ObjectRef {
    ObjectRef::Table(table.clone())
}

/// Test context with a writable copy of a catalog fixture
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub catalog_path: PathBuf,
}

impl TestContext {
    /// Copy a fixture into a fresh temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let catalog_path = temp_dir.path().join(fixture_name);
        fs::copy(fixture_path(fixture_name), &catalog_path).expect("Failed to copy fixture");
        Self {
            _temp_dir: temp_dir,
            catalog_path,
        }
    }

    /// Re-read the catalog document from disk
    pub fn reload(&self) -> CatalogModel {
        CatalogModel::load(&self.catalog_path).expect("Failed to reload catalog")
    }

    /// Overwrite the catalog document
    pub fn write(&self, model: &CatalogModel) {
        model
            .save(&self.catalog_path)
            .expect("Failed to write catalog");
    }
}
