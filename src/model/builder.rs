//! Build the derived parts of a catalog model
//!
//! The catalog document only records foreign keys on the referencing side.
//! Path resolution also needs the reverse direction, so every table gets its
//! inbound reference set here, once per snapshot.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{CatalogModel, InboundReference};

/// Finish a decoded model: index inbound references and fingerprint the source
pub fn build_model(mut model: CatalogModel, source: &[u8]) -> CatalogModel {
    let mut inbound = Vec::new();

    for table in model.tables() {
        for fkey in &table.foreign_keys {
            let Some(name) = fkey.constraint_name() else {
                warn!(
                    "Foreign key without a name on {}; it cannot be used in source paths",
                    table.table_ref()
                );
                continue;
            };
            let Some(target) = fkey.referenced_table() else {
                warn!("Foreign key {} has no referenced columns", name);
                continue;
            };
            inbound.push((
                target,
                InboundReference {
                    table: table.table_ref(),
                    name: name.clone(),
                },
            ));
        }
    }

    for table in model.tables_mut() {
        table.referenced_by.clear();
    }

    for (target, reference) in inbound {
        match model.table_mut(&target) {
            Some(table) => table.referenced_by.push(reference),
            None => warn!(
                "Foreign key {} references unknown table {}",
                reference.name, target
            ),
        }
    }

    model.fingerprint = hex::encode(Sha256::digest(source));
    debug!(
        "Built catalog model with {} schemas (fingerprint {})",
        model.schemas.len(),
        &model.fingerprint[..12]
    );

    model
}

impl CatalogModel {
    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut super::TableElement> {
        self.schemas.values_mut().flat_map(|s| s.tables.values_mut())
    }
}
