//! Workbench configuration file

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorkbenchError;

/// One catalog connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub catalog_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

impl ServerConfig {
    /// `desc [host: h, catalog id: c]`
    pub fn display_name(&self) -> String {
        format!(
            "{} [host: {}, catalog id: {}]",
            self.desc.as_deref().unwrap_or("none"),
            self.host,
            self.catalog_id
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

impl WorkbenchConfig {
    /// Load the configuration; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, WorkbenchError> {
        if !path.exists() {
            info!("Configuration file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        info!("Loading configuration file {}", path.display());
        let content =
            std::fs::read_to_string(path).map_err(|e| WorkbenchError::ConfigReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&content).map_err(|e| WorkbenchError::ConfigParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkbenchError> {
        info!("Saving configuration to {}", path.display());
        let write_error = |e| WorkbenchError::ConfigWriteError {
            path: path.to_path_buf(),
            source: e,
        };
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| write_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        std::fs::write(path, text).map_err(write_error)
    }

    /// The server matching both `host` and `catalog_id`, else the default
    /// server, else the first one.
    pub fn select_server(
        &self,
        host: Option<&str>,
        catalog_id: Option<&str>,
    ) -> Option<&ServerConfig> {
        if let (Some(host), Some(catalog_id)) = (host, catalog_id) {
            if let Some(server) = self
                .servers
                .iter()
                .find(|s| s.host == host && s.catalog_id == catalog_id)
            {
                return Some(server);
            }
        }
        self.servers
            .iter()
            .find(|s| s.default)
            .or_else(|| self.servers.first())
    }
}
