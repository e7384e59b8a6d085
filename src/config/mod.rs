//! Service configuration
//!
//! Configuration is a plain value passed by reference into each operation;
//! there is no process-wide singleton, and multiple engines with distinct
//! roots or drivers can coexist.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::blob::{BlobDriver, FileSystemDriver};

fn default_chunk_size() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_max_file_size() -> u64 {
    512 * 1024 * 1024 // 512 MiB
}

/// Configuration for one file service instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory resolved for absolute paths
    pub root_file_id: Uuid,

    /// Per-chunk bound for content streaming
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Upper bound for a single regular file's content
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Base URL collaborators use to construct content URLs
    pub files_base_url: String,

    /// Blob driver selection
    pub blob_driver: BlobDriverConfig,
}

/// Blob driver selection, tagged by kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BlobDriverConfig {
    FileSystem { file_system_dir: PathBuf },
}

impl ServiceConfig {
    pub fn new(
        root_file_id: Uuid,
        files_base_url: impl Into<String>,
        blob_driver: BlobDriverConfig,
    ) -> Self {
        Self {
            root_file_id,
            chunk_size: default_chunk_size(),
            max_file_size: default_max_file_size(),
            files_base_url: files_base_url.into(),
            blob_driver,
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}

impl BlobDriverConfig {
    /// Instantiates the configured driver.
    pub fn create_driver(&self) -> Arc<dyn BlobDriver> {
        match self {
            Self::FileSystem { file_system_dir } => {
                Arc::new(FileSystemDriver::new(file_system_dir.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{
                "root_file_id": "42bd9c32-1c96-485f-af69-b48536bc3c4a",
                "files_base_url": "http://localhost:8000/files",
                "blob_driver": { "kind": "file-system", "file_system_dir": "/var/lib/grove" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.chunk_size, 10 * 1024 * 1024);
        assert_eq!(config.max_file_size, 512 * 1024 * 1024);
        let BlobDriverConfig::FileSystem { file_system_dir } = &config.blob_driver;
        assert_eq!(file_system_dir, &PathBuf::from("/var/lib/grove"));
    }

    #[test]
    fn round_trips_through_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("grove.json");

        let config = ServiceConfig::new(
            Uuid::new_v4(),
            "http://localhost:8000/files",
            BlobDriverConfig::FileSystem { file_system_dir: tmp.path().join("blobs") },
        );
        config.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded.root_file_id, config.root_file_id);
        assert_eq!(loaded.files_base_url, config.files_base_url);
    }

    #[test]
    fn driver_kind_is_kebab_cased() {
        let config = ServiceConfig::new(
            Uuid::new_v4(),
            "http://h/files",
            BlobDriverConfig::FileSystem { file_system_dir: "/tmp/blobs".into() },
        );
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["blob_driver"]["kind"], "file-system");
    }
}
