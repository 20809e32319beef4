// ShelfCatalog - Calibre library browsing core
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Catalog configuration
//!
//! Settings are read from an optional JSON file and then overridden by
//! environment variables:
//! - `CATALOG_DATABASE_PATH` - path to Calibre's `metadata.db`
//! - `CATALOG_PAGE_SIZE` - books per page for paginated listings
//! - `CATALOG_LATEST_COUNT` - number of books on the "latest" shelf

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATABASE_PATH: &str = "CATALOG_DATABASE_PATH";
pub const ENV_PAGE_SIZE: &str = "CATALOG_PAGE_SIZE";
pub const ENV_LATEST_COUNT: &str = "CATALOG_LATEST_COUNT";

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_LATEST_COUNT: u32 = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;

/// Configuration for opening and browsing a catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the catalog database (Calibre's `metadata.db`)
    pub database_path: PathBuf,

    /// Books per page for paginated listings
    pub page_size: u32,

    /// Number of books returned by the latest-additions query
    pub latest_count: u32,

    /// Size of the read-only connection pool
    pub max_connections: u32,

    /// How long to wait on a locked database (Calibre may be writing)
    pub busy_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("metadata.db"),
            page_size: DEFAULT_PAGE_SIZE,
            latest_count: DEFAULT_LATEST_COUNT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }
}

impl CatalogConfig {
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::new()
    }

    /// Load configuration from a JSON file; missing keys fall back to defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::FileIoError(format!(
                "Failed to read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: CatalogConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            self.page_size = size.trim().parse()?;
        }
        if let Some(count) = lookup(ENV_LATEST_COUNT) {
            self.latest_count = count.trim().parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject settings that would make every paginated query empty
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(CatalogError::configuration("page_size must be greater than zero"));
        }
        if self.max_connections == 0 {
            return Err(CatalogError::configuration(
                "max_connections must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

/// Builder for CatalogConfig
#[derive(Debug)]
pub struct CatalogConfigBuilder {
    config: CatalogConfig,
}

impl CatalogConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CatalogConfig::default(),
        }
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn latest_count(mut self, latest_count: u32) -> Self {
        self.config.latest_count = latest_count;
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout_secs = timeout.as_secs();
        self
    }

    pub fn build(self) -> Result<CatalogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for CatalogConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = CatalogConfig::builder()
            .database_path("/srv/calibre/metadata.db")
            .page_size(50)
            .busy_timeout(Duration::from_secs(5))
            .build()
            .expect("valid config");

        assert_eq!(config.database_path, PathBuf::from("/srv/calibre/metadata.db"));
        assert_eq!(config.page_size, 50);
        assert_eq!(config.latest_count, DEFAULT_LATEST_COUNT);
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = CatalogConfig::builder().page_size(0).build().unwrap_err();
        assert!(matches!(err, CatalogError::ConfigurationError(_)));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE_PATH, "/books/metadata.db"),
            (ENV_PAGE_SIZE, " 15 "),
        ]
        .into_iter()
        .collect();

        let config = CatalogConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides apply");

        assert_eq!(config.database_path, PathBuf::from("/books/metadata.db"));
        assert_eq!(config.page_size, 15);
        assert_eq!(config.latest_count, DEFAULT_LATEST_COUNT);
    }

    #[test]
    fn test_invalid_override_is_configuration_error() {
        let err = CatalogConfig::default()
            .with_overrides(|key| (key == ENV_LATEST_COUNT).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, CatalogError::ConfigurationError(_)));
    }

    #[test]
    fn test_partial_json_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "database_path": "/lib/metadata.db", "latest_count": 3 }}"#)
            .expect("write config");

        let config = CatalogConfig::from_json_file(file.path()).expect("load config");
        assert_eq!(config.database_path, PathBuf::from("/lib/metadata.db"));
        assert_eq!(config.latest_count, 3);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_missing_json_file() {
        let err = CatalogConfig::from_json_file("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, CatalogError::FileIoError(_)));
    }
}
