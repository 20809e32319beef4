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


//! Catalog database connection
//!
//! # Catalog Location
//! Calibre keeps `metadata.db` at the root of the library folder, next to
//! the `Author/Title (id)` book directories. The file belongs to Calibre:
//! it is opened read-only and its schema is only verified, never migrated.
//!
//! # SQLite Configuration
//! - Read-only connections, the file must already exist
//! - Busy timeout so a running Calibre instance does not fail queries
//! - Statement logging disabled (queries are traced by `storage::queries`)

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::storage::schema;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Catalog database handle - owns the connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>, // None for in-memory databases
}

impl Database {
    /// Open an existing catalog with default settings
    ///
    /// # Errors
    /// Returns error if:
    /// - The file does not exist
    /// - The file can't be opened as SQLite
    /// - A catalog table is missing (`InvalidCatalog`)
    pub async fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let config = CatalogConfig::builder()
            .database_path(database_path.as_ref())
            .build()?;
        Self::with_config(&config).await
    }

    /// Open the catalog described by a configuration
    pub async fn with_config(config: &CatalogConfig) -> Result<Self> {
        let path = config.database_path.as_path();

        if !path.is_file() {
            return Err(CatalogError::FileIoError(format!(
                "Catalog database not found: {}",
                path.display()
            )));
        }

        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(config.busy_timeout())
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_opts)
            .await?;

        schema::verify_catalog_schema(&pool).await?;

        info!(path = %path.display(), "opened catalog database");

        Ok(Self {
            pool,
            path: Some(path.to_path_buf()),
        })
    }

    /// Create in-memory catalog with the schema in place (fixtures, demos)
    ///
    /// The pool keeps exactly one connection alive for its whole lifetime;
    /// every new connection to `sqlite::memory:` would see an empty database.
    pub async fn new_in_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;

        schema::create_catalog_schema(&pool).await?;

        Ok(Self { pool, path: None })
    }

    /// Get reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database file path
    ///
    /// Returns `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Close database and release all connections
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    /// Quick integrity check of the catalog file
    pub async fn check_integrity(&self) -> Result<bool> {
        let result: String = sqlx::query_scalar("PRAGMA quick_check")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == "ok")
    }
}
