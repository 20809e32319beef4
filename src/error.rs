//! Error types for the catalog crate
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are grouped by where they originate: lookups that found nothing,
//! inputs rejected before any SQL is issued, catalog/configuration problems,
//! and opaque failures bubbling up from the storage driver.
//!
//! Only single-book lookups fail when nothing matches; list queries return
//! an empty page instead.

use thiserror::Error;

/// Result type alias using our CatalogError type
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Main error type for catalog queries
#[derive(Error, Debug)]
pub enum CatalogError {
    // ===== Lookup Errors =====

    /// No book row matched the requested id
    #[error("Book with id {0} not found")]
    BookNotFound(i64),

    // ===== Input Errors =====

    /// Structurally invalid input (empty keyword set, zero-sized page window, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ===== Catalog/Configuration Errors =====

    /// The opened database is missing a table the catalog queries rely on
    #[error("Not a catalog database: missing table '{table}'")]
    InvalidCatalog {
        table: String,
    },

    /// Configuration file or environment override is invalid
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// File I/O error with path context
    #[error("File I/O error: {0}")]
    FileIoError(String),

    // ===== External Library Errors =====
    // Automatic conversions from external error types

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<std::num::ParseIntError> for CatalogError {
    fn from(err: std::num::ParseIntError) -> Self {
        CatalogError::ConfigurationError(format!("Failed to parse integer: {}", err))
    }
}

// Helper methods for creating common errors
impl CatalogError {
    /// Create a BookNotFound error for a book id
    pub fn not_found(book_id: i64) -> Self {
        CatalogError::BookNotFound(book_id)
    }

    /// Create an InvalidArgument error with a message
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        CatalogError::InvalidArgument(message.into())
    }

    /// Create a ConfigurationError with a message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        CatalogError::ConfigurationError(message.into())
    }

    /// Check if the error means the requested book does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::BookNotFound(_))
    }

    /// Check if the error was raised by the storage layer rather than by input checks
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            CatalogError::SqlxError(_) | CatalogError::InvalidCatalog { .. }
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::BookNotFound(id) => {
                format!("The book #{} does not exist in this library.", id)
            }
            CatalogError::InvalidCatalog { table } => {
                format!(
                    "This file does not look like a Calibre library (table '{}' is missing).",
                    table
                )
            }
            CatalogError::SqlxError(_) => {
                "The library database could not be read. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
