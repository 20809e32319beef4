//! Read-only browsing of a Calibre e-book library
//!
//! Book listings by author, series, tag or keyword over Calibre's
//! `metadata.db`, with exclusion filters and paginated totals.

pub mod config;
pub mod error;
pub mod storage;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use storage::{
    queries, Author, Book, BookPage, CatalogFilter, Database, PageWindow, Series,
};
