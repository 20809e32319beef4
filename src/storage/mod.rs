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


//! Catalog storage and models
//!
//! This module reads a Calibre library database (`metadata.db`) using SQLite.
//! It never writes: the library belongs to Calibre.
//!
//! # Database Schema
//! - books: Core book metadata (title, sort, timestamp, path, ...)
//! - authors / series / tags / ratings: Lookup tables
//! - books_*_link: Junction tables from books to each lookup table
//! - comments: HTML description per book
//!
//! # Usage Example
//! ```no_run
//! use catalog_core::storage::{queries, CatalogFilter, Database, PageWindow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open("/srv/calibre/metadata.db").await?;
//!
//! // Second page of a tag, leaving out the book currently displayed
//! let filter = CatalogFilter::new()
//!     .exclude_book(42)
//!     .paginate(PageWindow::page(2, 20)?);
//! let page = queries::load_by_tag(db.pool(), 7, &filter).await?;
//! println!("{} of {:?} books", page.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod models;
pub mod queries;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use database::Database;
pub use models::{row_to_book, strip_markup, Author, Book, BookPage, BookRow, PageWindow, Series};
pub use query::{CatalogFilter, CatalogQuery, Predicate, SortKey, TagJoin};
