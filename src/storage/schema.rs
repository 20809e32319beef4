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


//! Catalog schema
//!
//! The subset of Calibre's `metadata.db` schema that catalog queries read.
//! User catalogs are owned by Calibre and are never created or altered
//! here; [`create_catalog_schema`] only builds fixture and in-memory
//! databases with the same shape.

use crate::error::{CatalogError, Result};
use sqlx::{Executor, SqlitePool};

/// Tables every catalog query joins against
pub const CATALOG_TABLES: &[&str] = &[
    "books",
    "authors",
    "books_authors_link",
    "series",
    "books_series_link",
    "tags",
    "books_tags_link",
    "ratings",
    "books_ratings_link",
    "comments",
];

/// Create the catalog tables on an empty database
pub async fn create_catalog_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- Books: one row per book, `path` is the book directory relative to the library root
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT 'Unknown' COLLATE NOCASE,
    sort TEXT COLLATE NOCASE,
    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    pubdate TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    series_index REAL NOT NULL DEFAULT 1.0,
    author_sort TEXT COLLATE NOCASE,
    isbn TEXT DEFAULT '' COLLATE NOCASE,
    lccn TEXT DEFAULT '' COLLATE NOCASE,
    path TEXT NOT NULL DEFAULT '',
    flags INTEGER NOT NULL DEFAULT 1,
    uuid TEXT,
    has_cover BOOL DEFAULT 0,
    last_modified TIMESTAMP NOT NULL DEFAULT '2000-01-01 00:00:00+00:00'
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE,
    sort TEXT COLLATE NOCASE,
    link TEXT NOT NULL DEFAULT '',
    UNIQUE(name)
);

CREATE TABLE IF NOT EXISTS books_authors_link (
    id INTEGER PRIMARY KEY,
    book INTEGER NOT NULL,
    author INTEGER NOT NULL,
    UNIQUE(book, author)
);

CREATE TABLE IF NOT EXISTS series (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE,
    sort TEXT COLLATE NOCASE,
    UNIQUE (name)
);

-- Calibre allows a single series per book
CREATE TABLE IF NOT EXISTS books_series_link (
    id INTEGER PRIMARY KEY,
    book INTEGER NOT NULL,
    series INTEGER NOT NULL,
    UNIQUE(book)
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS books_tags_link (
    id INTEGER PRIMARY KEY,
    book INTEGER NOT NULL,
    tag INTEGER NOT NULL,
    UNIQUE(book, tag)
);

-- Ratings are stored on a 0-10 scale
CREATE TABLE IF NOT EXISTS ratings (
    id INTEGER PRIMARY KEY,
    rating INTEGER CHECK(rating > -1 AND rating < 11),
    UNIQUE (rating)
);

CREATE TABLE IF NOT EXISTS books_ratings_link (
    id INTEGER PRIMARY KEY,
    book INTEGER NOT NULL,
    rating INTEGER NOT NULL,
    UNIQUE(book, rating)
);

CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY,
    book INTEGER NOT NULL,
    text TEXT NOT NULL COLLATE NOCASE,
    UNIQUE(book)
);

CREATE INDEX IF NOT EXISTS authors_idx ON books (author_sort COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS books_idx ON books (sort COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS books_authors_link_aidx ON books_authors_link (author);
CREATE INDEX IF NOT EXISTS books_authors_link_bidx ON books_authors_link (book);
CREATE INDEX IF NOT EXISTS books_series_link_aidx ON books_series_link (series);
CREATE INDEX IF NOT EXISTS books_series_link_bidx ON books_series_link (book);
CREATE INDEX IF NOT EXISTS books_tags_link_aidx ON books_tags_link (tag);
CREATE INDEX IF NOT EXISTS books_tags_link_bidx ON books_tags_link (book);
CREATE INDEX IF NOT EXISTS books_ratings_link_aidx ON books_ratings_link (rating);
CREATE INDEX IF NOT EXISTS books_ratings_link_bidx ON books_ratings_link (book);
CREATE INDEX IF NOT EXISTS comments_idx ON comments (book);
        "#,
    )
    .await?;

    Ok(())
}

/// Check that every table the catalog queries join against exists
pub async fn verify_catalog_schema(pool: &SqlitePool) -> Result<()> {
    for table in CATALOG_TABLES {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(*table)
                .fetch_optional(pool)
                .await?;

        if exists.is_none() {
            return Err(CatalogError::InvalidCatalog {
                table: table.to_string(),
            });
        }
    }

    Ok(())
}
