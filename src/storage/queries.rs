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


//! Catalog query functions
//!
//! Read-only book listings over the catalog. Every function builds a
//! [`CatalogQuery`], runs it against the pool and hydrates rows with
//! [`row_to_book`].
//!
//! # Query Patterns
//! - Per-call [`CatalogFilter`] for exclusions and page windows
//! - Paginated listings run the count query first, then the windowed rows
//! - Only [`load_book`] fails when nothing matches

use crate::error::{CatalogError, Result};
use crate::storage::models::{row_to_book, Book, BookPage, BookRow, PageWindow};
use crate::storage::query::{
    CatalogFilter, CatalogQuery, Predicate, TagJoin, KEYWORD_ORDER, LATEST_ORDER, SERIES_ORDER,
    TAG_ORDER,
};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

// ============================================================================
// SINGLE BOOK
// ============================================================================

/// Load one book by id
///
/// Fails with `BookNotFound` when no row matches.
pub async fn load_book(pool: &SqlitePool, book_id: i64) -> Result<Book> {
    let query = CatalogQuery::new().predicate(Predicate::BookId(book_id));

    let mut builder = query.rows();
    let row = builder
        .build_query_as::<BookRow>()
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(row_to_book(row)),
        None => {
            debug!(book_id, "book not found");
            Err(CatalogError::not_found(book_id))
        }
    }
}

// ============================================================================
// LISTINGS
// ============================================================================

/// Latest additions, newest first
///
/// The filter's exclusions apply; its page window is ignored, `count`
/// is the window.
pub async fn load_latest(pool: &SqlitePool, count: u32, filter: &CatalogFilter) -> Result<Vec<Book>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let exclusions = CatalogFilter {
        page: None,
        ..*filter
    };
    let query = CatalogQuery::new()
        .order_by(LATEST_ORDER)
        .with_filter(&exclusions)
        .window(PageWindow::new(0, u64::from(count))?);

    fetch_books(pool, &query).await
}

/// Books of a series, in reading order
pub async fn load_by_series(
    pool: &SqlitePool,
    series_id: i64,
    filter: &CatalogFilter,
) -> Result<BookPage> {
    let query = CatalogQuery::new()
        .predicate(Predicate::SeriesId(series_id))
        .order_by(SERIES_ORDER)
        .with_filter(filter);

    fetch_page(pool, &query).await
}

/// Books by an author, grouped by series
pub async fn load_by_author(
    pool: &SqlitePool,
    author_id: i64,
    filter: &CatalogFilter,
) -> Result<BookPage> {
    let query = CatalogQuery::new()
        .predicate(Predicate::AuthorId(author_id))
        .order_by(SERIES_ORDER)
        .with_filter(filter);

    fetch_page(pool, &query).await
}

/// Books carrying a tag
pub async fn load_by_tag(pool: &SqlitePool, tag_id: i64, filter: &CatalogFilter) -> Result<BookPage> {
    let query = CatalogQuery::new()
        .tag_join(TagJoin::Inner)
        .predicate(Predicate::TagId(tag_id))
        .order_by(TAG_ORDER)
        .with_filter(filter);

    fetch_page(pool, &query).await
}

/// Books whose directory path contains every keyword
///
/// Blank keywords are ignored; fails with `InvalidArgument` when none are left.
pub async fn load_by_keywords<S: AsRef<str>>(
    pool: &SqlitePool,
    keywords: &[S],
    filter: &CatalogFilter,
) -> Result<BookPage> {
    let keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.as_ref())
        .filter(|k| !k.trim().is_empty())
        .collect();

    if keywords.is_empty() {
        warn!("keyword search rejected: no keywords");
        return Err(CatalogError::invalid_argument(
            "keyword search needs at least one keyword",
        ));
    }

    let query = keywords
        .iter()
        .fold(CatalogQuery::new().tag_join(TagJoin::Left), |query, keyword| {
            query.predicate(Predicate::PathContains(keyword.to_string()))
        })
        .order_by(KEYWORD_ORDER)
        .with_filter(filter);

    fetch_page(pool, &query).await
}

/// Number of books in the catalog
pub async fn count_books(pool: &SqlitePool) -> Result<u64> {
    count_matches(pool, &CatalogQuery::new()).await
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Run the count query (when windowed) and then the row query
async fn fetch_page(pool: &SqlitePool, query: &CatalogQuery) -> Result<BookPage> {
    let window = query.page_window();
    let total = match window {
        Some(_) => Some(count_matches(pool, query).await?),
        None => None,
    };

    let books = fetch_books(pool, query).await?;

    Ok(BookPage {
        books,
        total,
        window,
    })
}

async fn fetch_books(pool: &SqlitePool, query: &CatalogQuery) -> Result<Vec<Book>> {
    let mut builder = query.rows();
    debug!(sql = builder.sql(), "loading books");

    let rows = builder.build_query_as::<BookRow>().fetch_all(pool).await?;
    debug!(rows = rows.len(), "loaded books");

    Ok(rows.into_iter().map(row_to_book).collect())
}

async fn count_matches(pool: &SqlitePool, query: &CatalogQuery) -> Result<u64> {
    let mut builder = query.count();
    debug!(sql = builder.sql(), "counting books");

    let row = builder.build().fetch_one(pool).await?;
    let total: i64 = row.try_get(0)?;

    Ok(u64::try_from(total).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    /// Small catalog:
    /// - 1 "Dune" (Herbert, Dune #1, tags sf+classic, rated, html comment)
    /// - 2 "Dune Messiah" (Herbert, Dune #2, tag sf)
    /// - 3 "Neuromancer" (Gibson, no series, tag sf)
    /// - 4 "Emma" (Austen, no series, no tags)
    async fn seeded_db() -> Database {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let statements = [
            "INSERT INTO authors (id, name, sort) VALUES
                (1, 'Frank Herbert', 'Herbert, Frank'),
                (2, 'William Gibson', 'Gibson, William'),
                (3, 'Jane Austen', 'Austen, Jane')",
            "INSERT INTO series (id, name, sort) VALUES (1, 'Dune', 'Dune')",
            "INSERT INTO tags (id, name) VALUES (1, 'sf'), (2, 'classic')",
            "INSERT INTO ratings (id, rating) VALUES (1, 8)",
            "INSERT INTO books (id, title, sort, timestamp, series_index, author_sort, path, has_cover) VALUES
                (1, 'Dune', 'Dune', '2021-01-01 10:00:00+00:00', 1.0, 'Herbert, Frank', 'Frank Herbert/Dune (1)', 1),
                (2, 'Dune Messiah', 'Dune Messiah', '2022-01-01 10:00:00+00:00', 2.0, 'Herbert, Frank', 'Frank Herbert/Dune Messiah (2)', 0),
                (3, 'Neuromancer', 'Neuromancer', '2023-01-01 10:00:00+00:00', 1.0, 'Gibson, William', 'William Gibson/Neuromancer (3)', 0),
                (4, 'Emma', 'Emma', '2020-01-01 10:00:00+00:00', 1.0, 'Austen, Jane', 'Jane Austen/Emma (4)', 0)",
            "INSERT INTO books_authors_link (book, author) VALUES (1, 1), (2, 1), (3, 2), (4, 3)",
            "INSERT INTO books_series_link (book, series) VALUES (1, 1), (2, 1)",
            "INSERT INTO books_tags_link (book, tag) VALUES (1, 1), (1, 2), (2, 1), (3, 1)",
            "INSERT INTO books_ratings_link (book, rating) VALUES (1, 1)",
            "INSERT INTO comments (book, text) VALUES (1, '<p>Desert <i>planet</i>.</p>')",
        ];
        for sql in statements {
            sqlx::query(sql).execute(db.pool()).await.expect("Failed to seed catalog");
        }
        db
    }

    #[tokio::test]
    async fn test_load_book_hydrates_relations() {
        let db = seeded_db().await;
        let book = load_book(db.pool(), 1).await.expect("Failed to load book");

        assert_eq!(book.title, "Dune");
        assert_eq!(book.comment.as_deref(), Some("Desert planet."));
        assert_eq!(book.rating, Some(8));
        assert!(book.has_cover);
        assert_eq!(book.author.as_ref().map(|a| a.name.as_str()), Some("Frank Herbert"));
        let series = book.series.expect("Dune is in a series");
        assert_eq!((series.id, series.index), (1, 1.0));
    }

    #[tokio::test]
    async fn test_load_book_not_found() {
        let db = seeded_db().await;
        let err = load_book(db.pool(), 999).await.unwrap_err();
        assert!(matches!(err, CatalogError::BookNotFound(999)));
    }

    #[tokio::test]
    async fn test_book_without_series() {
        let db = seeded_db().await;
        let book = load_book(db.pool(), 3).await.expect("Failed to load book");
        assert!(book.series.is_none());
        assert!(book.comment.is_none());
        assert!(book.rating.is_none());
    }

    #[tokio::test]
    async fn test_load_latest_orders_by_timestamp_desc() {
        let db = seeded_db().await;
        let books = load_latest(db.pool(), 3, &CatalogFilter::new())
            .await
            .expect("Failed to load latest");

        let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_load_latest_zero_is_empty() {
        let db = seeded_db().await;
        let books = load_latest(db.pool(), 0, &CatalogFilter::new())
            .await
            .expect("Failed to load latest");
        assert!(books.is_empty());
    }

    #[tokio::test]
    async fn test_load_latest_with_exclusion() {
        let db = seeded_db().await;
        let books = load_latest(db.pool(), 10, &CatalogFilter::new().exclude_book(3))
            .await
            .expect("Failed to load latest");
        assert!(books.iter().all(|b| b.id != 3));
        assert_eq!(books.len(), 3);
    }

    #[tokio::test]
    async fn test_load_by_series_reading_order() {
        let db = seeded_db().await;
        let page = load_by_series(db.pool(), 1, &CatalogFilter::new())
            .await
            .expect("Failed to load series");

        assert_eq!(page.ids(), vec![1, 2]);
        assert_eq!(page.total, None);
    }

    #[tokio::test]
    async fn test_load_by_author() {
        let db = seeded_db().await;
        let page = load_by_author(db.pool(), 1, &CatalogFilter::new().exclude_book(1))
            .await
            .expect("Failed to load author");
        assert_eq!(page.ids(), vec![2]);
    }

    #[tokio::test]
    async fn test_load_by_tag_paginated() {
        let db = seeded_db().await;
        let filter = CatalogFilter::new().paginate(PageWindow::new(0, 2).unwrap());
        let page = load_by_tag(db.pool(), 1, &filter).await.expect("Failed to load tag");

        assert_eq!(page.total, Some(3));
        assert_eq!(page.len(), 2);
        assert_eq!(page.total_pages(), Some(2));
        // Neuromancer has no series and sorts first (NULL series name)
        assert_eq!(page.ids(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_load_by_tag_excluding_series_keeps_unseried_books() {
        let db = seeded_db().await;
        let page = load_by_tag(db.pool(), 1, &CatalogFilter::new().exclude_series(1))
            .await
            .expect("Failed to load tag");
        assert_eq!(page.ids(), vec![3]);
    }

    #[tokio::test]
    async fn test_identical_sort_keys_page_by_id() {
        let db = seeded_db().await;
        let statements = [
            "INSERT INTO books (id, title, sort, series_index, author_sort, path) VALUES
                (6, 'Untitled', 'Untitled', 1.0, 'Austen, Jane', 'Jane Austen/Untitled (6)'),
                (5, 'Untitled', 'Untitled', 1.0, 'Austen, Jane', 'Jane Austen/Untitled (5)')",
            "INSERT INTO books_authors_link (book, author) VALUES (5, 3), (6, 3)",
            "INSERT INTO tags (id, name) VALUES (3, 'draft')",
            "INSERT INTO books_tags_link (book, tag) VALUES (5, 3), (6, 3)",
        ];
        for sql in statements {
            sqlx::query(sql).execute(db.pool()).await.expect("Failed to seed catalog");
        }

        let mut seen = Vec::new();
        for page_number in 1..=2 {
            let filter = CatalogFilter::new().paginate(PageWindow::page(page_number, 1).unwrap());
            let page = load_by_tag(db.pool(), 3, &filter).await.expect("Failed to load tag");
            assert_eq!(page.total, Some(2));
            seen.extend(page.ids());
        }
        assert_eq!(seen, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_keywords_deduplicate_multi_tag_books() {
        let db = seeded_db().await;
        let page = load_by_keywords(db.pool(), &["Herbert", "Dune"], &CatalogFilter::new())
            .await
            .expect("Failed to search");

        assert_eq!(page.ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_keywords_paginated_total_counts_books() {
        let db = seeded_db().await;
        let filter = CatalogFilter::new().paginate(PageWindow::new(0, 1).unwrap());
        let page = load_by_keywords(db.pool(), &["Dune"], &filter)
            .await
            .expect("Failed to search");

        assert_eq!(page.total, Some(2));
        assert_eq!(page.ids(), vec![1]);
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn test_keywords_are_literal_substrings() {
        let db = seeded_db().await;
        let page = load_by_keywords(db.pool(), &["%"], &CatalogFilter::new())
            .await
            .expect("Failed to search");
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_keywords_keep_surrounding_whitespace() {
        let db = seeded_db().await;
        let page = load_by_keywords(db.pool(), &["Herbert"], &CatalogFilter::new())
            .await
            .expect("Failed to search");
        assert_eq!(page.ids(), vec![1, 2]);

        // Author directories end in '/', never in a space
        let page = load_by_keywords(db.pool(), &["Herbert "], &CatalogFilter::new())
            .await
            .expect("Failed to search");
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_blank_keywords_rejected() {
        let db = seeded_db().await;
        let empty: [&str; 0] = [];
        let err = load_by_keywords(db.pool(), &empty, &CatalogFilter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));

        let err = load_by_keywords(db.pool(), &["  "], &CatalogFilter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_count_books() {
        let db = seeded_db().await;
        assert_eq!(count_books(db.pool()).await.expect("Failed to count"), 4);
    }
}
