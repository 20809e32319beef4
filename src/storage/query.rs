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


//! Catalog query specification and SQL rendering
//!
//! A [`CatalogQuery`] describes one book listing: which optional tag join
//! it needs, its predicates, its sort keys and an optional page window.
//! The row query and the count query are both rendered from that single
//! value, so a page and its total always see the same filters.
//!
//! # Join Topology
//! ```text
//! books main
//!   LEFT JOIN comments            com
//!   LEFT JOIN books_authors_link  bal  -> authors author
//!   LEFT JOIN books_series_link   bsl  -> series  serie
//!   LEFT JOIN books_ratings_link  brl  -> ratings rating
//!   [INNER|LEFT] JOIN books_tags_link btl -> tags tag   (tag/keyword listings)
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::storage::models::PageWindow;

const SELECT_COLUMNS: &str = r#"
SELECT
    main.id AS id,
    main.title AS title,
    main.sort AS sort,
    main.author_sort AS author_sort,
    main.timestamp AS timestamp,
    main.pubdate AS pubdate,
    main.last_modified AS last_modified,
    main.series_index AS series_index,
    main.path AS path,
    main.uuid AS uuid,
    main.has_cover AS has_cover,
    com.text AS comment,
    rating.rating AS rating,
    author.id AS author_id,
    author.name AS author_name,
    author.sort AS author_sort_key,
    serie.id AS series_id,
    serie.name AS series_name,
    serie.sort AS series_sort"#;

const BASE_JOINS: &str = r#"
FROM books main
LEFT JOIN comments com ON com.book = main.id
LEFT JOIN books_authors_link bal ON bal.book = main.id
LEFT JOIN authors author ON author.id = bal.author
LEFT JOIN books_series_link bsl ON bsl.book = main.id
LEFT JOIN series serie ON serie.id = bsl.series
LEFT JOIN books_ratings_link brl ON brl.book = main.id
LEFT JOIN ratings rating ON rating.id = brl.rating"#;

/// One-shot options for a single listing call
///
/// Built fresh for every call and passed by reference, so exclusions and
/// windows never leak into a later query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub exclude_book_id: Option<i64>,
    pub exclude_series_id: Option<i64>,
    pub page: Option<PageWindow>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit this book from the results
    pub fn exclude_book(mut self, book_id: i64) -> Self {
        self.exclude_book_id = Some(book_id);
        self
    }

    /// Omit books of this series; books without a series are kept
    pub fn exclude_series(mut self, series_id: i64) -> Self {
        self.exclude_series_id = Some(series_id);
        self
    }

    /// Window the results and report the unwindowed total
    pub fn paginate(mut self, window: PageWindow) -> Self {
        self.page = Some(window);
        self
    }
}

/// How the tag link table participates in the join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagJoin {
    None,
    /// Books must carry a tag (tag listings)
    Inner,
    /// Tags are joined but optional (keyword search)
    Left,
}

/// A single `WHERE` condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    BookId(i64),
    AuthorId(i64),
    SeriesId(i64),
    TagId(i64),
    /// Literal substring match on the book directory
    PathContains(String),
    ExcludeBook(i64),
    ExcludeSeries(i64),
}

/// Sort key, ascending unless stated otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TimestampDesc,
    SeriesName,
    SeriesIndex,
    AuthorSort,
    AuthorName,
    Title,
    /// Final tie-breaker so windows never overlap
    Id,
}

impl SortKey {
    fn as_sql(&self) -> &'static str {
        match self {
            SortKey::TimestampDesc => "main.timestamp DESC",
            SortKey::SeriesName => "serie.name",
            SortKey::SeriesIndex => "main.series_index",
            SortKey::AuthorSort => "author.sort",
            SortKey::AuthorName => "author.name",
            SortKey::Title => "main.title",
            SortKey::Id => "main.id",
        }
    }
}

/// Newest additions first
pub const LATEST_ORDER: &[SortKey] = &[SortKey::TimestampDesc, SortKey::Id];

/// Series name, position in series, title
pub const SERIES_ORDER: &[SortKey] = &[
    SortKey::SeriesName,
    SortKey::SeriesIndex,
    SortKey::Title,
    SortKey::Id,
];

/// Series name, position in series, author sort key, title
pub const TAG_ORDER: &[SortKey] = &[
    SortKey::SeriesName,
    SortKey::SeriesIndex,
    SortKey::AuthorSort,
    SortKey::Title,
    SortKey::Id,
];

/// Series name, position in series, author name, title
pub const KEYWORD_ORDER: &[SortKey] = &[
    SortKey::SeriesName,
    SortKey::SeriesIndex,
    SortKey::AuthorName,
    SortKey::Title,
    SortKey::Id,
];

/// Full description of a book listing
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    tag_join: TagJoin,
    predicates: Vec<Predicate>,
    order: Vec<SortKey>,
    window: Option<PageWindow>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self {
            tag_join: TagJoin::None,
            predicates: Vec::new(),
            order: Vec::new(),
            window: None,
        }
    }

    pub fn tag_join(mut self, join: TagJoin) -> Self {
        self.tag_join = join;
        self
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, keys: &[SortKey]) -> Self {
        self.order.extend_from_slice(keys);
        self
    }

    pub fn window(mut self, window: PageWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Apply the exclusions and page window of a per-call filter
    pub fn with_filter(mut self, filter: &CatalogFilter) -> Self {
        if let Some(book_id) = filter.exclude_book_id {
            self.predicates.push(Predicate::ExcludeBook(book_id));
        }
        if let Some(series_id) = filter.exclude_series_id {
            self.predicates.push(Predicate::ExcludeSeries(series_id));
        }
        if let Some(window) = filter.page {
            self.window = Some(window);
        }
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn page_window(&self) -> Option<PageWindow> {
        self.window
    }

    /// Row query: select list, joins, filters, grouping, ordering and window
    pub fn rows(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(SELECT_COLUMNS);
        self.push_filtered_join(&mut qb);
        qb.push(" GROUP BY main.id");

        if !self.order.is_empty() {
            qb.push(" ORDER BY ");
            let mut keys = qb.separated(", ");
            for key in &self.order {
                keys.push(key.as_sql());
            }
        }

        if let Some(window) = self.window {
            qb.push(" LIMIT ");
            qb.push_bind(to_sql_int(window.limit));
            qb.push(" OFFSET ");
            qb.push_bind(to_sql_int(window.offset));
        }

        qb
    }

    /// Count query: same joins and filters, counting distinct books
    pub fn count(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT COUNT(DISTINCT main.id)");
        self.push_filtered_join(&mut qb);
        qb
    }

    fn push_filtered_join(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(BASE_JOINS);

        match self.tag_join {
            TagJoin::None => {}
            TagJoin::Inner => {
                qb.push(
                    " INNER JOIN books_tags_link btl ON btl.book = main.id \
                     INNER JOIN tags tag ON tag.id = btl.tag",
                );
            }
            TagJoin::Left => {
                qb.push(
                    " LEFT JOIN books_tags_link btl ON btl.book = main.id \
                     LEFT JOIN tags tag ON tag.id = btl.tag",
                );
            }
        }

        qb.push(" WHERE 1 = 1");
        for predicate in &self.predicates {
            match predicate {
                Predicate::BookId(id) => {
                    qb.push(" AND main.id = ").push_bind(*id);
                }
                Predicate::AuthorId(id) => {
                    qb.push(" AND author.id = ").push_bind(*id);
                }
                Predicate::SeriesId(id) => {
                    qb.push(" AND serie.id = ").push_bind(*id);
                }
                Predicate::TagId(id) => {
                    qb.push(" AND tag.id = ").push_bind(*id);
                }
                Predicate::PathContains(keyword) => {
                    qb.push(" AND main.path LIKE ")
                        .push_bind(like_pattern(keyword))
                        .push(" ESCAPE '\\'");
                }
                Predicate::ExcludeBook(id) => {
                    qb.push(" AND main.id <> ").push_bind(*id);
                }
                Predicate::ExcludeSeries(id) => {
                    qb.push(" AND (serie.id IS NULL OR serie.id <> ")
                        .push_bind(*id)
                        .push(")");
                }
            }
        }
    }
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// `%keyword%` with LIKE wildcards in the keyword escaped
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// SQLite integers are signed 64-bit
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
