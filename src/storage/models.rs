//! Catalog models
//!
//! Entities are transient: every query rebuilds them from the joined
//! catalog row, nothing here is persisted.
//!
//! # Catalog Adaptations
//! - Author and series are copied by value out of the joined row
//! - A book without a series link has `series == None`
//! - Ratings use Calibre's 0-10 scale (two points per star)
//! - Comments are stored as HTML by Calibre and exposed as plain text

use chrono::{DateTime, Utc};
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{CatalogError, Result};

/// Elements whose text is never part of the description
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "head", "title"];

/// Elements that start a new line of text
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr",
];

// ============================================================================
// VALUE OBJECTS
// ============================================================================

/// Author of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub sort: Option<String>,
}

/// Series a book belongs to, with the book's position in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub name: String,
    pub sort: Option<String>,
    /// Position of the book within the series (`books.series_index`)
    pub index: f64,
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity hydrated from a catalog row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub sort: Option<String>,
    pub author_sort: Option<String>,
    /// Date the book was added to the library
    pub timestamp: Option<DateTime<Utc>>,
    pub pubdate: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Directory of the book relative to the library root
    pub path: String,
    pub uuid: Option<String>,
    pub has_cover: bool,
    /// Plain-text comment, markup removed
    pub comment: Option<String>,
    /// Rating on a 0-10 scale
    pub rating: Option<i64>,
    pub author: Option<Author>,
    pub series: Option<Series>,
}

impl Book {
    /// Rating converted to stars (0-5)
    pub fn stars(&self) -> Option<u8> {
        self.rating.map(|r| (r.clamp(0, 10) / 2) as u8)
    }

    /// Author display name, empty when the book has no author link
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }
}

/// Flat row produced by the catalog select (one column per selected field)
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i64,
    pub title: String,
    pub sort: Option<String>,
    pub author_sort: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub pubdate: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub series_index: f64,
    pub path: String,
    pub uuid: Option<String>,
    pub has_cover: Option<bool>,
    pub comment: Option<String>,
    pub rating: Option<i64>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub author_sort_key: Option<String>,
    pub series_id: Option<i64>,
    pub series_name: Option<String>,
    pub series_sort: Option<String>,
}

/// Turn a joined catalog row into a book with its author and series
///
/// Shared by every query path; query construction never builds entities.
pub fn row_to_book(row: BookRow) -> Book {
    let author = row.author_id.map(|id| Author {
        id,
        name: row.author_name.unwrap_or_default(),
        sort: row.author_sort_key,
    });

    let series = row.series_id.map(|id| Series {
        id,
        name: row.series_name.unwrap_or_default(),
        sort: row.series_sort,
        index: row.series_index,
    });

    let comment = row
        .comment
        .map(|text| strip_markup(&text))
        .filter(|text| !text.is_empty());

    Book {
        id: row.id,
        title: row.title,
        sort: row.sort,
        author_sort: row.author_sort,
        timestamp: row.timestamp,
        pubdate: row.pubdate,
        last_modified: row.last_modified,
        path: row.path,
        uuid: row.uuid,
        has_cover: row.has_cover.unwrap_or(false),
        comment,
        rating: row.rating,
        author,
        series,
    }
}

/// Flatten an HTML comment to plain text
///
/// Entities are decoded by the HTML parser. Script and style content is
/// dropped, and block elements are separated by a newline.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();

    for node in fragment.tree.root().descendants() {
        match node.value() {
            Node::Text(t) => {
                let skipped = node.ancestors().any(|a| {
                    matches!(a.value(), Node::Element(e) if SKIPPED_ELEMENTS.contains(&e.name()))
                });
                if !skipped {
                    text.push_str(t);
                }
            }
            Node::Element(e) if BLOCK_ELEMENTS.contains(&e.name()) => {
                if !text.is_empty() && !text.ends_with(char::is_whitespace) {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.replace('\u{a0}', " ").trim().to_string()
}

// ============================================================================
// PAGINATION
// ============================================================================

/// Offset/limit pair bounding a result sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn new(offset: u64, limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(CatalogError::invalid_argument(
                "page window limit must be greater than zero",
            ));
        }
        Ok(Self { offset, limit })
    }

    /// Window for a 1-based page number
    pub fn page(page_number: u64, page_size: u64) -> Result<Self> {
        if page_number == 0 {
            return Err(CatalogError::invalid_argument("page numbers start at 1"));
        }
        let offset = (page_number - 1)
            .checked_mul(page_size)
            .ok_or_else(|| CatalogError::invalid_argument("page number out of range"))?;
        Self::new(offset, page_size)
    }

    /// 1-based page number this window starts on
    pub fn page_number(&self) -> u64 {
        self.offset / self.limit + 1
    }
}

/// Ordered books plus the unwindowed total when a window was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPage {
    pub books: Vec<Book>,
    /// Number of matches before windowing; only set for paginated queries
    pub total: Option<u64>,
    pub window: Option<PageWindow>,
}

impl BookPage {
    pub fn unpaginated(books: Vec<Book>) -> Self {
        Self {
            books,
            total: None,
            window: None,
        }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.books.iter().map(|b| b.id).collect()
    }

    /// Number of pages needed for the total, if the query was paginated
    pub fn total_pages(&self) -> Option<u64> {
        match (self.total, self.window) {
            (Some(total), Some(window)) => Some(total.div_ceil(window.limit)),
            _ => None,
        }
    }

    pub fn current_page(&self) -> Option<u64> {
        self.window.map(|w| w.page_number())
    }

    pub fn has_next(&self) -> bool {
        match (self.total, self.window) {
            (Some(total), Some(window)) => window.offset.saturating_add(window.limit) < total,
            _ => false,
        }
    }
}
