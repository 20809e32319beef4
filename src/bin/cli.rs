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


use std::path::PathBuf;

use anyhow::{Context, Result};
use catalog_core::{queries, CatalogConfig, CatalogFilter, Database, PageWindow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Catalog CLI - inspect a Calibre library from the desktop", long_about = None)]
struct Cli {
    /// Path to metadata.db (overrides config and CATALOG_DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct FilterArgs {
    /// Leave this book out of the listing
    #[arg(long)]
    exclude_book: Option<i64>,

    /// Leave books of this series out of the listing
    #[arg(long)]
    exclude_series: Option<i64>,

    /// 1-based page number; enables total counting
    #[arg(long)]
    page: Option<u64>,

    /// Books per page (defaults to the configured page size)
    #[arg(long)]
    page_size: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a single book
    Book { id: i64 },
    /// Latest additions
    Latest {
        /// Number of books (defaults to the configured latest count)
        count: Option<u32>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Books of a series
    Series {
        id: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Books by an author
    Author {
        id: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Books carrying a tag
    Tag {
        id: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Books whose path contains every keyword
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Number of books in the library
    Count,
}

impl FilterArgs {
    fn to_filter(self, config: &CatalogConfig) -> Result<CatalogFilter> {
        let mut filter = CatalogFilter::new();
        if let Some(id) = self.exclude_book {
            filter = filter.exclude_book(id);
        }
        if let Some(id) = self.exclude_series {
            filter = filter.exclude_series(id);
        }
        if let Some(page) = self.page {
            let size = self.page_size.unwrap_or(u64::from(config.page_size));
            filter = filter.paginate(PageWindow::page(page, size)?);
        }
        Ok(filter)
    }
}

fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let config = match &cli.config {
        Some(path) => CatalogConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CatalogConfig::default(),
    };
    let mut config = config.with_env_overrides()?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let db = Database::with_config(&config)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let pool = db.pool();

    match cli.command {
        Commands::Book { id } => match queries::load_book(pool, id).await {
            Ok(book) => print_json(&book)?,
            Err(e) if e.is_not_found() => {
                eprintln!("{}", e.user_message());
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Latest { count, filter } => {
            let count = count.unwrap_or(config.latest_count);
            let books = queries::load_latest(pool, count, &filter.to_filter(&config)?).await?;
            print_json(&books)?;
        }
        Commands::Series { id, filter } => {
            print_json(&queries::load_by_series(pool, id, &filter.to_filter(&config)?).await?)?;
        }
        Commands::Author { id, filter } => {
            print_json(&queries::load_by_author(pool, id, &filter.to_filter(&config)?).await?)?;
        }
        Commands::Tag { id, filter } => {
            print_json(&queries::load_by_tag(pool, id, &filter.to_filter(&config)?).await?)?;
        }
        Commands::Search { keywords, filter } => {
            let page = queries::load_by_keywords(pool, &keywords, &filter.to_filter(&config)?).await?;
            print_json(&page)?;
        }
        Commands::Count => {
            println!("{}", queries::count_books(pool).await?);
        }
    }

    db.close().await?;
    Ok(())
}
