//! Reference catalog database
//!
//! A single `birds` table in SQLite holding one row per species key. Rows
//! are keyed by the case-folded species name (`species_key`), so lookups and
//! upserts ignore letter case beyond ASCII as well.

pub mod catalog;

pub use catalog::SqliteCatalog;

use birdcall_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Open (creating if missing) the catalog database and its tables
///
/// `sqlite::memory:` URLs get a single long-lived connection, otherwise
/// every pooled connection would see its own empty database.
pub async fn init_catalog_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");

    tracing::debug!(url = database_url, in_memory, "Connecting to catalog database");

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the `birds` table if it doesn't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS birds (
            species_key TEXT PRIMARY KEY,
            species TEXT NOT NULL,
            common_name TEXT NOT NULL,
            scientific_name TEXT NOT NULL,
            image TEXT NOT NULL DEFAULT '',
            size TEXT NOT NULL DEFAULT '',
            weight TEXT NOT NULL DEFAULT '',
            colors TEXT NOT NULL DEFAULT '',
            habitat TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Catalog tables initialized (birds)");

    Ok(())
}
