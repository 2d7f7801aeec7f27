//! SQLite-backed species reference catalog

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;

use crate::models::{species_key, ReferenceFact};
use crate::types::{CatalogError, ReferenceCatalog};

const SELECT_FACT: &str = r#"
    SELECT species, common_name, scientific_name, image, size, weight, colors, habitat
    FROM birds
"#;

/// Read-only [`ReferenceCatalog`] over the `birds` table
///
/// Seeding is the only write path and runs at startup, before the catalog
/// is shared with request handlers.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace facts by species key (case-insensitive)
    pub async fn seed_facts(&self, facts: &[ReferenceFact]) -> Result<usize, CatalogError> {
        let mut tx = self.pool.begin().await?;

        for fact in facts {
            if fact.species.trim().is_empty() {
                return Err(CatalogError::Seed(format!(
                    "entry '{}' has an empty species key",
                    fact.common_name
                )));
            }

            sqlx::query(
                r#"
                INSERT INTO birds (species_key, species, common_name, scientific_name, image, size, weight, colors, habitat)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(species_key) DO UPDATE SET
                    species = excluded.species,
                    common_name = excluded.common_name,
                    scientific_name = excluded.scientific_name,
                    image = excluded.image,
                    size = excluded.size,
                    weight = excluded.weight,
                    colors = excluded.colors,
                    habitat = excluded.habitat
                "#,
            )
            .bind(species_key(&fact.species))
            .bind(&fact.species)
            .bind(&fact.common_name)
            .bind(&fact.scientific_name)
            .bind(&fact.image)
            .bind(&fact.size)
            .bind(&fact.weight)
            .bind(&fact.colors)
            .bind(&fact.habitat)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(count = facts.len(), "Catalog seeded");
        Ok(facts.len())
    }

    /// Load a JSON array of reference documents and upsert them
    pub async fn seed_from_file(&self, path: &Path) -> Result<usize, CatalogError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))?;
        let facts: Vec<ReferenceFact> = serde_json::from_str(&text)
            .map_err(|e| CatalogError::Seed(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), entries = facts.len(), "Read catalog seed file");
        self.seed_facts(&facts).await
    }
}

#[async_trait]
impl ReferenceCatalog for SqliteCatalog {
    async fn lookup(&self, species: &str) -> Result<ReferenceFact, CatalogError> {
        let query = format!("{} WHERE species_key = ?", SELECT_FACT);
        let fact = sqlx::query_as::<_, ReferenceFact>(&query)
            .bind(species_key(species))
            .fetch_optional(&self.pool)
            .await?;

        fact.ok_or_else(|| CatalogError::SpeciesNotFound(species.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<ReferenceFact>, CatalogError> {
        let query = format!("{} ORDER BY species_key", SELECT_FACT);
        let facts = sqlx::query_as::<_, ReferenceFact>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(facts)
    }
}
