//! Artwork repository
//!
//! Database operations for artworks.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Artwork;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Artwork repository trait
#[async_trait]
pub trait ArtworkRepository: Send + Sync {
    /// Insert a new artwork
    async fn create(&self, artwork: &Artwork) -> Result<Artwork>;

    /// Get artwork by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Artwork>>;

    /// List all artworks in insertion order
    async fn list(&self) -> Result<Vec<Artwork>>;

    /// Delete an artwork (its comments cascade), returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Count artworks
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based artwork repository implementation
pub struct SqlxArtworkRepository {
    pool: DynDatabasePool,
}

impl SqlxArtworkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArtworkRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArtworkRepository for SqlxArtworkRepository {
    async fn create(&self, artwork: &Artwork) -> Result<Artwork> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_artwork_sqlite(p, artwork).await,
            Backend::Mysql(p) => create_artwork_mysql(p, artwork).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Artwork>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => get_artwork_sqlite(p, id).await,
            Backend::Mysql(p) => get_artwork_mysql(p, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Artwork>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_artworks_sqlite(p).await,
            Backend::Mysql(p) => list_artworks_mysql(p).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let affected = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query("DELETE FROM artworks WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(p) => sqlx::query("DELETE FROM artworks WHERE id = ?")
                .bind(id)
                .execute(p)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete artwork")?;

        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM artworks";
        let count = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql).fetch_one(p).await.map(|r| r.get::<i64, _>("count")),
            Backend::Mysql(p) => sqlx::query(sql).fetch_one(p).await.map(|r| r.get::<i64, _>("count")),
        }
        .context("Failed to count artworks")?;

        Ok(count)
    }
}

const ARTWORK_COLUMNS: &str = "id, title, artist, image, technique, production_date, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_artwork_sqlite(pool: &SqlitePool, artwork: &Artwork) -> Result<Artwork> {
    sqlx::query(
        r#"
        INSERT INTO artworks (id, title, artist, image, technique, production_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&artwork.id)
    .bind(&artwork.title)
    .bind(&artwork.artist)
    .bind(&artwork.image)
    .bind(&artwork.technique)
    .bind(&artwork.production_date)
    .bind(artwork.created_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to create artwork {}", artwork.id))?;

    Ok(artwork.clone())
}

async fn get_artwork_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Artwork>> {
    let row = sqlx::query(&format!("SELECT {} FROM artworks WHERE id = ?", ARTWORK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get artwork by ID")?;

    Ok(row.map(|row| row_to_artwork_sqlite(&row)))
}

async fn list_artworks_sqlite(pool: &SqlitePool) -> Result<Vec<Artwork>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM artworks ORDER BY created_at ASC, id ASC",
        ARTWORK_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list artworks")?;

    Ok(rows.iter().map(row_to_artwork_sqlite).collect())
}

fn row_to_artwork_sqlite(row: &sqlx::sqlite::SqliteRow) -> Artwork {
    Artwork {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist"),
        image: row.get("image"),
        technique: row.get("technique"),
        production_date: row.get("production_date"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_artwork_mysql(pool: &MySqlPool, artwork: &Artwork) -> Result<Artwork> {
    sqlx::query(
        r#"
        INSERT INTO artworks (id, title, artist, image, technique, production_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&artwork.id)
    .bind(&artwork.title)
    .bind(&artwork.artist)
    .bind(&artwork.image)
    .bind(&artwork.technique)
    .bind(&artwork.production_date)
    .bind(artwork.created_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to create artwork {}", artwork.id))?;

    Ok(artwork.clone())
}

async fn get_artwork_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Artwork>> {
    let row = sqlx::query(&format!("SELECT {} FROM artworks WHERE id = ?", ARTWORK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get artwork by ID")?;

    Ok(row.map(|row| row_to_artwork_mysql(&row)))
}

async fn list_artworks_mysql(pool: &MySqlPool) -> Result<Vec<Artwork>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM artworks ORDER BY created_at ASC, id ASC",
        ARTWORK_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list artworks")?;

    Ok(rows.iter().map(row_to_artwork_mysql).collect())
}

fn row_to_artwork_mysql(row: &sqlx::mysql::MySqlRow) -> Artwork {
    Artwork {
        id: row.get("id"),
        title: row.get("title"),
        artist: row.get("artist"),
        image: row.get("image"),
        technique: row.get("technique"),
        production_date: row.get("production_date"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::NewArtwork;

    async fn setup() -> Arc<dyn ArtworkRepository> {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxArtworkRepository::boxed(pool)
    }

    fn artwork(id: &str, title: &str) -> Artwork {
        NewArtwork {
            id: Some(id.to_string()),
            title: title.to_string(),
            artist: "Hammershøi".to_string(),
            image: format!("https://images.example.org/{}.jpg", id),
            technique: "Oil on canvas".to_string(),
            production_date: "1901".to_string(),
        }
        .into_artwork()
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let repo = setup().await;
        repo.create(&artwork("KMS1", "Interior")).await.unwrap();
        repo.create(&artwork("KMS2", "Sunbeams")).await.unwrap();

        let got = repo.get_by_id("KMS1").await.unwrap().unwrap();
        assert_eq!(got.title, "Interior");
        assert_eq!(got.artist, "Hammershøi");
        assert_eq!(got.production_date, "1901");

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = setup().await;
        repo.create(&artwork("KMS1", "A")).await.unwrap();
        assert!(repo.create(&artwork("KMS1", "B")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        repo.create(&artwork("KMS1", "A")).await.unwrap();

        assert!(repo.delete("KMS1").await.unwrap());
        assert!(!repo.delete("KMS1").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
