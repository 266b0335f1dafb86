//! Artwork service
//!
//! Listing, detail pages (artwork plus its comments), seeding and admin
//! deletion.

use crate::db::repositories::{ArtworkRepository, CommentRepository};
use crate::models::{Artwork, CommentWithAuthor, NewArtwork};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Error types for artwork service operations
#[derive(Debug, thiserror::Error)]
pub enum ArtworkServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// An artwork with its comments.
///
/// `comments` is left out of the JSON entirely when there are none.
#[derive(Debug, Clone, Serialize)]
pub struct ArtworkDetail {
    pub artwork: Artwork,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CommentWithAuthor>,
}

pub struct ArtworkService {
    artwork_repo: Arc<dyn ArtworkRepository>,
    comment_repo: Arc<dyn CommentRepository>,
}

impl ArtworkService {
    pub fn new(
        artwork_repo: Arc<dyn ArtworkRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            artwork_repo,
            comment_repo,
        }
    }

    pub async fn list(&self) -> Result<Vec<Artwork>, ArtworkServiceError> {
        let artworks = self
            .artwork_repo
            .list()
            .await
            .context("Failed to list artworks")?;
        Ok(artworks)
    }

    pub async fn get(&self, id: &str) -> Result<Artwork, ArtworkServiceError> {
        self.artwork_repo
            .get_by_id(id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ArtworkServiceError::NotFound("Artwork not found".to_string()))
    }

    /// Artwork with its comments and their authors
    pub async fn detail(&self, id: &str) -> Result<ArtworkDetail, ArtworkServiceError> {
        let artwork = self.get(id).await?;
        let comments = self
            .comment_repo
            .list_by_artwork(id)
            .await
            .context("Failed to list comments")?;

        Ok(ArtworkDetail { artwork, comments })
    }

    pub async fn create(&self, input: NewArtwork) -> Result<Artwork, ArtworkServiceError> {
        if input.title.trim().is_empty() || input.artist.trim().is_empty() {
            return Err(ArtworkServiceError::ValidationError(
                "Title and artist are required".to_string(),
            ));
        }

        let artwork = self
            .artwork_repo
            .create(&input.into_artwork())
            .await
            .context("Failed to create artwork")?;
        Ok(artwork)
    }

    /// Delete an artwork; its comments go with it.
    pub async fn delete(&self, id: &str) -> Result<(), ArtworkServiceError> {
        let deleted = self
            .artwork_repo
            .delete(id)
            .await
            .context("Failed to delete artwork")?;

        if !deleted {
            return Err(ArtworkServiceError::NotFound("Artwork not found".to_string()));
        }

        tracing::info!("Artwork {} deleted", id);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ArtworkServiceError> {
        let count = self
            .artwork_repo
            .count()
            .await
            .context("Failed to count artworks")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArtworkRepository, SqlxCommentRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> ArtworkService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        ArtworkService::new(
            SqlxArtworkRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool),
        )
    }

    fn new_artwork(id: &str) -> NewArtwork {
        NewArtwork {
            id: Some(id.to_string()),
            title: "The Little Mermaid".to_string(),
            artist: "Elisabeth Jerichau Baumann".to_string(),
            image: "/img/mermaid.jpg".to_string(),
            technique: "Oil".to_string(),
            production_date: "1873".to_string(),
        }
    }

    #[tokio::test]
    async fn test_detail_without_comments_omits_key() {
        let service = setup().await;
        service.create(new_artwork("KMS3")).await.unwrap();

        let detail = service.detail("KMS3").await.unwrap();
        assert!(detail.comments.is_empty());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["artwork"]["id"], "KMS3");
        assert!(json.get("comments").is_none());
    }

    #[tokio::test]
    async fn test_detail_and_delete_missing() {
        let service = setup().await;
        assert!(matches!(
            service.detail("nope").await,
            Err(ArtworkServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete("nope").await,
            Err(ArtworkServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_validation_and_delete() {
        let service = setup().await;

        let mut untitled = new_artwork("X");
        untitled.title = " ".to_string();
        assert!(matches!(
            service.create(untitled).await,
            Err(ArtworkServiceError::ValidationError(_))
        ));

        service.create(new_artwork("KMS4")).await.unwrap();
        assert_eq!(service.list().await.unwrap().len(), 1);

        service.delete("KMS4").await.unwrap();
        assert_eq!(service.count().await.unwrap(), 0);
    }
}
