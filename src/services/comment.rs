//! Comment service

use crate::db::repositories::{ArtworkRepository, CommentRepository};
use crate::models::{Comment, CommentAuthor, CreatedComment, User};
use anyhow::Context;
use std::sync::Arc;

/// Maximum comment length in characters
pub const MAX_COMMENT_LEN: usize = 2000;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        artwork_repo: Arc<dyn ArtworkRepository>,
    ) -> Self {
        Self {
            comment_repo,
            artwork_repo,
        }
    }

    /// Add a comment by `author` on an existing artwork.
    ///
    /// Nothing is written when the content is empty or the artwork is unknown.
    pub async fn add_comment(
        &self,
        author: &User,
        artwork_id: &str,
        content: &str,
    ) -> Result<CreatedComment, CommentServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CommentServiceError::ValidationError(
                "Comment content is required".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(CommentServiceError::ValidationError(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let artwork = self
            .artwork_repo
            .get_by_id(artwork_id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| CommentServiceError::NotFound("Artwork not found".to_string()))?;

        let comment = self
            .comment_repo
            .create(&Comment::new(
                content.to_string(),
                author.id.clone(),
                artwork.id.clone(),
            ))
            .await
            .context("Failed to create comment")?;

        tracing::info!("User {} commented on artwork {}", author.id, artwork.id);

        Ok(CreatedComment {
            comment,
            user: CommentAuthor::from(author),
            artwork,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArtworkRepository, SqlxCommentRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NewArtwork, UserRole};

    struct Fixture {
        service: CommentService,
        author: User,
        comments: Arc<dyn CommentRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let users = SqlxUserRepository::boxed(pool.clone());
        let author = users
            .create(&User::new("pia".into(), "pia@x.dk".into(), "h".into(), UserRole::User))
            .await
            .unwrap();

        let artworks = SqlxArtworkRepository::boxed(pool.clone());
        artworks
            .create(
                &NewArtwork {
                    id: Some("KMS9".into()),
                    title: "Evening".into(),
                    artist: "Ring".into(),
                    image: "/img/9.jpg".into(),
                    technique: String::new(),
                    production_date: String::new(),
                }
                .into_artwork(),
            )
            .await
            .unwrap();

        let comments = SqlxCommentRepository::boxed(pool);
        Fixture {
            service: CommentService::new(comments.clone(), artworks),
            author,
            comments,
        }
    }

    #[tokio::test]
    async fn test_add_comment_returns_user_and_artwork() {
        let Fixture { service, author, comments } = setup().await;

        let created = service.add_comment(&author, "KMS9", "  Beautiful light ").await.unwrap();
        assert_eq!(created.comment.content, "Beautiful light");
        assert_eq!(created.user.username, "pia");
        assert_eq!(created.artwork.id, "KMS9");

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["userId"], author.id.as_str());
        assert_eq!(json["artwork"]["title"], "Evening");

        let listed = comments.list_by_artwork("KMS9").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user.username, "pia");
    }

    #[tokio::test]
    async fn test_unknown_artwork_creates_nothing() {
        let Fixture { service, author, comments } = setup().await;

        assert!(matches!(
            service.add_comment(&author, "missing", "hello").await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert_eq!(comments.count_by_artwork("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_or_oversized_content_rejected() {
        let Fixture { service, author, comments } = setup().await;

        assert!(matches!(
            service.add_comment(&author, "KMS9", "   ").await,
            Err(CommentServiceError::ValidationError(_))
        ));
        let long = "a".repeat(MAX_COMMENT_LEN + 1);
        assert!(matches!(
            service.add_comment(&author, "KMS9", &long).await,
            Err(CommentServiceError::ValidationError(_))
        ));
        assert_eq!(comments.count_by_artwork("KMS9").await.unwrap(), 0);
    }
}
