//! Comment repository
//!
//! Database operations for artwork comments. Listing joins each comment with
//! its author.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Comment, CommentAuthor, CommentWithAuthor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment. Fails if the user or artwork does not exist.
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Comments on an artwork with their authors, oldest first
    async fn list_by_artwork(&self, artwork_id: &str) -> Result<Vec<CommentWithAuthor>>;

    /// Count comments on an artwork
    async fn count_by_artwork(&self, artwork_id: &str) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.backend() {
            Backend::Sqlite(p) => create_comment_sqlite(p, comment).await,
            Backend::Mysql(p) => create_comment_mysql(p, comment).await,
        }
    }

    async fn list_by_artwork(&self, artwork_id: &str) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.backend() {
            Backend::Sqlite(p) => list_by_artwork_sqlite(p, artwork_id).await,
            Backend::Mysql(p) => list_by_artwork_mysql(p, artwork_id).await,
        }
    }

    async fn count_by_artwork(&self, artwork_id: &str) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM comments WHERE artwork_id = ?";
        let count = match self.pool.backend() {
            Backend::Sqlite(p) => sqlx::query(sql)
                .bind(artwork_id)
                .fetch_one(p)
                .await
                .map(|r| r.get::<i64, _>("count")),
            Backend::Mysql(p) => sqlx::query(sql)
                .bind(artwork_id)
                .fetch_one(p)
                .await
                .map(|r| r.get::<i64, _>("count")),
        }
        .context("Failed to count comments")?;

        Ok(count)
    }
}

const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (id, content, user_id, artwork_id, created_at)
    VALUES (?, ?, ?, ?, ?)
"#;

const LIST_WITH_AUTHOR: &str = r#"
    SELECT c.id, c.content, c.user_id, c.artwork_id, c.created_at,
           u.username, u.profile_picture
    FROM comments c
    INNER JOIN users u ON c.user_id = u.id
    WHERE c.artwork_id = ?
    ORDER BY c.created_at ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    sqlx::query(INSERT_COMMENT)
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.user_id)
        .bind(&comment.artwork_id)
        .bind(comment.created_at)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(comment.clone())
}

async fn list_by_artwork_sqlite(
    pool: &SqlitePool,
    artwork_id: &str,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_WITH_AUTHOR)
        .bind(artwork_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                content: row.get("content"),
                user_id: row.get("user_id"),
                artwork_id: row.get("artwork_id"),
                created_at: row.get("created_at"),
            },
            user: CommentAuthor {
                id: row.get("user_id"),
                username: row.get("username"),
                profile_picture: row.get("profile_picture"),
            },
        })
        .collect())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    sqlx::query(INSERT_COMMENT)
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.user_id)
        .bind(&comment.artwork_id)
        .bind(comment.created_at)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(comment.clone())
}

async fn list_by_artwork_mysql(
    pool: &MySqlPool,
    artwork_id: &str,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_WITH_AUTHOR)
        .bind(artwork_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: Comment {
                id: row.get("id"),
                content: row.get("content"),
                user_id: row.get("user_id"),
                artwork_id: row.get("artwork_id"),
                created_at: row.get("created_at"),
            },
            user: CommentAuthor {
                id: row.get("user_id"),
                username: row.get("username"),
                profile_picture: row.get("profile_picture"),
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ArtworkRepository, SqlxArtworkRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NewArtwork, User, UserRole};

    struct Fixture {
        users: Arc<dyn UserRepository>,
        artworks: Arc<dyn ArtworkRepository>,
        comments: Arc<dyn CommentRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        Fixture {
            users: SqlxUserRepository::boxed(pool.clone()),
            artworks: SqlxArtworkRepository::boxed(pool.clone()),
            comments: SqlxCommentRepository::boxed(pool),
        }
    }

    async fn seed(fx: &Fixture) -> (User, String) {
        let user = fx
            .users
            .create(&User::new("carla".into(), "carla@x.dk".into(), "h".into(), UserRole::User))
            .await
            .unwrap();
        let artwork = NewArtwork {
            id: Some("KMS7".into()),
            title: "Harbour".into(),
            artist: "Eckersberg".into(),
            image: "/img/kms7.jpg".into(),
            technique: String::new(),
            production_date: String::new(),
        }
        .into_artwork();
        fx.artworks.create(&artwork).await.unwrap();
        (user, artwork.id)
    }

    #[tokio::test]
    async fn test_create_and_list_with_author() {
        let fx = setup().await;
        let (user, artwork_id) = seed(&fx).await;

        fx.comments
            .create(&Comment::new("First".into(), user.id.clone(), artwork_id.clone()))
            .await
            .unwrap();

        let listed = fx.comments.list_by_artwork(&artwork_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].comment.content, "First");
        assert_eq!(listed[0].user.username, "carla");
        assert_eq!(listed[0].user.id, user.id);
        assert_eq!(fx.comments.count_by_artwork(&artwork_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_artwork_rejected() {
        let fx = setup().await;
        let (user, _) = seed(&fx).await;

        let result = fx
            .comments
            .create(&Comment::new("x".into(), user.id, "missing".into()))
            .await;
        assert!(result.is_err());
        assert_eq!(fx.comments.count_by_artwork("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let fx = setup().await;
        let (user, artwork_id) = seed(&fx).await;
        fx.comments
            .create(&Comment::new("bye".into(), user.id.clone(), artwork_id.clone()))
            .await
            .unwrap();

        fx.users.delete(&user.id).await.unwrap();
        assert!(fx.comments.list_by_artwork(&artwork_id).await.unwrap().is_empty());
    }
}
