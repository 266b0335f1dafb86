//! Revoked session repository
//!
//! Session tokens are stateless; logging out records the token's session id
//! here so a replayed cookie is rejected until it would have expired anyway.

use crate::db::{Backend, DynDatabasePool};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Revoked session repository trait
#[async_trait]
pub trait RevokedSessionRepository: Send + Sync {
    /// Record a session id as revoked. Revoking twice is not an error.
    async fn revoke(&self, session_id: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Check whether a session id has been revoked
    async fn is_revoked(&self, session_id: &str) -> Result<bool>;

    /// Drop rows whose token has expired, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based revoked session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxRevokedSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxRevokedSessionRepository {
    /// Create a new SQLx revoked session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RevokedSessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RevokedSessionRepository for SqlxRevokedSessionRepository {
    async fn revoke(&self, session_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(p) => revoke_sqlite(p, session_id, expires_at).await,
            Backend::Mysql(p) => revoke_mysql(p, session_id, expires_at).await,
        }
    }

    async fn is_revoked(&self, session_id: &str) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(p) => is_revoked_sqlite(p, session_id).await,
            Backend::Mysql(p) => is_revoked_mysql(p, session_id).await,
        }
    }

    async fn delete_expired(&self) -> Result<u64> {
        match self.pool.backend() {
            Backend::Sqlite(p) => delete_expired_sqlite(p).await,
            Backend::Mysql(p) => delete_expired_mysql(p).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn revoke_sqlite(pool: &SqlitePool, session_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO revoked_sessions (session_id, expires_at, revoked_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to revoke session")?;

    Ok(())
}

async fn is_revoked_sqlite(pool: &SqlitePool, session_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM revoked_sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await
        .context("Failed to check session revocation")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn delete_expired_sqlite(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM revoked_sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired revocations")?;

    Ok(result.rows_affected())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn revoke_mysql(pool: &MySqlPool, session_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO revoked_sessions (session_id, expires_at, revoked_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(session_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("Failed to revoke session")?;

    Ok(())
}

async fn is_revoked_mysql(pool: &MySqlPool, session_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM revoked_sessions WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await
        .context("Failed to check session revocation")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn delete_expired_mysql(pool: &MySqlPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM revoked_sessions WHERE expires_at < ?")
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to delete expired revocations")?;

    Ok(result.rows_affected())
}
