//! Database migrations module
//!
//! Code-based migrations embedded in the binary as SQL strings, supporting
//! both SQLite and MySQL.
//!
//! # Usage
//!
//! ```ignore
//! use gallery::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::BTreeSet;

use super::pool::Backend;
use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                profile_picture VARCHAR(512),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'user',
                profile_picture VARCHAR(512),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_artworks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS artworks (
                id VARCHAR(128) PRIMARY KEY,
                title VARCHAR(512) NOT NULL,
                artist VARCHAR(255) NOT NULL,
                image VARCHAR(1024) NOT NULL,
                technique VARCHAR(255) NOT NULL DEFAULT '',
                production_date VARCHAR(64) NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS artworks (
                id VARCHAR(128) PRIMARY KEY,
                title VARCHAR(512) NOT NULL,
                artist VARCHAR(255) NOT NULL,
                image VARCHAR(1024) NOT NULL,
                technique VARCHAR(255) NOT NULL DEFAULT '',
                production_date VARCHAR(64) NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 3,
        name: "create_comments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id VARCHAR(36) PRIMARY KEY,
                content TEXT NOT NULL,
                user_id VARCHAR(36) NOT NULL,
                artwork_id VARCHAR(128) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (artwork_id) REFERENCES artworks(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_artwork_id ON comments(artwork_id);
            CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id VARCHAR(36) PRIMARY KEY,
                content TEXT NOT NULL,
                user_id VARCHAR(36) NOT NULL,
                artwork_id VARCHAR(128) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (artwork_id) REFERENCES artworks(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_comments_artwork_id ON comments(artwork_id);
            CREATE INDEX idx_comments_user_id ON comments(user_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_revoked_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS revoked_sessions (
                session_id VARCHAR(36) PRIMARY KEY,
                expires_at TIMESTAMP NOT NULL,
                revoked_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_revoked_sessions_expires_at ON revoked_sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS revoked_sessions (
                session_id VARCHAR(36) PRIMARY KEY,
                expires_at TIMESTAMP NOT NULL,
                revoked_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_revoked_sessions_expires_at ON revoked_sessions(expires_at);
        "#,
    },
];

/// Run all pending migrations, returning how many were applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;

    let mut count = 0;
    for migration in pending(&applied) {
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        let outcome = match pool.backend() {
            Backend::Sqlite(p) => apply_sqlite(p, migration).await,
            Backend::Mysql(p) => apply_mysql(p, migration).await,
        };
        outcome.with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("Schema is current");
    }
    Ok(count)
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

/// Number of known migrations not yet recorded in `_migrations`
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let applied = applied_versions(pool).await?;
    Ok(pending(&applied).count())
}

fn pending(applied: &BTreeSet<i64>) -> impl Iterator<Item = &'static Migration> + '_ {
    MIGRATIONS
        .iter()
        .filter(move |m| !applied.contains(&i64::from(m.version)))
}

/// Versions recorded in `_migrations`, creating the table on first use
async fn applied_versions(pool: &DynDatabasePool) -> Result<BTreeSet<i64>> {
    let ddl = match pool.driver() {
        DatabaseDriver::Sqlite => {
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        }
        DatabaseDriver::Mysql => {
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        }
    };
    pool.execute(ddl).await.context("Failed to create _migrations table")?;

    const SELECT: &str = "SELECT version FROM _migrations";
    let versions: BTreeSet<i64> = match pool.backend() {
        Backend::Sqlite(p) => sqlx::query(SELECT)
            .fetch_all(p)
            .await?
            .iter()
            .map(|row| row.get::<i64, _>("version"))
            .collect(),
        Backend::Mysql(p) => sqlx::query(SELECT)
            .fetch_all(p)
            .await?
            .iter()
            .map(|row| i64::from(row.get::<i32, _>("version")))
            .collect(),
    };
    Ok(versions)
}

/// SQLite runs the whole migration in one transaction
async fn apply_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// MySQL commits each DDL statement implicitly, so no transaction here
async fn apply_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split on `;`, dropping empty and comment-only pieces
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn sqlite(pool: &DynDatabasePool) -> &SqlitePool {
        match pool.backend() {
            Backend::Sqlite(p) => p,
            Backend::Mysql(_) => panic!("test pool must be SQLite"),
        }
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        // Running again should apply 0 migrations
        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unique_user_constraints() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let db = sqlite(&pool);

        let insert = "INSERT INTO users (id, username, email, password_hash) VALUES (?, ?, ?, ?)";
        sqlx::query(insert)
            .bind("u1").bind("alice").bind("alice@example.com").bind("h")
            .execute(db).await.expect("first insert");

        let dup_username = sqlx::query(insert)
            .bind("u2").bind("alice").bind("other@example.com").bind("h")
            .execute(db).await;
        assert!(dup_username.is_err());

        let dup_email = sqlx::query(insert)
            .bind("u3").bind("bob").bind("alice@example.com").bind("h")
            .execute(db).await;
        assert!(dup_email.is_err());
    }

    #[tokio::test]
    async fn test_comment_foreign_keys_and_cascade() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let db = sqlite(&pool);

        // Unknown artwork is rejected
        let orphan = sqlx::query(
            "INSERT INTO comments (id, content, user_id, artwork_id) VALUES ('c0', 'x', 'nobody', 'nothing')",
        )
        .execute(db)
        .await;
        assert!(orphan.is_err());

        sqlx::query("INSERT INTO users (id, username, email, password_hash) VALUES ('u1', 'a', 'a@x.dk', 'h')")
            .execute(db).await.unwrap();
        sqlx::query("INSERT INTO artworks (id, title, artist, image) VALUES ('a1', 't', 'r', 'i')")
            .execute(db).await.unwrap();
        sqlx::query("INSERT INTO comments (id, content, user_id, artwork_id) VALUES ('c1', 'nice', 'u1', 'a1')")
            .execute(db).await.unwrap();

        sqlx::query("DELETE FROM artworks WHERE id = 'a1'").execute(db).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n  -- only a comment\n;\nCREATE INDEX i ON a(id);  ";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE INDEX i ON a(id)"]);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- hello\n   -- world"));
        assert!(!is_comment_only("-- hello\nSELECT 1"));
    }

    #[test]
    fn test_truncate_sql() {
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
        assert_eq!(truncate_sql("short"), "short");
    }
}
