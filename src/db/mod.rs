//! Database layer
//!
//! Database abstraction for the gallery backend. Supports:
//! - SQLite (default, single file next to the binary)
//! - MySQL
//!
//! The driver is selected by configuration. Repositories talk to the
//! `DatabasePool` trait and pick driver-specific queries through
//! [`Backend`].
//!
//! # Usage
//!
//! ```ignore
//! use gallery::config::DatabaseConfig;
//! use gallery::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod seed;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};
