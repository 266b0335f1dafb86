//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a single entity.

pub mod artwork;
pub mod comment;
pub mod session;
pub mod user;

pub use artwork::{ArtworkRepository, SqlxArtworkRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use session::{RevokedSessionRepository, SqlxRevokedSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
