//! Data models
//!
//! Database entities (User, Artwork, Comment), session token claims, and the
//! joined views returned by the API.

mod artwork;
mod comment;
mod session;
mod user;

pub use artwork::{Artwork, NewArtwork};
pub use comment::{Comment, CommentAuthor, CommentWithAuthor, CreatedComment};
pub use session::SessionClaims;
pub use user::{User, UserRole};
