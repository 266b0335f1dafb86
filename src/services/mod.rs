//! Services layer - Business logic
//!
//! Services implement the gallery's rules on top of the repositories:
//! - Account signup, login, logout and session resolution
//! - Password hashing and the password policy
//! - Signed session tokens
//! - Artworks, comments and profile picture storage

pub mod artwork;
pub mod comment;
pub mod password;
pub mod session;
pub mod upload;
pub mod user;

pub use artwork::{ArtworkDetail, ArtworkService, ArtworkServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use password::{check_password_policy, hash_password, verify_password};
pub use session::{IssuedSession, SessionError, SessionSigner};
pub use upload::{PendingUpload, UploadError, UploadStore};
pub use user::{
    LoginInput, LoginOutcome, ProfileUpdate, ResolvedSession, SignupInput, UserService,
    UserServiceError,
};
