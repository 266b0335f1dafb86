//! User service
//!
//! Business logic for accounts and sessions:
//! - Signup with uniqueness checks and the password policy
//! - Login issuing a signed session token
//! - Logout revoking the token's session id
//! - Resolving a presented token to a user (the session verifier)
//! - Profile edits and admin user management

use crate::db::repositories::{RevokedSessionRepository, UserRepository};
use crate::models::{SessionClaims, User, UserRole};
use crate::services::password::{check_password_policy, hash_password, verify_password};
use crate::services::session::{IssuedSession, SessionError, SessionSigner};
use crate::services::upload::{PendingUpload, UploadError, UploadStore};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex pattern for email")
});

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Login rejected (unknown email or wrong password)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// No valid session for the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username or email already taken
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<UploadError> for UserServiceError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InternalError(e) => UserServiceError::InternalError(e),
            other => UserServiceError::ValidationError(other.to_string()),
        }
    }
}

/// Input for signup
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Input for login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Fields of a profile edit
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Successful login: the user and the session issued for them
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: IssuedSession,
}

/// A verified session bound to its current user record
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: User,
    pub claims: SessionClaims,
}

/// User service for managing accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    revoked_repo: Arc<dyn RevokedSessionRepository>,
    signer: SessionSigner,
    uploads: Arc<UploadStore>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        revoked_repo: Arc<dyn RevokedSessionRepository>,
        signer: SessionSigner,
        uploads: Arc<UploadStore>,
    ) -> Self {
        Self {
            user_repo,
            revoked_repo,
            signer,
            uploads,
        }
    }

    /// Session lifetime, for the cookie `Max-Age`
    pub fn session_ttl(&self) -> chrono::Duration {
        self.signer.ttl()
    }

    /// Register a new account with role `user`.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a missing field, malformed email or weak password
    /// - `UserExists` if the email or username is taken
    pub async fn signup(&self, input: SignupInput) -> Result<User, UserServiceError> {
        let email = input.email.trim().to_string();
        let username = input.username.trim().to_string();

        if email.is_empty() || username.is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email, username and password are required".to_string(),
            ));
        }

        if !EMAIL_PATTERN.is_match(&email) {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists("Email already exists".to_string()));
        }

        if self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(
                "Username already exists".to_string(),
            ));
        }

        check_password_policy(&input.password).map_err(UserServiceError::ValidationError)?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(username, email, password_hash, UserRole::User);

        // A concurrent signup can pass the checks above and still lose the insert
        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(err) if is_unique_violation(&err) => {
                return Err(UserServiceError::UserExists(
                    "Email or username already exists".to_string(),
                ))
            }
            Err(err) => return Err(err.context("Failed to create user").into()),
        };

        tracing::info!("User {} signed up", created.username);
        Ok(created)
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome, UserServiceError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email and password are required".to_string(),
            ));
        }

        let invalid = || UserServiceError::AuthenticationError("Invalid credentials".to_string());

        let user = self
            .user_repo
            .get_by_email(input.email.trim())
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!("Rejected login for {}", user.username);
            return Err(invalid());
        }

        let session = self
            .signer
            .issue(&user.id, user.role)
            .context("Failed to issue session")?;

        tracing::info!("User {} logged in", user.username);
        Ok(LoginOutcome { user, session })
    }

    /// Revoke the session behind `token`, if it is still valid.
    ///
    /// Missing, malformed or expired tokens are ignored so logout always
    /// succeeds from the client's point of view.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), UserServiceError> {
        let Some(token) = token else {
            return Ok(());
        };

        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(()),
        };

        self.revoked_repo
            .revoke(&claims.sid, claims.expires_at())
            .await
            .context("Failed to revoke session")?;

        tracing::info!("Session {} revoked", claims.sid);
        Ok(())
    }

    /// Resolve a presented token to its user.
    ///
    /// Every failure is `Unauthorized`: bad signature or format, expiry,
    /// revocation, a deleted user, or a role that changed since issue.
    pub async fn resolve_session(&self, token: &str) -> Result<ResolvedSession, UserServiceError> {
        let claims = self.signer.verify(token).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            match e {
                SessionError::Expired => UserServiceError::Unauthorized("Session expired".to_string()),
                _ => UserServiceError::Unauthorized("Invalid session".to_string()),
            }
        })?;

        if self
            .revoked_repo
            .is_revoked(&claims.sid)
            .await
            .context("Failed to check session revocation")?
        {
            tracing::debug!("Rejected revoked session {}", claims.sid);
            return Err(UserServiceError::Unauthorized(
                "Session has been revoked".to_string(),
            ));
        }

        let user = self
            .user_repo
            .get_by_id(&claims.uid)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::Unauthorized("User not found".to_string()))?;

        if user.role != claims.role {
            tracing::debug!("Rejected stale session {} for {}", claims.sid, user.username);
            return Err(UserServiceError::Unauthorized("Session is stale".to_string()));
        }

        Ok(ResolvedSession { user, claims })
    }

    /// Change username and password, and optionally the profile picture.
    ///
    /// All checks run before the picture is written, so a rejected edit
    /// leaves both the database and the upload directory untouched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
        picture: Option<PendingUpload>,
    ) -> Result<User, UserServiceError> {
        let username = update.username.trim().to_string();
        if username.is_empty() || update.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound("User not found".to_string()))?;

        if let Some(existing) = self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
        {
            if existing.id != user.id {
                return Err(UserServiceError::ValidationError(
                    "Username already taken".to_string(),
                ));
            }
        }

        if update.password != update.confirm_password {
            return Err(UserServiceError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }

        check_password_policy(&update.password).map_err(UserServiceError::ValidationError)?;

        if let Some(picture) = &picture {
            self.uploads.validate(picture)?;
        }

        let password_hash = hash_password(&update.password).context("Failed to hash password")?;

        if let Some(picture) = &picture {
            user.profile_picture = Some(self.uploads.save(picture).await?);
        }
        user.username = username;
        user.password_hash = password_hash;

        let updated = match self.user_repo.update(&user).await {
            Ok(updated) => updated,
            Err(err) if is_unique_violation(&err) => {
                return Err(UserServiceError::ValidationError(
                    "Username already taken".to_string(),
                ))
            }
            Err(err) => return Err(err.context("Failed to update user").into()),
        };

        tracing::info!("User {} updated their profile", updated.id);
        Ok(updated)
    }

    /// All accounts, for the admin console
    pub async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        let users = self.user_repo.list().await.context("Failed to list users")?;
        Ok(users)
    }

    /// Delete an account; its comments go with it.
    pub async fn delete_user(&self, id: &str) -> Result<(), UserServiceError> {
        let deleted = self
            .user_repo
            .delete(id)
            .await
            .context("Failed to delete user")?;

        if !deleted {
            return Err(UserServiceError::NotFound("User not found".to_string()));
        }

        tracing::info!("User {} deleted", id);
        Ok(())
    }

    /// Purge revocation entries whose tokens have expired anyway
    pub async fn cleanup_revoked_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .revoked_repo
            .delete_expired()
            .await
            .context("Failed to clean up revoked sessions")?;
        Ok(removed)
    }
}

/// Whether a repository error came from a UNIQUE index on insert or update
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}
