//! Startup data
//!
//! Loads the artwork collection from a JSON file into an empty database and
//! makes sure the configured administrator account exists.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::AdminSeed;
use crate::db::repositories::UserRepository;
use crate::models::{NewArtwork, User, UserRole};
use crate::services::password::hash_password;
use crate::services::{ArtworkService, ArtworkServiceError};

/// Insert the artworks listed in `path` when there are no artworks yet.
///
/// The file holds a JSON array of artwork objects (`id` optional, `title`,
/// `artist`, `image`, `technique`, `production_date`). Entries the service
/// rejects are skipped. Returns how many artworks were inserted.
pub async fn seed_artworks(service: &ArtworkService, path: &Path) -> Result<usize> {
    if service.count().await? > 0 {
        tracing::debug!("Artworks already present, skipping seed");
        return Ok(0);
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read artwork seed file: {}", path.display()))?;
    let artworks: Vec<NewArtwork> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse artwork seed file: {}", path.display()))?;

    let mut inserted = 0;
    for input in artworks {
        match service.create(input).await {
            Ok(_) => inserted += 1,
            Err(ArtworkServiceError::ValidationError(reason)) => {
                tracing::warn!("Skipping artwork in seed file: {}", reason);
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("Seeded {} artwork(s) from {}", inserted, path.display());
    Ok(inserted)
}

/// Create the administrator account unless a user with its email exists.
///
/// Returns `true` when an account was created.
pub async fn ensure_admin(repo: &dyn UserRepository, admin: &AdminSeed) -> Result<bool> {
    if repo.get_by_email(&admin.email).await?.is_some() {
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password).context("Failed to hash admin password")?;
    let user = User::new(
        admin.username.clone(),
        admin.email.clone(),
        password_hash,
        UserRole::Admin,
    );
    repo.create(&user).await.context("Failed to create admin user")?;

    tracing::info!("Created administrator account {}", admin.username);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxArtworkRepository, SqlxCommentRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::verify_password;
    use std::io::Write;

    const SEED: &str = r#"[
        {"id": "KMS1", "title": "Interior", "artist": "Hammershøi", "image": "/img/1.jpg",
         "technique": "Oil on canvas", "production_date": "1901"},
        {"title": "Untitled study", "artist": "Unknown", "image": "/img/2.jpg"},
        {"title": "", "artist": "Nobody", "image": "/img/3.jpg"}
    ]"#;

    fn artwork_service(pool: crate::db::DynDatabasePool) -> ArtworkService {
        ArtworkService::new(
            SqlxArtworkRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool),
        )
    }

    #[tokio::test]
    async fn test_seed_artworks_only_when_empty() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let service = artwork_service(pool);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        assert_eq!(seed_artworks(&service, file.path()).await.unwrap(), 2);
        assert_eq!(seed_artworks(&service, file.path()).await.unwrap(), 0);
        assert_eq!(service.count().await.unwrap(), 2);
        assert_eq!(service.get("KMS1").await.unwrap().artist, "Hammershøi");
    }

    #[tokio::test]
    async fn test_seed_artworks_bad_file() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let service = artwork_service(pool);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(seed_artworks(&service, file.path()).await.is_err());
        assert!(seed_artworks(&service, Path::new("/nonexistent/seed.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxUserRepository::new(pool);

        let admin = AdminSeed {
            username: "curator".to_string(),
            email: "curator@gallery.dk".to_string(),
            password: "Curat0r#Pass".to_string(),
        };

        assert!(ensure_admin(&repo, &admin).await.unwrap());
        assert!(!ensure_admin(&repo, &admin).await.unwrap());

        let stored = repo.get_by_email("curator@gallery.dk").await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Admin);
        assert!(verify_password("Curat0r#Pass", &stored.password_hash).unwrap());
    }
}
