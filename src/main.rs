//! Gallery - art gallery backend

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArtworkRepository, SqlxCommentRepository, SqlxRevokedSessionRepository,
            SqlxUserRepository,
        },
    },
    services::{ArtworkService, CommentService, SessionSigner, UploadStore, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting gallery backend...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let artwork_repo = SqlxArtworkRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let revoked_repo = SqlxRevokedSessionRepository::boxed(pool);

    let artwork_service = Arc::new(ArtworkService::new(artwork_repo.clone(), comment_repo.clone()));

    // Seed data
    if let Some(file) = &config.seed.artworks_file {
        if let Err(e) = db::seed::seed_artworks(&artwork_service, file).await {
            tracing::warn!("Failed to seed artworks: {:#}", e);
        }
    }
    if let Some(admin) = &config.seed.admin {
        db::seed::ensure_admin(user_repo.as_ref(), admin).await?;
    }

    // Upload directory doubles as the static image root
    tokio::fs::create_dir_all(&config.upload.path)
        .await
        .with_context(|| format!("Failed to create upload directory: {:?}", config.upload.path))?;

    // Initialize services
    let signer = SessionSigner::new(&config.auth.signing_secret(), config.auth.session_ttl())?;
    let uploads = Arc::new(UploadStore::new(config.upload.clone()));
    let user_service = Arc::new(UserService::new(
        user_repo,
        revoked_repo,
        signer,
        uploads,
    ));
    let comment_service = Arc::new(CommentService::new(comment_repo, artwork_repo));

    // Purge expired revocation entries periodically
    {
        let service = user_service.clone();
        let every = Duration::from_secs(config.auth.revocation_cleanup_minutes.max(1) * 60);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match service.cleanup_revoked_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Purged {} expired session revocation(s)", n),
                    Err(e) => tracing::warn!("Failed to purge session revocations: {}", e),
                }
            }
        });
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        user_service,
        artwork_service,
        comment_service,
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
