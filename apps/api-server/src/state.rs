//! Application state - shared across all handlers.

use std::sync::Arc;

use kindred_core::ports::{
    CommentRepository, Mailer, ObjectStorage, PasswordService, PostRepository, TokenService,
    UserRepository,
};
use kindred_core::services::{AuthService, AuthSettings, PostService, ProfileService};
use kindred_infra::{
    Argon2PasswordService, InMemoryStore, JwtTokenService, LocalObjectStorage, LogMailer,
};

#[cfg(feature = "rate-limit")]
use kindred_core::ports::RateLimiter;
#[cfg(feature = "postgres")]
use kindred_infra::DatabaseConnections;
#[cfg(feature = "object-storage")]
use kindred_infra::HttpObjectStorage;
#[cfg(feature = "rate-limit")]
use kindred_infra::InMemoryRateLimiter;
#[cfg(feature = "smtp")]
use kindred_infra::SmtpMailer;
#[cfg(feature = "postgres")]
use kindred_infra::database::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::{AppConfig, CookieConfig};

/// The adapters behind the core services.
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub passwords: Arc<dyn PasswordService>,
    pub mailer: Arc<dyn Mailer>,
    pub media: Arc<dyn ObjectStorage>,
    pub avatars: Arc<dyn ObjectStorage>,
}

impl Backends {
    /// Pick adapters from configuration, falling back to in-process ones.
    pub async fn from_config(config: &AppConfig, uploads: Arc<LocalObjectStorage>) -> Self {
        let (users, posts, comments) = repositories(config).await;
        let media =
            media_storage(config).unwrap_or_else(|| uploads.clone() as Arc<dyn ObjectStorage>);

        Self {
            users,
            posts,
            comments,
            passwords: Arc::new(Argon2PasswordService::new()),
            mailer: mailer(config),
            media,
            avatars: uploads,
        }
    }
}

type Repositories = (
    Arc<dyn UserRepository>,
    Arc<dyn PostRepository>,
    Arc<dyn CommentRepository>,
);

fn in_memory_repositories() -> Repositories {
    let store = Arc::new(InMemoryStore::new());
    let users: Arc<dyn UserRepository> = store.clone();
    let posts: Arc<dyn PostRepository> = store.clone();
    let comments: Arc<dyn CommentRepository> = store;
    (users, posts, comments)
}

#[cfg(feature = "postgres")]
async fn repositories(config: &AppConfig) -> Repositories {
    let Some(db_config) = &config.database else {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        return in_memory_repositories();
    };

    match DatabaseConnections::init(db_config).await {
        Ok(connections) => {
            let users: Arc<dyn UserRepository> =
                Arc::new(PostgresUserRepository::new(connections.main.clone()));
            let posts: Arc<dyn PostRepository> =
                Arc::new(PostgresPostRepository::new(connections.main.clone()));
            let comments: Arc<dyn CommentRepository> =
                Arc::new(PostgresCommentRepository::new(connections.main));
            (users, posts, comments)
        }
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            in_memory_repositories()
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn repositories(_config: &AppConfig) -> Repositories {
    tracing::info!("Running without postgres feature - using in-memory repositories");
    in_memory_repositories()
}

#[cfg(feature = "smtp")]
fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
    match config.smtp.clone().map(SmtpMailer::new) {
        Some(Ok(mailer)) => Arc::new(mailer),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Invalid SMTP configuration. Mail will only be logged.");
            Arc::new(LogMailer::new())
        }
        None => {
            tracing::warn!("SMTP_HOST not set. Mail will only be logged.");
            Arc::new(LogMailer::new())
        }
    }
}

#[cfg(not(feature = "smtp"))]
fn mailer(_config: &AppConfig) -> Arc<dyn Mailer> {
    Arc::new(LogMailer::new())
}

#[cfg(feature = "object-storage")]
fn media_storage(config: &AppConfig) -> Option<Arc<dyn ObjectStorage>> {
    match HttpObjectStorage::new(config.storage.clone()?) {
        Ok(storage) => Some(Arc::new(storage) as Arc<dyn ObjectStorage>),
        Err(e) => {
            tracing::error!(error = %e, "Object storage unavailable. Post media will be stored locally.");
            None
        }
    }
}

#[cfg(not(feature = "object-storage"))]
fn media_storage(_config: &AppConfig) -> Option<Arc<dyn ObjectStorage>> {
    None
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostService>,
    pub profiles: Arc<ProfileService>,
    pub tokens: Arc<dyn TokenService>,
    /// Serves files written by the local store under `/uploads`.
    pub uploads: Arc<LocalObjectStorage>,
    pub cookie: CookieConfig,
    #[cfg(feature = "rate-limit")]
    pub auth_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let uploads = Arc::new(LocalObjectStorage::new(config.uploads.clone()));
        let backends = Backends::from_config(config, uploads.clone()).await;
        Self::assemble(config, backends, uploads)
    }

    /// Wire the core services over a chosen set of adapters.
    pub fn assemble(
        config: &AppConfig,
        backends: Backends,
        uploads: Arc<LocalObjectStorage>,
    ) -> Self {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        let auth = AuthService::new(
            backends.users.clone(),
            backends.passwords,
            tokens.clone(),
            backends.mailer,
            AuthSettings::default(),
        );
        let posts = PostService::new(backends.posts, backends.comments, backends.media);
        let profiles = ProfileService::new(backends.users, backends.avatars);

        tracing::info!("Application state initialized");

        Self {
            auth: Arc::new(auth),
            posts: Arc::new(posts),
            profiles: Arc::new(profiles),
            tokens,
            uploads,
            cookie: config.cookie.clone(),
            #[cfg(feature = "rate-limit")]
            auth_limiter: Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())),
        }
    }
}
