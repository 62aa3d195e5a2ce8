//! # Kindred Infrastructure
//!
//! Concrete implementations of the ports defined in `kindred-core`.
//! This crate contains database, mail, storage and security integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory adapters only
//! - `postgres` - PostgreSQL repositories via SeaORM
//! - `rate-limit` - Rate limiting via governor
//! - `smtp` - SMTP mail delivery via lettre
//! - `object-storage` - HTTP object storage via reqwest

pub mod auth;
pub mod database;
pub mod mail;
pub mod storage;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - always available
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::InMemoryStore;
pub use mail::{LogMailer, MailKind, RecordingMailer, SentMail};
pub use storage::{LocalObjectStorage, LocalStorageConfig, MemoryObjectStorage};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, DatabaseConnections};

#[cfg(feature = "smtp")]
pub use mail::{SmtpConfig, SmtpMailer};

#[cfg(feature = "object-storage")]
pub use storage::{HttpObjectStorage, HttpStorageConfig};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
