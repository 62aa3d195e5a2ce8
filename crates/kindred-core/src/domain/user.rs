use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::OneTimeToken;

/// User entity - an account holder and the author of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub alias: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub posts_count: i32,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user with generated ID and timestamps.
    pub fn new(name: String, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: normalize_email(email),
            password_hash,
            is_verified: false,
            alias: None,
            bio: None,
            website: None,
            avatar_url: None,
            posts_count: 0,
            verification_token: None,
            verification_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace any pending verification token with `token`.
    pub fn issue_verification_token(&mut self, token: &OneTimeToken) {
        self.verification_token = Some(token.value.clone());
        self.verification_token_expires_at = Some(token.expires_at);
        self.touch();
    }

    pub fn verification_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.verification_token_expires_at
            .is_none_or(|expires_at| expires_at <= now)
    }

    /// Flip the one-way `Unverified -> Verified` transition.
    ///
    /// The spent token value stays on the row so a repeated link click can be
    /// answered with "already verified"; without an expiry it is inert.
    pub fn mark_verified(&mut self) {
        self.is_verified = true;
        self.verification_token_expires_at = None;
        self.touch();
    }

    /// Replace any pending reset token with `token`.
    pub fn issue_reset_token(&mut self, token: &OneTimeToken) {
        self.reset_token = Some(token.value.clone());
        self.reset_token_expires_at = Some(token.expires_at);
        self.touch();
    }

    pub fn reset_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_token_expires_at
            .is_none_or(|expires_at| expires_at <= now)
    }

    /// Swap in a new password hash and consume the reset token.
    pub fn replace_password(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.reset_token = None;
        self.reset_token_expires_at = None;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Canonical form of an email address: trimmed and case-folded.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Mask an email for logging to avoid PII in logs.
pub fn masked_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let mut chars = local.chars();
            match (chars.next(), chars.next()) {
                (Some(first), Some(_)) => format!("{first}***{domain}"),
                _ => format!("***{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn user() -> User {
        User::new("Alice".into(), "  Alice@Example.COM ", "hash".into())
    }

    #[test]
    fn new_user_is_unverified_with_normalized_email() {
        let user = user();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_verified);
        assert_eq!(user.posts_count, 0);
    }

    #[test]
    fn verification_keeps_token_but_drops_expiry() {
        let mut user = user();
        let token = OneTimeToken::generate(TimeDelta::hours(24));
        user.issue_verification_token(&token);
        assert!(!user.verification_token_expired(Utc::now()));

        user.mark_verified();

        assert!(user.is_verified);
        assert_eq!(user.verification_token.as_deref(), Some(token.value.as_str()));
        assert!(user.verification_token_expired(Utc::now()));
    }

    #[test]
    fn expired_reset_token_is_detected() {
        let mut user = user();
        user.issue_reset_token(&OneTimeToken::generate(TimeDelta::hours(1)));
        assert!(!user.reset_token_expired(Utc::now()));
        assert!(user.reset_token_expired(Utc::now() + TimeDelta::hours(2)));
    }

    #[test]
    fn replacing_password_consumes_reset_token() {
        let mut user = user();
        user.issue_reset_token(&OneTimeToken::generate(TimeDelta::hours(1)));

        user.replace_password("new-hash".into());

        assert_eq!(user.password_hash, "new-hash");
        assert!(user.reset_token.is_none());
        assert!(user.reset_token_expires_at.is_none());
    }

    #[test]
    fn masks_local_part() {
        assert_eq!(masked_email("alice@example.com"), "a***@example.com");
        assert_eq!(masked_email("a@example.com"), "***@example.com");
        assert_eq!(masked_email("nope"), "***");
    }
}
