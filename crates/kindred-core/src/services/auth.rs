//! Account lifecycle: registration, verification, login and password reset.

use std::sync::{Arc, OnceLock};

use chrono::{TimeDelta, Utc};
use tracing::{debug, error, info, warn};
use validator::ValidateEmail;

use crate::domain::{Actor, OneTimeToken, User, masked_email, normalize_email};
use crate::error::{DomainError, RepoError};
use crate::ports::{Mailer, PasswordService, TokenService, UserRepository};

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

pub const REGISTER_MESSAGE: &str =
    "Registration successful. Please check your email to verify your account.";
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";
pub const RESEND_VERIFICATION_MESSAGE: &str =
    "If an unverified account with that email exists, a new verification link has been sent.";
pub const RESET_PASSWORD_MESSAGE: &str = "Password has been reset. You can now log in.";

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_VERIFICATION_TOKEN: &str = "Invalid or expired verification token";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";
const DUMMY_PASSWORD: &str = "kindred-unknown-account";

/// Lifetimes of the one-time tokens.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub verification_ttl: TimeDelta,
    pub reset_ttl: TimeDelta,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            verification_ttl: TimeDelta::hours(24),
            reset_ttl: TimeDelta::hours(1),
        }
    }
}

/// Result of presenting a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

impl VerifyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            VerifyOutcome::Verified => "Email verified successfully. You can now log in.",
            VerifyOutcome::AlreadyVerified => "Email is already verified.",
        }
    }
}

/// A freshly issued login session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    mailer: Arc<dyn Mailer>,
    settings: AuthSettings,
    /// Verified against on unknown emails so login cost does not reveal accounts.
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        mailer: Arc<dyn Mailer>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            mailer,
            settings,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Create an unverified account and send its verification link.
    ///
    /// A failed send is logged rather than returned: the account already
    /// exists, and [`AuthService::resend_verification`] issues a new link.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(DomainError::validation("Invalid email address"));
        }
        validate_password(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate("Email already registered".to_string()));
        }

        let password_hash = self.passwords.hash(password)?;
        let mut user = User::new(name.to_string(), &email, password_hash);
        let token = OneTimeToken::generate(self.settings.verification_ttl);
        user.issue_verification_token(&token);

        let user = self.users.insert(user).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                DomainError::Duplicate("Email already registered".to_string())
            }
            other => other.into(),
        })?;
        info!(user_id = %user.id, "User registered");

        if let Err(e) = self
            .mailer
            .send_verification_email(&user.email, &user.name, &token.value)
            .await
        {
            warn!(user_id = %user.id, error = %e, "Verification email could not be sent");
        }

        Ok(user)
    }

    pub async fn verify_email(&self, token: &str) -> Result<VerifyOutcome, DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::unauthorized(INVALID_VERIFICATION_TOKEN));
        }

        let mut user = self
            .users
            .find_by_verification_token(token)
            .await?
            .ok_or_else(|| DomainError::unauthorized(INVALID_VERIFICATION_TOKEN))?;

        if user.is_verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        if user.verification_token_expired(Utc::now()) {
            debug!(user_id = %user.id, "Verification token expired");
            return Err(DomainError::unauthorized(INVALID_VERIFICATION_TOKEN));
        }

        user.mark_verified();
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "Email verified");

        Ok(VerifyOutcome::Verified)
    }

    /// Issue a new verification link for an unverified account.
    ///
    /// Answers the same message whether or not the account exists.
    pub async fn resend_verification(&self, email: &str) -> Result<&'static str, DomainError> {
        let email = normalize_email(email);

        match self.users.find_by_email(&email).await? {
            Some(mut user) if !user.is_verified => {
                let token = OneTimeToken::generate(self.settings.verification_ttl);
                user.issue_verification_token(&token);
                let user = self.users.update(user).await?;

                if let Err(e) = self
                    .mailer
                    .send_verification_email(&user.email, &user.name, &token.value)
                    .await
                {
                    error!(user_id = %user.id, error = %e, "Verification email could not be sent");
                }
            }
            Some(user) => debug!(user_id = %user.id, "Resend requested for verified account"),
            None => debug!(email = %masked_email(&email), "Resend requested for unknown email"),
        }

        Ok(RESEND_VERIFICATION_MESSAGE)
    }

    /// Exchange credentials for a session token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            let dummy = self.dummy_hash()?;
            let _ = self.passwords.verify(password, dummy);
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_verified {
            return Err(DomainError::unauthorized(
                "Please verify your email before logging in",
            ));
        }

        let token = self
            .tokens
            .generate_token(user.id, &user.email)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        info!(user_id = %user.id, "User logged in");

        Ok(Session {
            token,
            expires_in: self.tokens.expiration_seconds(),
            user,
        })
    }

    /// Email a reset link to a verified account.
    ///
    /// Always answers the same message so callers cannot tell which emails exist.
    pub async fn forgot_password(&self, email: &str) -> Result<&'static str, DomainError> {
        let email = normalize_email(email);

        match self.users.find_by_email(&email).await? {
            Some(mut user) if user.is_verified => {
                let token = OneTimeToken::generate(self.settings.reset_ttl);
                user.issue_reset_token(&token);
                let user = self.users.update(user).await?;

                if let Err(e) = self
                    .mailer
                    .send_password_reset_email(&user.email, &user.name, &token.value)
                    .await
                {
                    error!(user_id = %user.id, error = %e, "Password reset email could not be sent");
                } else {
                    info!(user_id = %user.id, "Password reset link sent");
                }
            }
            Some(user) => debug!(user_id = %user.id, "Reset requested for unverified account"),
            None => debug!(email = %masked_email(&email), "Reset requested for unknown email"),
        }

        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        validate_password(new_password)?;

        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::unauthorized(INVALID_RESET_TOKEN));
        }

        let mut user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| DomainError::unauthorized(INVALID_RESET_TOKEN))?;

        if user.reset_token_expired(Utc::now()) {
            debug!(user_id = %user.id, "Reset token expired");
            return Err(DomainError::unauthorized(INVALID_RESET_TOKEN));
        }

        let password_hash = self.passwords.hash(new_password)?;
        user.replace_password(password_hash);
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "Password reset");

        Ok(())
    }

    /// The account behind an authenticated session.
    pub async fn current_user(&self, actor: &Actor) -> Result<User, DomainError> {
        self.users
            .find_by_id(actor.user_id)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Account no longer exists"))
    }

    fn dummy_hash(&self) -> Result<&str, DomainError> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash);
        }
        let hash = self.passwords.hash(DUMMY_PASSWORD)?;
        Ok(self.dummy_hash.get_or_init(|| hash))
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(DomainError::validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
