use async_trait::async_trait;

/// Transactional mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the link that completes email verification.
    async fn send_verification_email(&self, to: &str, name: &str, token: &str)
    -> Result<(), MailError>;

    /// Send the link that lets a user choose a new password.
    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Delivery failed: {0}")]
    Transport(String),
}
