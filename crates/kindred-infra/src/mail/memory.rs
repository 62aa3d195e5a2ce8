//! Mailers that never leave the process.

use async_trait::async_trait;
use tokio::sync::Mutex;

use kindred_core::domain::masked_email;
use kindred_core::ports::{MailError, Mailer};

/// Logs instead of sending. Used when no SMTP host is configured.
#[derive(Debug, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        tracing::info!(
            to = %masked_email(to),
            token,
            "SMTP not configured; verification mail not sent"
        );
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        tracing::info!(
            to = %masked_email(to),
            token,
            "SMTP not configured; password reset mail not sent"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Verification,
    PasswordReset,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub to: String,
    pub name: String,
    pub token: String,
}

/// Keeps every mail it is asked to send. Test double.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails with a transport error.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    /// Token of the most recent mail of `kind` sent to `to`.
    pub async fn last_token_for(&self, to: &str, kind: MailKind) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.kind == kind && m.to == to)
            .map(|m| m.token.clone())
    }

    async fn record(
        &self,
        kind: MailKind,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }

        self.sent.lock().await.push(SentMail {
            kind,
            to: to.to_string(),
            name: name.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        self.record(MailKind::Verification, to, name, token).await
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        self.record(MailKind::PasswordReset, to, name, token).await
    }
}
