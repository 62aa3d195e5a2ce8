//! Transactional mail adapters.

mod memory;

#[cfg(feature = "smtp")]
mod smtp;

pub use memory::{LogMailer, MailKind, RecordingMailer, SentMail};

#[cfg(feature = "smtp")]
pub use smtp::{SmtpConfig, SmtpMailer};
