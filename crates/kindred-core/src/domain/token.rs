use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

/// Random single-use token (email verification, password reset).
#[derive(Debug, Clone)]
pub struct OneTimeToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeToken {
    /// Entropy in bytes; the value is hex-encoded, so twice as many characters.
    pub const BYTES: usize = 32;

    /// Generate a fresh token valid for `ttl` from now.
    pub fn generate(ttl: TimeDelta) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self {
            value: hex::encode(bytes),
            expires_at: Utc::now() + ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_hex_and_unique() {
        let a = OneTimeToken::generate(TimeDelta::hours(1));
        let b = OneTimeToken::generate(TimeDelta::hours(1));

        assert_eq!(a.value.len(), OneTimeToken::BYTES * 2);
        assert!(a.value.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn expiry_follows_ttl() {
        let token = OneTimeToken::generate(TimeDelta::hours(24));
        let remaining = token.expires_at - Utc::now();

        assert!(remaining > TimeDelta::hours(23));
        assert!(remaining <= TimeDelta::hours(24));
    }
}
