use validator::ValidateUrl;

use crate::error::DomainError;

use super::user::User;

const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 160;
const MAX_WEBSITE_LENGTH: usize = 200;

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
}

impl ProfileUpdate {
    /// The alias this update would set, normalized. `Some(None)` clears it.
    pub fn normalized_alias(&self) -> Result<Option<Option<String>>, DomainError> {
        let Some(alias) = &self.alias else {
            return Ok(None);
        };

        let alias = alias.trim().trim_start_matches('@').to_lowercase();
        if alias.is_empty() {
            return Ok(Some(None));
        }

        let valid_len = (3..=30).contains(&alias.chars().count());
        let valid_chars = alias
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
        if !valid_len || !valid_chars {
            return Err(DomainError::validation(
                "Alias must be 3-30 characters of letters, digits, '_' or '.'",
            ));
        }

        Ok(Some(Some(alias)))
    }

    /// Validate and apply the patch to `user`.
    pub fn apply_to(self, user: &mut User) -> Result<(), DomainError> {
        let alias = self.normalized_alias()?;

        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
                return Err(DomainError::validation(format!(
                    "Name must be 1-{MAX_NAME_LENGTH} characters"
                )));
            }
            user.name = name.to_string();
        }

        if let Some(alias) = alias {
            user.alias = alias;
        }

        if let Some(bio) = self.bio {
            let bio = bio.trim();
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(DomainError::validation(format!(
                    "Bio must be at most {MAX_BIO_LENGTH} characters"
                )));
            }
            user.bio = (!bio.is_empty()).then(|| bio.to_string());
        }

        if let Some(website) = self.website {
            let website = website.trim();
            if website.is_empty() {
                user.website = None;
            } else {
                if website.len() > MAX_WEBSITE_LENGTH || !is_http_url(website) {
                    return Err(DomainError::validation("Website must be an http(s) URL"));
                }
                user.website = Some(website.to_string());
            }
        }

        user.touch();
        Ok(())
    }
}

/// An absolute URL with a host, over http or https.
fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && value.validate_url()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("Alice".into(), "a@x.com", "hash".into())
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut user = user();
        user.bio = Some("old bio".into());

        ProfileUpdate {
            name: Some("  Alice B ".into()),
            ..Default::default()
        }
        .apply_to(&mut user)
        .unwrap();

        assert_eq!(user.name, "Alice B");
        assert_eq!(user.bio.as_deref(), Some("old bio"));
    }

    #[test]
    fn alias_is_lowercased_and_clearable() {
        let mut user = user();
        ProfileUpdate {
            alias: Some("@Alice_01".into()),
            ..Default::default()
        }
        .apply_to(&mut user)
        .unwrap();
        assert_eq!(user.alias.as_deref(), Some("alice_01"));

        ProfileUpdate {
            alias: Some("".into()),
            ..Default::default()
        }
        .apply_to(&mut user)
        .unwrap();
        assert!(user.alias.is_none());
    }

    #[test]
    fn invalid_alias_and_website_rejected() {
        let mut user = user();
        let bad_alias = ProfileUpdate {
            alias: Some("a b".into()),
            ..Default::default()
        };
        assert!(bad_alias.apply_to(&mut user).is_err());

        let bad_site = ProfileUpdate {
            website: Some("ftp://example.com".into()),
            ..Default::default()
        };
        assert!(bad_site.apply_to(&mut user).is_err());
    }

    #[test]
    fn website_needs_a_host() {
        for bad in ["https://", "http://", "https://exa mple.com", "example.com"] {
            assert!(!is_http_url(bad), "{bad}");
            let mut user = user();
            let update = ProfileUpdate {
                website: Some(bad.into()),
                ..Default::default()
            };
            assert!(update.apply_to(&mut user).is_err(), "{bad}");
            assert!(user.website.is_none());
        }

        assert!(is_http_url("https://ada.example.com/about"));
        assert!(is_http_url("http://localhost:8080"));
    }
}
