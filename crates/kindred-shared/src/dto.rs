//! Data Transfer Objects - request/response types for the API.
//!
//! All bodies use camelCase field names on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of forgot-password and resend-verification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[serde(alias = "password")]
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

/// Offset pagination query string.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Content must be at most 5000 characters"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 10, message = "A post can have at most 10 tags"))]
    pub tags: Vec<String>,
    #[validate(length(max = 2048, message = "mediaUrl is too long"))]
    pub media_url: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub content: String,
}

/// Partial profile update; absent fields are left alone, empty strings clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 31, message = "Alias must be at most 30 characters"))]
    pub alias: Option<String>,
    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    pub bio: Option<String>,
    #[validate(
        length(max = 200, message = "Website must be at most 200 characters"),
        custom(function = "validate_website")
    )]
    pub website: Option<String>,
}

/// An empty website clears the field; anything else must be a URL.
fn validate_website(website: &str) -> Result<(), ValidationError> {
    let website = website.trim();
    if website.is_empty() || website.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Website must be an http(s) URL".into()))
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The authenticated user's own account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
    pub alias: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub posts_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Another user's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub alias: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub posts_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: Uuid,
    pub name: String,
    pub alias: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub liked_by_me: bool,
    pub saved_by_me: bool,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub likes_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveToggleResponse {
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub url: String,
    pub media_type: String,
}

/// Response containing the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret123".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            name: "".into(),
            email: "nope".into(),
            password: "short".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_update_profile_website_validation() {
        let with_site = |site: &str| UpdateProfileRequest {
            website: Some(site.to_string()),
            ..Default::default()
        };

        assert!(with_site("").validate().is_ok());
        assert!(with_site("https://ada.example.com").validate().is_ok());
        assert!(UpdateProfileRequest::default().validate().is_ok());

        for bad in ["https://", "not a url", "example.com"] {
            let errors = with_site(bad).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("website"), "{bad}");
        }
    }

    #[test]
    fn test_reset_password_accepts_both_field_names() {
        let a: ResetPasswordRequest =
            serde_json::from_str(r#"{"token":"t","newPassword":"secret123"}"#).unwrap();
        let b: ResetPasswordRequest =
            serde_json::from_str(r#"{"token":"t","password":"secret123"}"#).unwrap();
        assert_eq!(a.new_password, b.new_password);
    }

    #[test]
    fn test_create_post_defaults() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"mediaUrl":"https://cdn.x/a.png","mediaType":"image"}"#)
                .unwrap();
        assert!(req.content.is_empty());
        assert!(req.tags.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_like_toggle_is_camel_case() {
        let json = serde_json::to_value(LikeToggleResponse {
            liked: true,
            likes_count: 1,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"liked": true, "likesCount": 1}));
    }
}
