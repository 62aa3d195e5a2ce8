//! Upload validation for post media and avatars.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const MB: usize = 1024 * 1024;

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(DomainError::validation(format!(
                "Unsupported media type '{other}'"
            ))),
        }
    }
}

/// A binary upload as received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One accepted MIME type together with its size ceiling.
#[derive(Debug)]
pub struct UploadRule {
    pub mime: &'static str,
    pub kind: MediaKind,
    pub extension: &'static str,
    pub max_bytes: usize,
}

/// A fixed allow-list of upload types.
#[derive(Debug)]
pub struct UploadPolicy {
    pub rules: &'static [UploadRule],
}

/// Post media: images up to 10 MB, video up to 50 MB.
pub const POST_MEDIA_POLICY: UploadPolicy = UploadPolicy {
    rules: &[
        UploadRule {
            mime: "image/jpeg",
            kind: MediaKind::Image,
            extension: "jpg",
            max_bytes: 10 * MB,
        },
        UploadRule {
            mime: "image/png",
            kind: MediaKind::Image,
            extension: "png",
            max_bytes: 10 * MB,
        },
        UploadRule {
            mime: "image/gif",
            kind: MediaKind::Image,
            extension: "gif",
            max_bytes: 10 * MB,
        },
        UploadRule {
            mime: "image/webp",
            kind: MediaKind::Image,
            extension: "webp",
            max_bytes: 10 * MB,
        },
        UploadRule {
            mime: "video/mp4",
            kind: MediaKind::Video,
            extension: "mp4",
            max_bytes: 50 * MB,
        },
        UploadRule {
            mime: "video/webm",
            kind: MediaKind::Video,
            extension: "webm",
            max_bytes: 50 * MB,
        },
        UploadRule {
            mime: "video/quicktime",
            kind: MediaKind::Video,
            extension: "mov",
            max_bytes: 50 * MB,
        },
    ],
};

/// Avatars: images up to 5 MB.
pub const AVATAR_POLICY: UploadPolicy = UploadPolicy {
    rules: &[
        UploadRule {
            mime: "image/jpeg",
            kind: MediaKind::Image,
            extension: "jpg",
            max_bytes: 5 * MB,
        },
        UploadRule {
            mime: "image/png",
            kind: MediaKind::Image,
            extension: "png",
            max_bytes: 5 * MB,
        },
        UploadRule {
            mime: "image/gif",
            kind: MediaKind::Image,
            extension: "gif",
            max_bytes: 5 * MB,
        },
        UploadRule {
            mime: "image/webp",
            kind: MediaKind::Image,
            extension: "webp",
            max_bytes: 5 * MB,
        },
    ],
};

impl UploadPolicy {
    /// Largest size any rule accepts, used to cap how much of a request body is read.
    pub fn max_bytes(&self) -> usize {
        self.rules.iter().map(|r| r.max_bytes).max().unwrap_or(0)
    }

    /// Match an upload against the allow-list.
    pub fn check(&self, upload: &Upload) -> Result<&'static UploadRule, DomainError> {
        let mime = upload.content_type.trim().to_ascii_lowercase();
        let rule = self
            .rules
            .iter()
            .find(|r| r.mime == mime)
            .ok_or_else(|| DomainError::validation(format!("File type '{mime}' is not allowed")))?;

        if upload.bytes.is_empty() {
            return Err(DomainError::validation("Uploaded file is empty"));
        }

        if upload.bytes.len() > rule.max_bytes {
            return Err(DomainError::validation(format!(
                "File exceeds the {} MB limit for {}",
                rule.max_bytes / MB,
                rule.kind
            )));
        }

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> Upload {
        Upload {
            file_name: Some("file".into()),
            content_type: content_type.into(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn accepts_image_within_limit() {
        let rule = POST_MEDIA_POLICY.check(&upload("image/png", 1024)).unwrap();
        assert_eq!(rule.kind, MediaKind::Image);
        assert_eq!(rule.extension, "png");
    }

    #[test]
    fn video_limit_is_larger_than_image_limit() {
        assert!(POST_MEDIA_POLICY.check(&upload("image/jpeg", 11 * MB)).is_err());
        assert!(POST_MEDIA_POLICY.check(&upload("video/mp4", 11 * MB)).is_ok());
        assert!(POST_MEDIA_POLICY.check(&upload("video/mp4", 51 * MB)).is_err());
    }

    #[test]
    fn avatar_policy_rejects_video_and_large_images() {
        assert!(AVATAR_POLICY.check(&upload("video/mp4", 10)).is_err());
        assert!(AVATAR_POLICY.check(&upload("image/png", 6 * MB)).is_err());
        assert_eq!(AVATAR_POLICY.max_bytes(), 5 * MB);
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert!(POST_MEDIA_POLICY.check(&upload("application/pdf", 10)).is_err());
        assert!(POST_MEDIA_POLICY.check(&upload("image/png", 0)).is_err());
    }

    #[test]
    fn media_kind_parses_case_insensitively() {
        assert_eq!("IMAGE".parse::<MediaKind>().unwrap(), MediaKind::Image);
        assert!("audio".parse::<MediaKind>().is_err());
    }
}
