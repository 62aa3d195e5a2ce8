use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::MediaKind;
use crate::error::DomainError;

pub const MAX_POST_LENGTH: usize = 5000;
pub const MAX_TAGS: usize = 10;
const MAX_TAG_LENGTH: usize = 50;

/// Post entity - a piece of user content in the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post from a validated draft.
    pub fn new(user_id: Uuid, draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            content: draft.content,
            tags: draft.tags,
            media_url: draft.media_url,
            media_type: draft.media_type,
            likes_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated input for a new post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub content: String,
    pub tags: Vec<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
}

impl PostDraft {
    pub fn new(
        content: &str,
        tags: Vec<String>,
        media_url: Option<String>,
        media_type: Option<&str>,
    ) -> Result<Self, DomainError> {
        let content = content.trim().to_string();
        let media_url = media_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let media_type = media_type
            .filter(|t| !t.trim().is_empty())
            .map(str::parse::<MediaKind>)
            .transpose()?;

        if content.is_empty() && media_url.is_none() {
            return Err(DomainError::validation("A post needs content or media"));
        }
        if content.chars().count() > MAX_POST_LENGTH {
            return Err(DomainError::validation(format!(
                "Content must be at most {MAX_POST_LENGTH} characters"
            )));
        }
        if media_url.is_some() != media_type.is_some() {
            return Err(DomainError::validation(
                "mediaUrl and mediaType must be provided together",
            ));
        }

        Ok(Self {
            content,
            tags: normalize_tags(tags)?,
            media_url,
            media_type,
        })
    }
}

/// Trim, strip a leading `#`, drop empties and duplicates while keeping order.
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, DomainError> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(DomainError::validation(format!(
                "Tags must be at most {MAX_TAG_LENGTH} characters"
            )));
        }
        if !normalized.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            normalized.push(tag.to_string());
        }
    }

    if normalized.len() > MAX_TAGS {
        return Err(DomainError::validation(format!(
            "A post can have at most {MAX_TAGS} tags"
        )));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized_in_order() {
        let draft = PostDraft::new(
            "hello",
            vec!["#rust".into(), " web ".into(), "Rust".into(), "".into(), "#".into()],
            None,
            None,
        )
        .unwrap();

        assert_eq!(draft.tags, vec!["rust".to_string(), "web".to_string()]);
    }

    #[test]
    fn empty_post_is_rejected() {
        assert!(PostDraft::new("   ", vec![], None, None).is_err());
    }

    #[test]
    fn media_only_post_is_accepted() {
        let draft = PostDraft::new(
            "",
            vec![],
            Some("https://cdn.example.com/a.png".into()),
            Some("image"),
        )
        .unwrap();
        assert_eq!(draft.media_type, Some(MediaKind::Image));
    }

    #[test]
    fn media_url_requires_type() {
        let err = PostDraft::new("hi", vec![], Some("https://x/a.png".into()), None);
        assert!(matches!(err, Err(DomainError::Validation(_))));
    }

    #[test]
    fn too_many_tags_rejected() {
        let tags = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        assert!(PostDraft::new("hi", tags, None, None).is_err());
    }

    #[test]
    fn new_post_starts_with_zero_counters() {
        let draft = PostDraft::new("hi", vec![], None, None).unwrap();
        let post = Post::new(Uuid::new_v4(), draft);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
    }
}
