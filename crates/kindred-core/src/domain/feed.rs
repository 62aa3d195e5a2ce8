//! Read-side view models assembled for the feed.

use serde::Serialize;
use uuid::Uuid;

use super::comment::Comment;
use super::post::Post;
use super::user::User;

/// Minimal author projection shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub alias: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            alias: user.alias.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// A post joined with its author.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

/// A post annotated for the requesting user.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub post: Post,
    pub author: Author,
    pub liked_by_me: bool,
    pub saved_by_me: bool,
}

#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: Author,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i32,
}

/// Offset pagination request; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const MAX_LIMIT: u64 = 100;
    /// Keeps `offset() + fetch_limit()` within `i64` for SQL `OFFSET`.
    pub const MAX_PAGE: u64 = i64::MAX as u64 / Self::MAX_LIMIT;

    /// Clamp client input: page to `1..=MAX_PAGE`, limit to `1..=MAX_LIMIT`.
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    /// Repositories fetch one extra row so callers can tell whether another page exists.
    pub fn fetch_limit(&self) -> u64 {
        self.limit + 1
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`PageRequest::fetch_limit`].
    pub fn from_overfetch(mut items: Vec<T>, request: PageRequest) -> Self {
        let has_more = items.len() as u64 > request.limit;
        items.truncate(request.limit as usize);
        Self {
            items,
            page: request.page,
            limit: request.limit,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_input() {
        let req = PageRequest::new(Some(0), Some(1000), 20);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, PageRequest::MAX_LIMIT);

        let req = PageRequest::new(None, None, 30);
        assert_eq!(req.limit, 30);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(3), Some(20), 20);
        assert_eq!(req.offset(), 40);
        assert_eq!(req.fetch_limit(), 21);
    }

    #[test]
    fn huge_page_offset_fits_in_i64() {
        let req = PageRequest::new(Some(1_000_000_000_000_000_000), Some(100), 20);
        assert_eq!(req.page, PageRequest::MAX_PAGE);
        assert!(i64::try_from(req.offset() + req.fetch_limit()).is_ok());

        let req = PageRequest::new(Some(u64::MAX), None, 20);
        assert!(i64::try_from(req.offset()).is_ok());
    }

    #[test]
    fn overfetch_sets_has_more_and_trims() {
        let req = PageRequest::new(Some(1), Some(2), 20);
        let page = Page::from_overfetch(vec![1, 2, 3], req);
        assert!(page.has_more);
        assert_eq!(page.items, vec![1, 2]);

        let page = Page::from_overfetch(vec![1, 2], req);
        assert!(!page.has_more);
    }
}
