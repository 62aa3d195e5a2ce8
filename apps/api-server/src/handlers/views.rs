//! Domain to wire conversions.

use kindred_core::domain::{Author, CommentWithAuthor, FeedItem, Page, User};
use kindred_shared::dto::{
    AuthorResponse, CommentResponse, PageResponse, PostResponse, ProfileResponse, UserResponse,
};

pub fn user(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        is_verified: user.is_verified,
        alias: user.alias,
        bio: user.bio,
        website: user.website,
        avatar_url: user.avatar_url,
        posts_count: user.posts_count,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// Public view of someone's profile; never carries the email.
pub fn profile(user: User) -> ProfileResponse {
    ProfileResponse {
        id: user.id,
        name: user.name,
        alias: user.alias,
        bio: user.bio,
        website: user.website,
        avatar_url: user.avatar_url,
        posts_count: user.posts_count,
        created_at: user.created_at,
    }
}

fn author(author: Author) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        name: author.name,
        alias: author.alias,
        avatar_url: author.avatar_url,
    }
}

pub fn post(item: FeedItem) -> PostResponse {
    let FeedItem {
        post,
        author: post_author,
        liked_by_me,
        saved_by_me,
    } = item;

    PostResponse {
        id: post.id,
        content: post.content,
        tags: post.tags,
        media_url: post.media_url,
        media_type: post.media_type.map(|kind| kind.as_str().to_string()),
        likes_count: post.likes_count,
        comments_count: post.comments_count,
        liked_by_me,
        saved_by_me,
        author: author(post_author),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn comment(row: CommentWithAuthor) -> CommentResponse {
    CommentResponse {
        id: row.comment.id,
        post_id: row.comment.post_id,
        content: row.comment.content,
        author: author(row.author),
        created_at: row.comment.created_at,
    }
}

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let page = page.map(f);
    PageResponse {
        items: page.items,
        page: page.page,
        limit: page.limit,
        has_more: page.has_more,
    }
}
