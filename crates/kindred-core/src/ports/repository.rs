use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentWithAuthor, LikeToggle, PageRequest, Post, PostWithAuthor, User,
};
use crate::error::RepoError;

/// Generic repository trait for entities with a plain primary-key lifecycle.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique violations surface as [`RepoError::Constraint`].
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their (normalized) alias.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError>;

    /// Persist changes to a user's own fields.
    ///
    /// `posts_count` is owned by [`PostRepository`] and is never written here.
    async fn update(&self, user: User) -> Result<User, RepoError>;
}

/// Posts together with their like and save membership sets.
///
/// Every method that touches both a membership row and a denormalized
/// counter applies the two changes atomically.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;

    /// Insert a post and increment its owner's `posts_count`.
    async fn publish(&self, post: Post) -> Result<PostWithAuthor, RepoError>;

    /// Delete a post (likes, comments and saves cascade) and decrement its
    /// owner's `posts_count`, floored at zero.
    async fn remove(&self, post: &Post) -> Result<(), RepoError>;

    /// All posts, newest first. Fetches `page.fetch_limit()` rows.
    async fn feed(&self, page: PageRequest) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// Posts of one author, newest first. Fetches `page.fetch_limit()` rows.
    async fn by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// Posts saved by `user_id`, most recently saved first. Fetches `page.fetch_limit()` rows.
    async fn saved_by(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError>;

    /// Flip `user_id`'s like on `post_id`, adjusting `likes_count` in the same step.
    /// Returns [`RepoError::NotFound`] if the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, RepoError>;

    /// Flip `user_id`'s bookmark on `post_id`; returns whether it is now saved.
    async fn toggle_save(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError>;

    /// The subset of `post_ids` liked by `user_id`.
    async fn liked_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError>;

    /// The subset of `post_ids` saved by `user_id`.
    async fn saved_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError>;
}

/// Comment repository; keeps the parent post's `comments_count` in step.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError>;

    /// Insert a comment and increment the post's `comments_count`.
    async fn add(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError>;

    /// Delete a comment and decrement the post's `comments_count`, floored at zero.
    async fn remove(&self, comment: &Comment) -> Result<(), RepoError>;

    /// Comments on a post, oldest first. Fetches `page.fetch_limit()` rows.
    async fn for_post(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<CommentWithAuthor>, RepoError>;
}
