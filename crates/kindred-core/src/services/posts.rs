//! Posts, the feed, likes, saves, comments and post media.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    Actor, Comment, CommentWithAuthor, FeedItem, LikeToggle, MediaKind, POST_MEDIA_POLICY, Page,
    PageRequest, Post, PostDraft, PostWithAuthor, Upload,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{CommentRepository, ObjectStorage, PostRepository};

pub const FEED_PAGE_SIZE: u64 = 20;
pub const USER_POSTS_PAGE_SIZE: u64 = 30;
pub const COMMENTS_PAGE_SIZE: u64 = 50;

/// A media object stored for later attachment to a post.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub media_type: MediaKind,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    media: Arc<dyn ObjectStorage>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        media: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            posts,
            comments,
            media,
        }
    }

    pub async fn create_post(
        &self,
        actor: &Actor,
        draft: PostDraft,
    ) -> Result<FeedItem, DomainError> {
        if let Some(url) = &draft.media_url {
            if self.owned_media_key(actor.user_id, url).is_none() {
                return Err(DomainError::validation(
                    "mediaUrl must reference media you uploaded",
                ));
            }
        }

        let post = Post::new(actor.user_id, draft);
        let PostWithAuthor { post, author } = self.posts.publish(post).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::unauthorized("Account no longer exists"),
            other => other.into(),
        })?;
        info!(post_id = %post.id, user_id = %actor.user_id, "Post created");

        Ok(FeedItem {
            post,
            author,
            liked_by_me: false,
            saved_by_me: false,
        })
    }

    pub async fn get_post(&self, actor: &Actor, post_id: Uuid) -> Result<FeedItem, DomainError> {
        let row = self.load(post_id).await?;
        let mut items = self.annotate(actor, vec![row]).await?;
        items
            .pop()
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    /// Platform-wide feed, newest first.
    pub async fn get_feed(
        &self,
        actor: &Actor,
        request: PageRequest,
    ) -> Result<Page<FeedItem>, DomainError> {
        let rows = self.posts.feed(request).await?;
        self.annotated_page(actor, rows, request).await
    }

    /// Posts of one author, annotated for the requesting user.
    pub async fn get_user_posts(
        &self,
        owner_id: Uuid,
        actor: &Actor,
        request: PageRequest,
    ) -> Result<Page<FeedItem>, DomainError> {
        let rows = self.posts.by_author(owner_id, request).await?;
        self.annotated_page(actor, rows, request).await
    }

    pub async fn get_saved_posts(
        &self,
        actor: &Actor,
        request: PageRequest,
    ) -> Result<Page<FeedItem>, DomainError> {
        let rows = self.posts.saved_by(actor.user_id, request).await?;
        self.annotated_page(actor, rows, request).await
    }

    pub async fn toggle_like(
        &self,
        actor: &Actor,
        post_id: Uuid,
    ) -> Result<LikeToggle, DomainError> {
        let toggle = self
            .posts
            .toggle_like(post_id, actor.user_id)
            .await
            .map_err(|e| post_error(e, post_id))?;
        debug!(post_id = %post_id, user_id = %actor.user_id, liked = toggle.liked, "Like toggled");
        Ok(toggle)
    }

    pub async fn toggle_save(&self, actor: &Actor, post_id: Uuid) -> Result<bool, DomainError> {
        let saved = self
            .posts
            .toggle_save(post_id, actor.user_id)
            .await
            .map_err(|e| post_error(e, post_id))?;
        debug!(post_id = %post_id, user_id = %actor.user_id, saved, "Save toggled");
        Ok(saved)
    }

    /// Delete one of the actor's own posts.
    ///
    /// Removing the remote media object is best effort; a failure is logged
    /// and the post is deleted regardless.
    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<(), DomainError> {
        let PostWithAuthor { post, .. } = self.load(post_id).await?;
        if !actor.owns(post.user_id) {
            return Err(DomainError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        if let Some(url) = &post.media_url {
            if self.owned_media_key(post.user_id, url).is_none() {
                warn!(post_id = %post.id, "Post media not owned by author, leaving it in place");
            } else if let Err(e) = self.media.delete(url).await {
                warn!(post_id = %post.id, error = %e, "Failed to delete post media");
            }
        }

        self.posts
            .remove(&post)
            .await
            .map_err(|e| post_error(e, post_id))?;
        info!(post_id = %post_id, user_id = %actor.user_id, "Post deleted");
        Ok(())
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, DomainError> {
        let comment = Comment::new(post_id, actor.user_id, content)?;
        let comment = self
            .comments
            .add(comment)
            .await
            .map_err(|e| post_error(e, post_id))?;
        debug!(comment_id = %comment.comment.id, post_id = %post_id, "Comment added");
        Ok(comment)
    }

    pub async fn delete_comment(&self, actor: &Actor, comment_id: Uuid) -> Result<(), DomainError> {
        let comment = self
            .comments
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;

        if !actor.owns(comment.user_id) {
            return Err(DomainError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comments.remove(&comment).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("Comment", comment_id),
            other => other.into(),
        })?;
        debug!(comment_id = %comment_id, post_id = %comment.post_id, "Comment deleted");
        Ok(())
    }

    pub async fn list_comments(
        &self,
        post_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<CommentWithAuthor>, DomainError> {
        self.load(post_id).await?;
        let rows = self.comments.for_post(post_id, request).await?;
        Ok(Page::from_overfetch(rows, request))
    }

    /// Validate an upload against the post media allow-list and store it.
    pub async fn upload_media(
        &self,
        actor: &Actor,
        upload: Upload,
    ) -> Result<StoredMedia, DomainError> {
        let rule = POST_MEDIA_POLICY.check(&upload)?;
        let key = format!(
            "posts/{}/{}.{}",
            actor.user_id,
            Uuid::new_v4().simple(),
            rule.extension
        );

        let size = upload.bytes.len();
        let url = self.media.put(&key, upload.bytes, rule.mime).await?;
        info!(user_id = %actor.user_id, key = %key, size, "Post media stored");

        Ok(StoredMedia {
            url,
            media_type: rule.kind,
        })
    }

    /// Key of a media URL in this store under the owner's `posts/<id>/` prefix.
    fn owned_media_key(&self, owner_id: Uuid, url: &str) -> Option<String> {
        let prefix = format!("posts/{owner_id}/");
        self.media.key_of(url).filter(|key| key.starts_with(&prefix))
    }

    async fn load(&self, post_id: Uuid) -> Result<PostWithAuthor, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    async fn annotated_page(
        &self,
        actor: &Actor,
        rows: Vec<PostWithAuthor>,
        request: PageRequest,
    ) -> Result<Page<FeedItem>, DomainError> {
        let Page {
            items,
            page,
            limit,
            has_more,
        } = Page::from_overfetch(rows, request);
        let items = self.annotate(actor, items).await?;

        Ok(Page {
            items,
            page,
            limit,
            has_more,
        })
    }

    /// Mark each row with the actor's like/save membership, looked up for these ids only.
    async fn annotate(
        &self,
        actor: &Actor,
        rows: Vec<PostWithAuthor>,
    ) -> Result<Vec<FeedItem>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();
        let liked = self.posts.liked_among(actor.user_id, &ids).await?;
        let saved = self.posts.saved_among(actor.user_id, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|PostWithAuthor { post, author }| FeedItem {
                liked_by_me: liked.contains(&post.id),
                saved_by_me: saved.contains(&post.id),
                post,
                author,
            })
            .collect())
    }
}

fn post_error(err: RepoError, post_id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("Post", post_id),
        other => other.into(),
    }
}
