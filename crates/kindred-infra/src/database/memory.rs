//! In-memory persistence - used as fallback when no database is configured.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use kindred_core::domain::{
    Author, Comment, CommentWithAuthor, LikeToggle, PageRequest, Post, PostWithAuthor, User,
    normalize_email,
};
use kindred_core::error::RepoError;
use kindred_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Insertion order, oldest first.
    posts: Vec<Post>,
    /// `(post_id, user_id)`
    likes: HashSet<(Uuid, Uuid)>,
    /// `(user_id, post_id)` in save order, oldest first.
    saves: Vec<(Uuid, Uuid)>,
    /// Insertion order, oldest first.
    comments: Vec<Comment>,
}

impl Tables {
    fn author(&self, user_id: Uuid) -> Option<Author> {
        self.users.get(&user_id).map(Author::from)
    }

    fn post_mut(&mut self, post_id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    fn with_author(&self, post: &Post) -> Option<PostWithAuthor> {
        Some(PostWithAuthor {
            author: self.author(post.user_id)?,
            post: post.clone(),
        })
    }

    fn alias_taken(&self, alias: &str, except: Uuid) -> bool {
        self.users
            .values()
            .any(|u| u.id != except && u.alias.as_deref() == Some(alias))
    }
}

fn window<T>(rows: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    rows.skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.fetch_limit() as usize)
        .collect()
}

/// All repositories over one set of in-process tables.
///
/// Each compound mutation (membership row plus counter) happens under a
/// single write lock. Data is lost on process restart.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        if let Some(alias) = &user.alias {
            if tables.alias_taken(alias, user.id) {
                return Err(RepoError::Constraint("users_alias_key".to_string()));
            }
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<User>, RepoError> {
        let alias = alias.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.alias.as_deref() == Some(alias.as_str()))
            .cloned())
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update(&self, mut user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if let Some(alias) = &user.alias {
            if tables.alias_taken(alias, user.id) {
                return Err(RepoError::Constraint("users_alias_key".to_string()));
            }
        }

        let stored = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        user.posts_count = stored.posts_count;
        user.created_at = stored.created_at;
        *stored = user.clone();
        Ok(user)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| tables.with_author(p)))
    }

    async fn publish(&self, post: Post) -> Result<PostWithAuthor, RepoError> {
        let mut tables = self.tables.write().await;

        let owner = tables
            .users
            .get_mut(&post.user_id)
            .ok_or(RepoError::NotFound)?;
        owner.posts_count += 1;
        let author = Author::from(&*owner);

        tables.posts.push(post.clone());
        Ok(PostWithAuthor { post, author })
    }

    async fn remove(&self, post: &Post) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != post.id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }

        tables.likes.retain(|(post_id, _)| *post_id != post.id);
        tables.saves.retain(|(_, post_id)| *post_id != post.id);
        tables.comments.retain(|c| c.post_id != post.id);

        if let Some(owner) = tables.users.get_mut(&post.user_id) {
            owner.posts_count = (owner.posts_count - 1).max(0);
        }
        Ok(())
    }

    async fn feed(&self, page: PageRequest) -> Result<Vec<PostWithAuthor>, RepoError> {
        let tables = self.tables.read().await;
        let rows = tables.posts.iter().rev().filter_map(|p| tables.with_author(p));
        Ok(window(rows, page))
    }

    async fn by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let tables = self.tables.read().await;
        let rows = tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.user_id == author_id)
            .filter_map(|p| tables.with_author(p));
        Ok(window(rows, page))
    }

    async fn saved_by(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let tables = self.tables.read().await;
        let rows = tables
            .saves
            .iter()
            .rev()
            .filter(|(saver, _)| *saver == user_id)
            .filter_map(|(_, post_id)| tables.posts.iter().find(|p| p.id == *post_id))
            .filter_map(|p| tables.with_author(p));
        Ok(window(rows, page))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.post_mut(post_id).is_none() {
            return Err(RepoError::NotFound);
        }

        let liked = if tables.likes.remove(&(post_id, user_id)) {
            false
        } else {
            tables.likes.insert((post_id, user_id));
            true
        };

        let post = tables.post_mut(post_id).ok_or(RepoError::NotFound)?;
        post.likes_count = if liked {
            post.likes_count + 1
        } else {
            (post.likes_count - 1).max(0)
        };

        Ok(LikeToggle {
            liked,
            likes_count: post.likes_count,
        })
    }

    async fn toggle_save(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.post_mut(post_id).is_none() {
            return Err(RepoError::NotFound);
        }

        let before = tables.saves.len();
        tables
            .saves
            .retain(|entry| *entry != (user_id, post_id));
        if tables.saves.len() < before {
            return Ok(false);
        }

        tables.saves.push((user_id, post_id));
        Ok(true)
    }

    async fn liked_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError> {
        let tables = self.tables.read().await;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|post_id| tables.likes.contains(&(*post_id, user_id)))
            .collect())
    }

    async fn saved_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError> {
        let tables = self.tables.read().await;
        Ok(post_ids
            .iter()
            .copied()
            .filter(|post_id| tables.saves.contains(&(user_id, *post_id)))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn add(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError> {
        let mut tables = self.tables.write().await;

        let author = tables.author(comment.user_id).ok_or(RepoError::NotFound)?;
        let post = tables
            .post_mut(comment.post_id)
            .ok_or(RepoError::NotFound)?;
        post.comments_count += 1;

        tables.comments.push(comment.clone());
        Ok(CommentWithAuthor { comment, author })
    }

    async fn remove(&self, comment: &Comment) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != comment.id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }

        if let Some(post) = tables.post_mut(comment.post_id) {
            post.comments_count = (post.comments_count - 1).max(0);
        }
        Ok(())
    }

    async fn for_post(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let tables = self.tables.read().await;
        let rows = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                Some(CommentWithAuthor {
                    author: tables.author(c.user_id)?,
                    comment: c.clone(),
                })
            });
        Ok(window(rows, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::domain::PostDraft;

    async fn seeded() -> (InMemoryStore, User) {
        let store = InMemoryStore::new();
        let user = User::new("Ada".into(), "ada@example.com", "hash".into());
        let user = BaseRepository::insert(&store, user).await.unwrap();
        (store, user)
    }

    fn post_by(user: &User, text: &str) -> Post {
        Post::new(user.id, PostDraft::new(text, vec![], None, None).unwrap())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_constraint_violation() {
        let (store, _) = seeded().await;
        let twin = User::new("Other".into(), "ADA@example.com", "hash".into());

        let result = BaseRepository::insert(&store, twin).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_update_never_overwrites_posts_count() {
        let (store, user) = seeded().await;
        store.publish(post_by(&user, "one")).await.unwrap();

        let mut stale = user.clone();
        stale.bio = Some("hello".into());
        let updated = store.update(stale).await.unwrap();

        assert_eq!(updated.posts_count, 1);
        assert_eq!(updated.bio.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores_count() {
        let (store, user) = seeded().await;
        let post = store.publish(post_by(&user, "hi")).await.unwrap().post;

        let first = store.toggle_like(post.id, user.id).await.unwrap();
        let second = store.toggle_like(post.id, user.id).await.unwrap();

        assert_eq!(first, LikeToggle { liked: true, likes_count: 1 });
        assert_eq!(second, LikeToggle { liked: false, likes_count: 0 });
    }

    #[tokio::test]
    async fn test_remove_post_cascades_and_decrements_owner() {
        let (store, user) = seeded().await;
        let post = store.publish(post_by(&user, "bye")).await.unwrap().post;
        store.toggle_like(post.id, user.id).await.unwrap();
        store.toggle_save(post.id, user.id).await.unwrap();
        let comment = Comment::new(post.id, user.id, "first").unwrap();
        let comment_id = comment.id;
        store.add(comment).await.unwrap();

        PostRepository::remove(&store, &post).await.unwrap();

        assert!(CommentRepository::find_by_id(&store, comment_id).await.unwrap().is_none());
        assert!(store.liked_among(user.id, &[post.id]).await.unwrap().is_empty());
        assert!(store.saved_among(user.id, &[post.id]).await.unwrap().is_empty());
        let owner: User = BaseRepository::find_by_id(&store, user.id).await.unwrap().unwrap();
        assert_eq!(owner.posts_count, 0);
    }

    #[tokio::test]
    async fn test_feed_is_newest_first() {
        let (store, user) = seeded().await;
        for text in ["a", "b", "c"] {
            store.publish(post_by(&user, text)).await.unwrap();
        }

        let rows = store.feed(PageRequest::new(Some(1), Some(2), 20)).await.unwrap();
        let contents: Vec<_> = rows.iter().map(|r| r.post.content.as_str()).collect();

        // Over-fetches one row past the page.
        assert_eq!(contents, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let (store, user) = seeded().await;
        let comment = Comment::new(Uuid::new_v4(), user.id, "hello?").unwrap();

        assert!(matches!(store.add(comment).await, Err(RepoError::NotFound)));
    }
}
