//! PostgreSQL repository implementations.
//!
//! Every mutation that pairs a membership row with a denormalized counter
//! runs both statements inside one transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use kindred_core::domain::{
    Author, Comment, CommentWithAuthor, LikeToggle, PageRequest, Post, PostWithAuthor, User,
    masked_email, normalize_email,
};
use kindred_core::error::RepoError;
use kindred_core::ports::{CommentRepository, PostRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::saved_post::{self, Entity as SavedPostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository (posts, likes, saves).
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

fn author_of(model: &user::Model) -> Author {
    Author {
        id: model.id,
        name: model.name.clone(),
        alias: model.alias.clone(),
        avatar_url: model.avatar_url.clone(),
    }
}

fn with_authors(rows: Vec<(post::Model, Option<user::Model>)>) -> Vec<PostWithAuthor> {
    rows.into_iter()
        .filter_map(|(post, author)| match author {
            Some(author) => Some(PostWithAuthor {
                author: author_of(&author),
                post: post.into(),
            }),
            None => {
                tracing::warn!(post_id = %post.id, "Skipping post without author row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = normalize_email(email);
        tracing::debug!(user_email = %masked_email(&email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Alias.eq(alias.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::VerificationToken.eq(token))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut active_model: user::ActiveModel = user.into();
        // Counter and creation time are never written from a loaded snapshot.
        active_model.posts_count = NotSet;
        active_model.created_at = NotSet;

        let model = active_model.update(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(row.and_then(|row| with_authors(vec![row]).pop()))
    }

    async fn publish(&self, post: Post) -> Result<PostWithAuthor, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let model = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;

        UserEntity::update_many()
            .col_expr(
                user::Column::PostsCount,
                Expr::col(user::Column::PostsCount).add(1),
            )
            .filter(user::Column::Id.eq(model.user_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let author = UserEntity::find_by_id(model.user_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        txn.commit().await.map_err(map_db_err)?;

        Ok(PostWithAuthor {
            author: author_of(&author),
            post: model.into(),
        })
    }

    async fn remove(&self, post: &Post) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let result = PostEntity::delete_by_id(post.id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        UserEntity::update_many()
            .col_expr(
                user::Column::PostsCount,
                Expr::cust("GREATEST(posts_count - 1, 0)"),
            )
            .filter(user::Column::Id.eq(post.user_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)
    }

    async fn feed(&self, page: PageRequest) -> Result<Vec<PostWithAuthor>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(page.offset())
            .limit(page.fetch_limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(with_authors(rows))
    }

    async fn by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(post::Column::UserId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(page.offset())
            .limit(page.fetch_limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(with_authors(rows))
    }

    async fn saved_by(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<PostWithAuthor>, RepoError> {
        let saved_ids: Vec<Uuid> = SavedPostEntity::find()
            .select_only()
            .column(saved_post::Column::PostId)
            .filter(saved_post::Column::UserId.eq(user_id))
            .order_by_desc(saved_post::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.fetch_limit())
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        if saved_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(post::Column::Id.is_in(saved_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        // Restore bookmark order.
        let mut by_id: HashMap<Uuid, PostWithAuthor> = with_authors(rows)
            .into_iter()
            .map(|row| (row.post.id, row))
            .collect();
        Ok(saved_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Row lock serializes concurrent toggles on the same post.
        let post = PostEntity::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let existing = PostLikeEntity::find_by_id((post_id, user_id))
            .one(&txn)
            .await
            .map_err(map_db_err)?;

        let (liked, counter) = if existing.is_some() {
            PostLikeEntity::delete_by_id((post_id, user_id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            (false, Expr::cust("GREATEST(likes_count - 1, 0)"))
        } else {
            post_like::ActiveModel {
                post_id: Set(post_id),
                user_id: Set(user_id),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
            (true, Expr::col(post::Column::LikesCount).add(1))
        };

        PostEntity::update_many()
            .col_expr(post::Column::LikesCount, counter)
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        let likes_count = if liked {
            post.likes_count + 1
        } else {
            (post.likes_count - 1).max(0)
        };
        Ok(LikeToggle { liked, likes_count })
    }

    async fn toggle_save(&self, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Same row lock as likes, so two toggles cannot both insert.
        PostEntity::find_by_id(post_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let removed = SavedPostEntity::delete_by_id((user_id, post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let saved = if removed.rows_affected == 0 {
            saved_post::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
            true
        } else {
            false
        };

        txn.commit().await.map_err(map_db_err)?;
        Ok(saved)
    }

    async fn liked_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = PostLikeEntity::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }

    async fn saved_among(
        &self,
        user_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, RepoError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<Uuid> = SavedPostEntity::find()
            .select_only()
            .column(saved_post::Column::PostId)
            .filter(saved_post::Column::UserId.eq(user_id))
            .filter(saved_post::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn add(&self, comment: Comment) -> Result<CommentWithAuthor, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        PostEntity::find_by_id(comment.post_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let model = comment::ActiveModel::from(comment)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;

        PostEntity::update_many()
            .col_expr(
                post::Column::CommentsCount,
                Expr::col(post::Column::CommentsCount).add(1),
            )
            .filter(post::Column::Id.eq(model.post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        let author = UserEntity::find_by_id(model.user_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        txn.commit().await.map_err(map_db_err)?;

        Ok(CommentWithAuthor {
            author: author_of(&author),
            comment: model.into(),
        })
    }

    async fn remove(&self, comment: &Comment) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let result = CommentEntity::delete_by_id(comment.id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        PostEntity::update_many()
            .col_expr(
                post::Column::CommentsCount,
                Expr::cust("GREATEST(comments_count - 1, 0)"),
            )
            .filter(post::Column::Id.eq(comment.post_id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)
    }

    async fn for_post(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .offset(page.offset())
            .limit(page.fetch_limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(comment, author)| {
                author.map(|author| CommentWithAuthor {
                    author: author_of(&author),
                    comment: comment.into(),
                })
            })
            .collect())
    }
}
