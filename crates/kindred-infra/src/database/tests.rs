use chrono::Utc;
use sea_orm::{DatabaseBackend, DbConn, MockDatabase, MockExecResult};
use uuid::Uuid;

use kindred_core::domain::{Comment, LikeToggle, PageRequest, Post, PostDraft, User};
use kindred_core::error::RepoError;
use kindred_core::ports::{BaseRepository, CommentRepository, PostRepository, UserRepository};

use crate::database::entity::{comment, post, post_like, saved_post, user};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresUserRepository,
};

fn user_model(id: Uuid, email: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        name: "Ada".to_owned(),
        email: email.to_owned(),
        password_hash: "$argon2id$stub".to_owned(),
        is_verified: true,
        alias: Some("ada".to_owned()),
        bio: None,
        website: None,
        avatar_url: None,
        posts_count: 3,
        verification_token: None,
        verification_token_expires_at: None,
        reset_token: None,
        reset_token_expires_at: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn post_model(id: Uuid, user_id: Uuid, likes_count: i32) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        user_id,
        content: "hello".to_owned(),
        tags: vec!["rust".to_owned()],
        media_url: None,
        media_type: None,
        likes_count,
        comments_count: 0,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn affected(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Everything the mock connection executed, as one searchable string.
fn transcript(db: DbConn) -> String {
    format!("{:?}", db.into_transaction_log())
}

#[tokio::test]
async fn test_find_user_by_id() {
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user_model(user_id, "ada@example.com")]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user: User = repo.find_by_id(user_id).await.unwrap().unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(user.posts_count, 3);
    assert_eq!(user.alias.as_deref(), Some("ada"));
}

#[tokio::test]
async fn test_find_user_by_email_returns_none_when_absent() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.find_by_email("Nobody@Example.com").await.unwrap();

    assert!(user.is_none());
}

#[tokio::test]
async fn test_find_comment_by_id() {
    let comment_id = Uuid::new_v4();
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![comment::Model {
            id: comment_id,
            post_id,
            user_id: Uuid::new_v4(),
            content: "Nice shot".to_owned(),
            created_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);
    let comment = CommentRepository::find_by_id(&repo, comment_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(comment.post_id, post_id);
    assert_eq!(comment.content, "Nice shot");
}

#[tokio::test]
async fn test_membership_lookup_skips_query_for_empty_page() {
    // No query results are queued; any query would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresPostRepository::new(db);

    let liked = repo.liked_among(Uuid::new_v4(), &[]).await.unwrap();
    let saved = repo.saved_among(Uuid::new_v4(), &[]).await.unwrap();

    assert!(liked.is_empty());
    assert!(saved.is_empty());
}

#[tokio::test]
async fn test_removing_missing_comment_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);
    let comment = Comment::new(Uuid::new_v4(), Uuid::new_v4(), "gone").unwrap();

    let result = repo.remove(&comment).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_saved_posts_short_circuits_without_bookmarks() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<saved_post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let rows = repo
        .saved_by(Uuid::new_v4(), PageRequest::new(None, None, 20))
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_publish_inserts_and_bumps_posts_count() {
    let author_id = Uuid::new_v4();
    let draft = PostDraft::new("hello", vec!["rust".into()], None, None).unwrap();
    let post = Post::new(author_id, draft);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post.id, author_id, 0)]])
        .append_query_results(vec![vec![user_model(author_id, "ada@example.com")]])
        .append_exec_results(vec![affected(1)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let row = repo.publish(post).await.unwrap();

    assert_eq!(row.author.id, author_id);
    assert_eq!(row.post.tags, vec!["rust".to_owned()]);
    let log = transcript(db);
    assert!(log.contains("INSERT INTO"));
    assert!(log.contains(r#"UPDATE \"users\" SET \"posts_count\""#));
}

#[tokio::test]
async fn test_toggle_like_inserts_when_absent() {
    let post_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 4)]])
        .append_query_results(vec![
            Vec::<post_like::Model>::new(),
            vec![post_like::Model {
                post_id,
                user_id,
                created_at: Utc::now().into(),
            }],
        ])
        .append_exec_results(vec![affected(1)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let toggle = repo.toggle_like(post_id, user_id).await.unwrap();

    assert_eq!(toggle, LikeToggle { liked: true, likes_count: 5 });
    let log = transcript(db);
    assert!(log.contains("FOR UPDATE"));
    assert!(log.contains("INSERT INTO"));
    assert!(!log.contains("GREATEST"));
}

#[tokio::test]
async fn test_toggle_like_deletes_and_floors_counter() {
    let post_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 0)]])
        .append_query_results(vec![vec![post_like::Model {
            post_id,
            user_id,
            created_at: Utc::now().into(),
        }]])
        .append_exec_results(vec![affected(1), affected(1)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let toggle = repo.toggle_like(post_id, user_id).await.unwrap();

    assert_eq!(toggle, LikeToggle { liked: false, likes_count: 0 });
    let log = transcript(db);
    assert!(log.contains("DELETE FROM"));
    assert!(log.contains("GREATEST(likes_count - 1, 0)"));
}

#[tokio::test]
async fn test_toggle_like_on_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let result = repo.toggle_like(Uuid::new_v4(), Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_toggle_save_locks_post_then_inserts() {
    let post_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 0)]])
        .append_query_results(vec![vec![saved_post::Model {
            user_id,
            post_id,
            created_at: Utc::now().into(),
        }]])
        .append_exec_results(vec![affected(0)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    assert!(repo.toggle_save(post_id, user_id).await.unwrap());
    let log = transcript(db);
    assert!(log.contains("FOR UPDATE"));
    assert!(log.contains("INSERT INTO"));
}

#[tokio::test]
async fn test_toggle_save_removes_existing_bookmark() {
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 0)]])
        .append_exec_results(vec![affected(1)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    assert!(!repo.toggle_save(post_id, Uuid::new_v4()).await.unwrap());
    assert!(!transcript(db).contains("INSERT INTO"));
}

#[tokio::test]
async fn test_remove_post_floors_posts_count() {
    let author_id = Uuid::new_v4();
    let draft = PostDraft::new("bye", vec![], None, None).unwrap();
    let post = Post::new(author_id, draft);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![affected(1), affected(1)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    repo.remove(&post).await.unwrap();

    assert!(transcript(db).contains("GREATEST(posts_count - 1, 0)"));
}

#[tokio::test]
async fn test_remove_missing_post_is_not_found() {
    let draft = PostDraft::new("gone", vec![], None, None).unwrap();
    let post = Post::new(Uuid::new_v4(), draft);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![affected(0)])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    assert!(matches!(repo.remove(&post).await, Err(RepoError::NotFound)));
    assert!(!transcript(db).contains("GREATEST"));
}

#[tokio::test]
async fn test_add_comment_bumps_counter_and_joins_author() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let comment = Comment::new(post_id, author_id, "Nice shot").unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, Uuid::new_v4(), 0)]])
        .append_query_results(vec![vec![comment::Model {
            id: comment.id,
            post_id,
            user_id: author_id,
            content: "Nice shot".to_owned(),
            created_at: Utc::now().into(),
        }]])
        .append_query_results(vec![vec![user_model(author_id, "ada@example.com")]])
        .append_exec_results(vec![affected(1)])
        .into_connection();
    let repo = PostgresCommentRepository::new(db.clone());

    let added = repo.add(comment).await.unwrap();

    assert_eq!(added.author.id, author_id);
    assert_eq!(added.comment.content, "Nice shot");
    let log = transcript(db);
    assert!(log.contains(r#"UPDATE \"posts\" SET \"comments_count\""#));
    assert!(!log.contains("GREATEST"));
}

#[tokio::test]
async fn test_add_comment_to_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();
    let repo = PostgresCommentRepository::new(db);
    let comment = Comment::new(Uuid::new_v4(), Uuid::new_v4(), "hello?").unwrap();

    assert!(matches!(repo.add(comment).await, Err(RepoError::NotFound)));
}
