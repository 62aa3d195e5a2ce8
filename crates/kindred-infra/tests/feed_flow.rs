mod common;

use common::Harness;
use kindred_core::DomainError;
use kindred_core::domain::{
    LikeToggle, MediaKind, PageRequest, Post, PostDraft, ProfileUpdate, Upload, User,
};
use kindred_core::ports::{BaseRepository, PostRepository};
use kindred_core::services::FEED_PAGE_SIZE;

fn text(content: &str) -> PostDraft {
    PostDraft::new(content, vec![], None, None).unwrap()
}

fn first_page() -> PageRequest {
    PageRequest::new(None, None, FEED_PAGE_SIZE)
}

fn png(size: usize) -> Upload {
    Upload {
        file_name: Some("pic.png".to_string()),
        content_type: "image/png".to_string(),
        bytes: vec![0u8; size],
    }
}

async fn posts_count(h: &Harness, user: &User) -> i32 {
    let user: User = BaseRepository::find_by_id(h.store.as_ref(), user.id)
        .await
        .unwrap()
        .unwrap();
    user.posts_count
}

#[tokio::test]
async fn test_create_post_starts_with_zero_counters() {
    let h = Harness::new();
    let (user, ada) = h.verified_user("Ada", "ada@example.com").await;

    let item = h.posts.create_post(&ada, text("hello world")).await.unwrap();

    assert_eq!(item.post.likes_count, 0);
    assert_eq!(item.post.comments_count, 0);
    assert!(!item.liked_by_me);
    assert!(!item.saved_by_me);
    assert_eq!(item.author.id, user.id);
    assert_eq!(posts_count(&h, &user).await, 1);
}

#[tokio::test]
async fn test_toggle_like_twice_restores_state() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let post = h.posts.create_post(&ada, text("like me")).await.unwrap().post;

    let on = h.posts.toggle_like(&ada, post.id).await.unwrap();
    assert_eq!(on, LikeToggle { liked: true, likes_count: 1 });
    assert!(h.posts.get_post(&ada, post.id).await.unwrap().liked_by_me);

    let off = h.posts.toggle_like(&ada, post.id).await.unwrap();
    assert_eq!(off, LikeToggle { liked: false, likes_count: 0 });

    let item = h.posts.get_post(&ada, post.id).await.unwrap();
    assert!(!item.liked_by_me);
    assert_eq!(item.post.likes_count, 0);
}

#[tokio::test]
async fn test_like_on_missing_post_is_not_found() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;

    let result = h.posts.toggle_like(&ada, uuid::Uuid::new_v4()).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_feed_annotations_are_per_viewer() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, bob) = h.verified_user("Bob", "bob@example.com").await;
    let post = h.posts.create_post(&ada, text("shared")).await.unwrap().post;

    h.posts.toggle_like(&bob, post.id).await.unwrap();
    h.posts.toggle_save(&bob, post.id).await.unwrap();

    let bobs = h.posts.get_feed(&bob, first_page()).await.unwrap();
    let adas = h.posts.get_feed(&ada, first_page()).await.unwrap();

    assert!(bobs.items[0].liked_by_me && bobs.items[0].saved_by_me);
    assert!(!adas.items[0].liked_by_me && !adas.items[0].saved_by_me);
    assert_eq!(adas.items[0].post.likes_count, 1);
}

#[tokio::test]
async fn test_feed_pages_newest_first() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    for i in 0..5 {
        h.posts.create_post(&ada, text(&format!("post {i}"))).await.unwrap();
    }

    let first = h
        .posts
        .get_feed(&ada, PageRequest::new(Some(1), Some(2), FEED_PAGE_SIZE))
        .await
        .unwrap();
    let last = h
        .posts
        .get_feed(&ada, PageRequest::new(Some(3), Some(2), FEED_PAGE_SIZE))
        .await
        .unwrap();

    let contents: Vec<_> = first.items.iter().map(|i| i.post.content.as_str()).collect();
    assert_eq!(contents, ["post 4", "post 3"]);
    assert!(first.has_more);
    assert_eq!(last.items.len(), 1);
    assert!(!last.has_more);
}

#[tokio::test]
async fn test_delete_post_cascades_and_decrements_owner() {
    let h = Harness::new();
    let (user, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, bob) = h.verified_user("Bob", "bob@example.com").await;
    let post = h.posts.create_post(&ada, text("short-lived")).await.unwrap().post;

    h.posts.toggle_like(&bob, post.id).await.unwrap();
    h.posts.toggle_save(&bob, post.id).await.unwrap();
    let comment = h.posts.add_comment(&bob, post.id, "nice").await.unwrap();

    h.posts.delete_post(&ada, post.id).await.unwrap();

    assert_eq!(posts_count(&h, &user).await, 0);
    assert!(matches!(
        h.posts.get_post(&ada, post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(h.posts.get_saved_posts(&bob, first_page()).await.unwrap().items.is_empty());
    assert!(matches!(
        h.posts.delete_comment(&bob, comment.comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_only_owners_delete() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, bob) = h.verified_user("Bob", "bob@example.com").await;
    let post = h.posts.create_post(&ada, text("mine")).await.unwrap().post;
    let comment = h.posts.add_comment(&ada, post.id, "also mine").await.unwrap();

    assert!(matches!(
        h.posts.delete_post(&bob, post.id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.posts.delete_comment(&bob, comment.comment.id).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(h.posts.get_post(&bob, post.id).await.is_ok());
}

#[tokio::test]
async fn test_comments_update_counter_and_list_oldest_first() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let post = h.posts.create_post(&ada, text("discuss")).await.unwrap().post;

    let first = h.posts.add_comment(&ada, post.id, "  first  ").await.unwrap();
    h.posts.add_comment(&ada, post.id, "second").await.unwrap();
    assert_eq!(first.comment.content, "first");
    assert_eq!(first.author.name, "Ada");

    let page = h.posts.list_comments(post.id, first_page()).await.unwrap();
    let contents: Vec<_> = page.items.iter().map(|c| c.comment.content.as_str()).collect();
    assert_eq!(contents, ["first", "second"]);
    assert_eq!(h.posts.get_post(&ada, post.id).await.unwrap().post.comments_count, 2);

    h.posts.delete_comment(&ada, first.comment.id).await.unwrap();
    assert_eq!(h.posts.get_post(&ada, post.id).await.unwrap().post.comments_count, 1);

    assert!(matches!(
        h.posts.add_comment(&ada, post.id, "   ").await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn test_saved_posts_most_recent_first() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let a = h.posts.create_post(&ada, text("a")).await.unwrap().post;
    let b = h.posts.create_post(&ada, text("b")).await.unwrap().post;

    assert!(h.posts.toggle_save(&ada, b.id).await.unwrap());
    assert!(h.posts.toggle_save(&ada, a.id).await.unwrap());

    let saved = h.posts.get_saved_posts(&ada, first_page()).await.unwrap();
    let ids: Vec<_> = saved.items.iter().map(|i| i.post.id).collect();
    assert_eq!(ids, [a.id, b.id]);
    assert!(saved.items.iter().all(|i| i.saved_by_me));

    assert!(!h.posts.toggle_save(&ada, a.id).await.unwrap());
    let saved = h.posts.get_saved_posts(&ada, first_page()).await.unwrap();
    assert_eq!(saved.items.len(), 1);
}

#[tokio::test]
async fn test_user_posts_only_lists_that_author() {
    let h = Harness::new();
    let (ada_user, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, bob) = h.verified_user("Bob", "bob@example.com").await;
    h.posts.create_post(&ada, text("by ada")).await.unwrap();
    h.posts.create_post(&bob, text("by bob")).await.unwrap();

    let page = h
        .posts
        .get_user_posts(ada_user.id, &bob, first_page())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].author.id, ada_user.id);
}

#[tokio::test]
async fn test_upload_media_then_attach_and_delete() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;

    let stored = h.posts.upload_media(&ada, png(1024)).await.unwrap();
    assert_eq!(stored.media_type, MediaKind::Image);
    assert!(h.media.contains_url(&stored.url).await);

    let draft = PostDraft::new("", vec![], Some(stored.url.clone()), Some("image")).unwrap();
    let post = h.posts.create_post(&ada, draft).await.unwrap().post;
    assert_eq!(post.media_type, Some(MediaKind::Image));

    h.posts.delete_post(&ada, post.id).await.unwrap();
    assert!(!h.media.contains_url(&stored.url).await);
}

#[tokio::test]
async fn test_create_post_rejects_media_of_another_user() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, eve) = h.verified_user("Eve", "eve@example.com").await;
    let stored = h.posts.upload_media(&ada, png(64)).await.unwrap();
    let avatar_url = h
        .profiles
        .update_avatar(&ada, png(32))
        .await
        .unwrap()
        .avatar_url
        .unwrap();

    for url in [stored.url.as_str(), avatar_url.as_str(), "https://elsewhere.example/x.png"] {
        let draft = PostDraft::new("", vec![], Some(url.to_string()), Some("image")).unwrap();
        let result = h.posts.create_post(&eve, draft).await;
        assert!(matches!(result, Err(DomainError::Validation(_))), "{url}");
    }

    assert!(h.media.contains_url(&stored.url).await);
    assert!(h.media.contains_url(&avatar_url).await);
}

#[tokio::test]
async fn test_delete_post_leaves_media_outside_author_prefix() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (eve_user, eve) = h.verified_user("Eve", "eve@example.com").await;
    let stored = h.posts.upload_media(&ada, png(64)).await.unwrap();

    // A row written before media ownership was enforced.
    let draft = PostDraft::new("", vec![], Some(stored.url.clone()), Some("image")).unwrap();
    let post = PostRepository::publish(h.store.as_ref(), Post::new(eve_user.id, draft))
        .await
        .unwrap()
        .post;

    h.posts.delete_post(&eve, post.id).await.unwrap();

    assert!(h.media.contains_url(&stored.url).await);
}

#[tokio::test]
async fn test_upload_media_rejects_unsupported_types() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let upload = Upload {
        file_name: Some("doc.pdf".to_string()),
        content_type: "application/pdf".to_string(),
        bytes: vec![1, 2, 3],
    };

    let result = h.posts.upload_media(&ada, upload).await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(h.media.is_empty().await);
}

#[tokio::test]
async fn test_profile_update_and_alias_uniqueness() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let (_, bob) = h.verified_user("Bob", "bob@example.com").await;

    let updated = h
        .profiles
        .update_profile(
            &ada,
            ProfileUpdate {
                alias: Some("@Ada.L".to_string()),
                bio: Some("Counting engines".to_string()),
                website: Some("https://ada.example.com".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.alias.as_deref(), Some("ada.l"));
    assert_eq!(updated.bio.as_deref(), Some("Counting engines"));

    let taken = h
        .profiles
        .update_profile(
            &bob,
            ProfileUpdate {
                alias: Some("ada.l".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await;
    assert!(matches!(taken, Err(DomainError::Duplicate(_))));

    // Re-saving one's own alias is fine.
    let same = h
        .profiles
        .update_profile(
            &ada,
            ProfileUpdate {
                alias: Some("ada.l".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await;
    assert!(same.is_ok());
}

#[tokio::test]
async fn test_profile_update_keeps_posts_count() {
    let h = Harness::new();
    let (user, ada) = h.verified_user("Ada", "ada@example.com").await;
    h.posts.create_post(&ada, text("one")).await.unwrap();

    let updated = h
        .profiles
        .update_profile(
            &ada,
            ProfileUpdate {
                name: Some("Ada L.".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.posts_count, 1);
    assert_eq!(posts_count(&h, &user).await, 1);
}

#[tokio::test]
async fn test_avatar_replacement_removes_previous_object() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;

    let first = h.profiles.update_avatar(&ada, png(10)).await.unwrap();
    let first_url = first.avatar_url.clone().unwrap();
    let second = h.profiles.update_avatar(&ada, png(20)).await.unwrap();

    assert_ne!(second.avatar_url.as_deref(), Some(first_url.as_str()));
    assert!(!h.media.contains_url(&first_url).await);
    assert_eq!(h.media.len().await, 1);
}

#[tokio::test]
async fn test_avatar_rejects_video() {
    let h = Harness::new();
    let (_, ada) = h.verified_user("Ada", "ada@example.com").await;
    let upload = Upload {
        file_name: Some("clip.mp4".to_string()),
        content_type: "video/mp4".to_string(),
        bytes: vec![0; 16],
    };

    assert!(matches!(
        h.profiles.update_avatar(&ada, upload).await,
        Err(DomainError::Validation(_))
    ));
}
