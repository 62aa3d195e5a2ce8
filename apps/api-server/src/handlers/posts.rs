//! Post, feed, like, save and comment handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use kindred_core::domain::{POST_MEDIA_POLICY, PageRequest, PostDraft};
use kindred_core::services::{COMMENTS_PAGE_SIZE, FEED_PAGE_SIZE, USER_POSTS_PAGE_SIZE};
use kindred_shared::dto::{
    CreateCommentRequest, CreatePostRequest, LikeToggleResponse, MediaUploadResponse, PageQuery,
    SaveToggleResponse,
};

use super::uploads::read_upload;
use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let draft = PostDraft::new(&req.content, req.tags, req.media_url, req.media_type.as_deref())?;
    let item = state.posts.create_post(identity.actor(), draft).await?;

    Ok(HttpResponse::Created().json(views::post(item)))
}

/// GET /api/posts?page=&limit=
pub async fn feed(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.limit, FEED_PAGE_SIZE);
    let page = state.posts.get_feed(identity.actor(), request).await?;
    Ok(HttpResponse::Ok().json(views::page(page, views::post)))
}

/// GET /api/posts/me
pub async fn my_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let request = PageRequest::new(query.page, query.limit, USER_POSTS_PAGE_SIZE);
    let page = state
        .posts
        .get_user_posts(actor.user_id, actor, request)
        .await?;
    Ok(HttpResponse::Ok().json(views::page(page, views::post)))
}

/// GET /api/posts/saved
pub async fn saved_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.limit, FEED_PAGE_SIZE);
    let page = state.posts.get_saved_posts(identity.actor(), request).await?;
    Ok(HttpResponse::Ok().json(views::page(page, views::post)))
}

/// GET /api/posts/user/{user_id}
pub async fn user_posts(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.limit, USER_POSTS_PAGE_SIZE);
    let page = state
        .posts
        .get_user_posts(path.into_inner(), identity.actor(), request)
        .await?;
    Ok(HttpResponse::Ok().json(views::page(page, views::post)))
}

/// POST /api/posts/media
pub async fn upload_media(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let upload = read_upload(payload, POST_MEDIA_POLICY.max_bytes()).await?;
    let stored = state.posts.upload_media(identity.actor(), upload).await?;

    Ok(HttpResponse::Created().json(MediaUploadResponse {
        url: stored.url,
        media_type: stored.media_type.to_string(),
    }))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let item = state.posts.get_post(identity.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::post(item)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_post(identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let toggle = state
        .posts
        .toggle_like(identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(LikeToggleResponse {
        liked: toggle.liked,
        likes_count: toggle.likes_count,
    }))
}

/// POST /api/posts/{id}/save
pub async fn toggle_save(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let saved = state
        .posts
        .toggle_save(identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SaveToggleResponse { saved }))
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.limit, COMMENTS_PAGE_SIZE);
    let page = state
        .posts
        .list_comments(path.into_inner(), request)
        .await?;
    Ok(HttpResponse::Ok().json(views::page(page, views::comment)))
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let comment = state
        .posts
        .add_comment(identity.actor(), path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Created().json(views::comment(comment)))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_comment(identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
