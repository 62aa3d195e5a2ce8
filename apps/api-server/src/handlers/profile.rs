//! Profile handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use kindred_core::domain::{AVATAR_POLICY, ProfileUpdate};
use kindred_shared::dto::UpdateProfileRequest;

use super::uploads::read_upload;
use super::views;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/profile/me
pub async fn my_profile(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let user = state.profiles.get_profile(identity.actor().user_id).await?;
    Ok(HttpResponse::Ok().json(views::user(user)))
}

/// PATCH /api/profile/me
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let patch = ProfileUpdate {
        name: req.name,
        alias: req.alias,
        bio: req.bio,
        website: req.website,
    };
    let user = state.profiles.update_profile(identity.actor(), patch).await?;
    Ok(HttpResponse::Ok().json(views::user(user)))
}

/// POST /api/profile/avatar
pub async fn update_avatar(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let upload = read_upload(payload, AVATAR_POLICY.max_bytes()).await?;
    let user = state.profiles.update_avatar(identity.actor(), upload).await?;
    Ok(HttpResponse::Ok().json(views::user(user)))
}

/// GET /api/profile/{user_id}
pub async fn public_profile(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.profiles.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::profile(user)))
}
