//! Authentication handlers.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};
use validator::Validate;

use kindred_core::services::{REGISTER_MESSAGE, RESET_PASSWORD_MESSAGE};
use kindred_shared::dto::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, VerifyEmailQuery,
};

use super::views;
use crate::config::CookieConfig;
use crate::middleware::auth::{Identity, SESSION_COOKIE};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn session_cookie(token: String, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure)
        .max_age(Duration::seconds(config.max_age_secs))
        .finish()
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    state.auth.register(&req.name, &req.email, &req.password).await?;

    Ok(HttpResponse::Created().json(MessageResponse::new(REGISTER_MESSAGE)))
}

/// GET /api/auth/verify-email?token=
pub async fn verify_email(
    state: web::Data<AppState>,
    query: web::Query<VerifyEmailQuery>,
) -> AppResult<HttpResponse> {
    let outcome = state.auth.verify_email(&query.token).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(outcome.message())))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let message = state.auth.resend_verification(&body.email).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// POST /api/auth/login
///
/// Sets the session cookie and also returns the token for bearer clients.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let session = state.auth.login(&req.email, &req.password).await?;
    let cookie = session_cookie(session.token.clone(), &state.cookie);

    Ok(HttpResponse::Ok().cookie(cookie).json(AuthResponse {
        access_token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        user: views::user(session.user),
    }))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.auth.current_user(identity.actor()).await?;
    Ok(HttpResponse::Ok().json(views::user(user)))
}

/// POST /api/auth/logout
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    let mut cookie = session_cookie(String::new(), &state.cookie);
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("Logged out"))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let message = state.auth.forgot_password(&body.email).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    state.auth.reset_password(&req.token, &req.new_password).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(RESET_PASSWORD_MESSAGE)))
}
