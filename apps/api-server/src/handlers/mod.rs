//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod profile;
mod uploads;
mod views;

use actix_web::{error, web};

use crate::middleware::error::AppError;
use crate::state::AppState;

#[cfg(feature = "rate-limit")]
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Register shared state, extractor error handlers and every route.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .app_data(web::Data::new(state.tokens.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::BadRequest(err.to_string()))
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::BadRequest(err.to_string()))
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            error::Error::from(AppError::BadRequest(err.to_string()))
        }));

    configure_routes(cfg, state);
}

/// Configure all application routes.
///
/// Literal post paths are registered before `/posts/{id}` so they are not
/// captured by the id pattern.
fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let auth_scope = web::scope("/auth")
        .route("/register", web::post().to(auth::register))
        .route("/verify-email", web::get().to(auth::verify_email))
        .route(
            "/resend-verification",
            web::post().to(auth::resend_verification),
        )
        .route("/login", web::post().to(auth::login))
        .route("/me", web::get().to(auth::me))
        .route("/logout", web::post().to(auth::logout))
        .route("/forgot-password", web::post().to(auth::forgot_password))
        .route("/reset-password", web::post().to(auth::reset_password));

    #[cfg(feature = "rate-limit")]
    let auth_scope = auth_scope.wrap(RateLimitMiddleware::new(state.auth_limiter.clone()));
    #[cfg(not(feature = "rate-limit"))]
    let _ = state;

    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .service(auth_scope)
            .service(
                web::scope("/posts")
                    .route("", web::post().to(posts::create_post))
                    .route("", web::get().to(posts::feed))
                    .route("/me", web::get().to(posts::my_posts))
                    .route("/saved", web::get().to(posts::saved_posts))
                    .route("/user/{user_id}", web::get().to(posts::user_posts))
                    .route("/media", web::post().to(posts::upload_media))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/like", web::post().to(posts::toggle_like))
                    .route("/{id}/save", web::post().to(posts::toggle_save))
                    .route("/{id}/comments", web::get().to(posts::list_comments))
                    .route("/{id}/comments", web::post().to(posts::add_comment)),
            )
            .route("/comments/{id}", web::delete().to(posts::delete_comment))
            .service(
                web::scope("/profile")
                    .route("/me", web::get().to(profile::my_profile))
                    .route("/me", web::patch().to(profile::update_profile))
                    .route("/avatar", web::post().to(profile::update_avatar))
                    .route("/{user_id}", web::get().to(profile::public_profile)),
            ),
    )
    .route("/uploads/{path:.*}", web::get().to(uploads::serve_upload));
}
