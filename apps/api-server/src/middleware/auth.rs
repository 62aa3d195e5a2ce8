//! Authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::StatusCode, http::header};
use std::future::{Ready, ready};
use std::sync::Arc;

use kindred_core::domain::Actor;
use kindred_core::ports::{AuthError, TokenService};
use kindred_shared::ErrorResponse;

use super::error::problem;

/// Name of the session cookie set on login.
pub const SESSION_COOKIE: &str = "access_token";

/// Authenticated user identity extractor.
///
/// The session token is read from `Authorization: Bearer <token>` or, when
/// that header is absent, from the session cookie. Use this in handlers to
/// require authentication:
/// ```ignore
/// async fn protected_route(Identity(actor): Identity) -> impl Responder {
///     format!("Hello, user {}!", actor.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

impl Identity {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

/// Error type for authentication failures.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationError(pub AuthError);

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your session has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail(
                    "Please login, or provide a valid Bearer token in the Authorization header.",
                ),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized("Invalid credentials"),
            AuthError::HashingError(_) => ErrorResponse::internal_error(),
        };

        problem(self.status_code(), error)
    }
}

/// Pull the raw session token out of a request.
fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let auth_str = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
        return auth_str
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()));
    }

    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingAuth)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token_service = match req.app_data::<actix_web::web::Data<Arc<dyn TokenService>>>() {
            Some(service) => service,
            None => {
                tracing::error!("TokenService not found in app data");
                return ready(Err(AuthenticationError(AuthError::InvalidToken(
                    "Server configuration error".to_string(),
                ))));
            }
        };

        let token = match session_token(req) {
            Ok(token) => token,
            Err(e) => return ready(Err(AuthenticationError(e))),
        };

        match token_service.validate_token(&token) {
            Ok(claims) => ready(Ok(Identity(Actor::new(claims.user_id, claims.email)))),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                ready(Err(AuthenticationError(e)))
            }
        }
    }
}
