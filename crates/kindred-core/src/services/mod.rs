//! Application services - orchestrate ports to implement each use case.

mod auth;
mod posts;
mod profile;

pub use auth::{
    AuthService, AuthSettings, FORGOT_PASSWORD_MESSAGE, MIN_PASSWORD_LENGTH, REGISTER_MESSAGE,
    RESEND_VERIFICATION_MESSAGE, RESET_PASSWORD_MESSAGE, Session, VerifyOutcome,
};
pub use posts::{COMMENTS_PAGE_SIZE, FEED_PAGE_SIZE, PostService, StoredMedia, USER_POSTS_PAGE_SIZE};
pub use profile::ProfileService;
