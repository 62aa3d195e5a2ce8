//! SeaORM entities.

pub mod comment;
pub mod post;
pub mod post_like;
pub mod saved_post;
pub mod user;
