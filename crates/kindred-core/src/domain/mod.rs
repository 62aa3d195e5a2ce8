//! Domain entities - the core business objects.

mod actor;
mod comment;
mod feed;
mod media;
mod post;
mod profile;
mod token;
mod user;

pub use actor::Actor;
pub use comment::{Comment, MAX_COMMENT_LENGTH};
pub use feed::{Author, CommentWithAuthor, FeedItem, LikeToggle, Page, PageRequest, PostWithAuthor};
pub use media::{AVATAR_POLICY, MediaKind, POST_MEDIA_POLICY, Upload, UploadPolicy, UploadRule};
pub use post::{MAX_POST_LENGTH, MAX_TAGS, Post, PostDraft};
pub use profile::ProfileUpdate;
pub use token::OneTimeToken;
pub use user::{User, masked_email, normalize_email};
