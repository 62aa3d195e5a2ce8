//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    #[sea_orm(unique)]
    pub alias: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub posts_count: i32,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTimeWithTimeZone>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain User.
impl From<Model> for kindred_core::domain::User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            is_verified: model.is_verified,
            alias: model.alias,
            bio: model.bio,
            website: model.website,
            avatar_url: model.avatar_url,
            posts_count: model.posts_count,
            verification_token: model.verification_token,
            verification_token_expires_at: model.verification_token_expires_at.map(Into::into),
            reset_token: model.reset_token,
            reset_token_expires_at: model.reset_token_expires_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain User to SeaORM ActiveModel.
impl From<kindred_core::domain::User> for ActiveModel {
    fn from(user: kindred_core::domain::User) -> Self {
        Self {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            is_verified: Set(user.is_verified),
            alias: Set(user.alias),
            bio: Set(user.bio),
            website: Set(user.website),
            avatar_url: Set(user.avatar_url),
            posts_count: Set(user.posts_count),
            verification_token: Set(user.verification_token),
            verification_token_expires_at: Set(user.verification_token_expires_at.map(Into::into)),
            reset_token: Set(user.reset_token),
            reset_token_expires_at: Set(user.reset_token_expires_at.map(Into::into)),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
