//! Profile reads and edits.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{AVATAR_POLICY, Actor, ProfileUpdate, Upload, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{ObjectStorage, StorageError, UserRepository};

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    avatars: Arc<dyn ObjectStorage>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, avatars: Arc<dyn ObjectStorage>) -> Self {
        Self { users, avatars }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        patch: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut user = self.get_profile(actor.user_id).await?;

        if let Some(Some(alias)) = patch.normalized_alias()? {
            if let Some(holder) = self.users.find_by_alias(&alias).await? {
                if holder.id != user.id {
                    return Err(DomainError::Duplicate("Alias already taken".to_string()));
                }
            }
        }

        patch.apply_to(&mut user)?;
        let user = self.users.update(user).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::Duplicate("Alias already taken".to_string()),
            other => other.into(),
        })?;
        info!(user_id = %user.id, "Profile updated");

        Ok(user)
    }

    /// Store a new avatar image and point the profile at it.
    ///
    /// The previous avatar object is removed best effort.
    pub async fn update_avatar(&self, actor: &Actor, upload: Upload) -> Result<User, DomainError> {
        let rule = AVATAR_POLICY.check(&upload)?;
        let mut user = self.get_profile(actor.user_id).await?;

        let key = format!(
            "avatars/{}-{}.{}",
            user.id,
            Uuid::new_v4().simple(),
            rule.extension
        );
        let url = self.avatars.put(&key, upload.bytes, rule.mime).await?;

        let previous = user.avatar_url.replace(url);
        user.touch();
        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "Avatar updated");

        if let Some(old) = previous {
            match self.avatars.delete(&old).await {
                Ok(()) => {}
                Err(StorageError::ForeignUrl(_)) => {
                    debug!(user_id = %user.id, "Previous avatar is not ours to delete")
                }
                Err(e) => warn!(user_id = %user.id, error = %e, "Failed to delete previous avatar"),
            }
        }

        Ok(user)
    }
}
