use uuid::Uuid;

/// The authenticated user a service call acts on behalf of.
///
/// Produced from a validated session token at the HTTP edge and passed
/// explicitly into every operation that needs to know who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
}

impl Actor {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Whether this actor owns a resource created by `owner_id`.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}
