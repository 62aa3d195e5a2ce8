#![allow(dead_code)]

use std::sync::Arc;

use kindred_core::domain::{Actor, User};
use kindred_core::ports::PasswordService;
use kindred_core::services::{AuthService, AuthSettings, PostService, ProfileService};
use kindred_infra::{
    Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService, MailKind,
    MemoryObjectStorage, RecordingMailer,
};

pub const PASSWORD: &str = "correct horse battery";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub media: Arc<MemoryObjectStorage>,
    pub auth: AuthService,
    pub posts: PostService,
    pub profiles: ProfileService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(AuthSettings::default(), RecordingMailer::new())
    }

    pub fn with(settings: AuthSettings, mailer: RecordingMailer) -> Self {
        // Cheap parameters keep the suite fast.
        let passwords = Arc::new(Argon2PasswordService::with_params(4096, 1, 1).unwrap());
        Self::build(settings, mailer, passwords)
    }

    pub fn with_passwords(passwords: Arc<dyn PasswordService>) -> Self {
        Self::build(AuthSettings::default(), RecordingMailer::new(), passwords)
    }

    fn build(
        settings: AuthSettings,
        mailer: RecordingMailer,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(mailer);
        let media = Arc::new(MemoryObjectStorage::new());
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "integration-secret".to_string(),
            ..JwtConfig::default()
        }));

        Self {
            auth: AuthService::new(
                store.clone(),
                passwords,
                tokens,
                mailer.clone(),
                settings,
            ),
            posts: PostService::new(store.clone(), store.clone(), media.clone()),
            profiles: ProfileService::new(store.clone(), media.clone()),
            store,
            mailer,
            media,
        }
    }

    /// Register, verify and return the account as an actor.
    pub async fn verified_user(&self, name: &str, email: &str) -> (User, Actor) {
        self.auth.register(name, email, PASSWORD).await.unwrap();
        let token = self
            .mailer
            .last_token_for(email, MailKind::Verification)
            .await
            .unwrap();
        self.auth.verify_email(&token).await.unwrap();

        let session = self.auth.login(email, PASSWORD).await.unwrap();
        let actor = Actor::new(session.user.id, session.user.email.clone());
        (session.user, actor)
    }
}
