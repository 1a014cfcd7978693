//! Test utilities for integration testing.

use crate::{
    api::models::users::Role,
    auth::password::{self, Argon2Params},
    config::{Config, EmailTransportConfig, StorageConfig},
    db::{
        handlers::{providers::Providers, Repository, Users},
        models::{
            providers::{ProviderCreateDBRequest, ProviderDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    email::EmailService,
    storage::FileStorage,
    types::UserId,
    AppState,
};
use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;

/// Fast argon2 parameters so hashing doesn't dominate test time
pub fn test_argon2_params() -> Argon2Params {
    Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn create_test_config() -> Config {
    // Leaked on purpose: the directories must outlive the returned config
    let email_dir = tempfile::tempdir().expect("Failed to create email dir").keep();
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir").keep();

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };

    config.auth.native.session.cookie_secure = false;
    config.auth.native.password.argon2_memory_kib = 1024;
    config.auth.native.password.argon2_iterations = 1;

    config.email.transport = EmailTransportConfig::File {
        path: email_dir.to_string_lossy().to_string(),
    };
    config.storage = StorageConfig::Local {
        path: upload_dir.to_string_lossy().to_string(),
        public_base_url: None,
    };

    // Small cap so oversize-attachment behavior is cheap to exercise
    config.uploads.max_upload_size = 1024;

    config
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();
    let storage = crate::storage::from_config(&config).await.expect("Failed to create storage backend");
    create_test_app_with_storage(pool, storage).await
}

/// Like [`create_test_app`] but with a caller-supplied storage backend, for
/// tests that need to provoke storage failures
pub async fn create_test_app_with_storage(pool: PgPool, storage: Arc<dyn FileStorage>) -> TestServer {
    let config = create_test_config();

    let email = Arc::new(EmailService::new(&config).expect("Failed to create email service"));

    let state = AppState::builder()
        .db(pool)
        .config(config)
        .email(email)
        .storage(storage)
        .build();

    let router = crate::build_router(&state).expect("Failed to build router");

    let mut server = TestServer::new(router).expect("Failed to create test server");
    server.save_cookies();
    server
}

/// Create a user directly in the database.
///
/// The email is derived from the username and the display name is left unset,
/// so anything rendering the user's name falls back to the username.
pub async fn create_user(pool: &PgPool, username: &str, password: &str, role: Role) -> UserDBResponse {
    let password_hash = password::hash_string_with_params(password, Some(test_argon2_params())).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    users_repo
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash,
            display_name: None,
            role,
        })
        .await
        .expect("Failed to create test user")
}

/// Create an approved provider directly in the database, optionally owned by
/// a user with the `solution_provider` role.
pub async fn create_provider(pool: &PgPool, name: &str, user_id: Option<UserId>) -> ProviderDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut providers_repo = Providers::new(&mut conn);

    providers_repo
        .create(&ProviderCreateDBRequest {
            name: name.to_string(),
            description: format!("{name} test provider"),
            contact_email: format!("{name}@example.com"),
            contact_phone: None,
            website: None,
            logo_url: None,
            regions: vec![],
            verification_status: crate::api::models::providers::VerificationStatus::Approved,
            application_id: None,
            user_id,
        })
        .await
        .expect("Failed to create test provider")
}

/// Log in through the API so the server's cookie jar holds a session
pub async fn login_session(server: &TestServer, username: &str, password: &str) {
    let response = server
        .post("/api/login")
        .json(&serde_json::json!({"username": username, "password": password}))
        .await;
    response.assert_status_ok();
}
