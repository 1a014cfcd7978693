//! # mista: Tech Mista Marketplace Backend
//!
//! `mista` is the backend for Tech Mista, a marketplace that connects
//! technology solution providers with solution seekers. It exposes a RESTful
//! API for user and session management, a public directory of vetted
//! providers and their solutions, a partner application intake with admin
//! review, and a contact-request workflow through which seekers reach
//! providers (including file attachments and per-provider inboxes).
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via `sqlx`) for all persistence.
//! Authentication is session-based: a successful login sets an HttpOnly
//! cookie carrying a signed JWT, which the extractors in [`auth`] resolve to
//! a fresh user record on every request.
//!
//! The **API layer** ([`api`]) serves everything under `/api/*`, with
//! interactive documentation at `/api/docs`. The **database layer** ([`db`])
//! uses the repository pattern: each entity has a repository struct wrapping
//! a connection, with typed request/response models. Attachments go through
//! the [`storage`] abstraction (local filesystem or S3), and outbound mail
//! through [`email`] (SMTP or file transport).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use mista::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = mista::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     mista::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
mod openapi;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password,
    config::{CorsOrigin, StorageConfig},
    db::handlers::{Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    email::EmailService,
    openapi::ApiDoc,
    storage::FileStorage,
};
use axum::{
    extract::DefaultBodyLimit,
    http,
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{ApplicationId, ContactRequestId, ProviderId, SolutionId, TokenId, UserId};

/// Application state shared across all request handlers.
///
/// Holds the database pool, loaded configuration, and the email and
/// attachment-storage services.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub email: Arc<EmailService>,
    pub storage: Arc<dyn FileStorage>,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: creates the admin on first startup, or updates the password
/// on subsequent startups when one is configured. The admin signs in with
/// their email address as the username.
///
/// Returns `None` when no user exists and no password was configured, since
/// an admin without credentials could never log in.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let password_hash = password.map(password::hash_string).transpose()?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            user_repo
                .update(
                    existing_user.id,
                    &UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    },
                )
                .await?;
        }
        tx.commit().await?;
        return Ok(Some(existing_user.id));
    }

    let Some(password_hash) = password_hash else {
        tracing::warn!("No admin user exists and admin_password is not configured; skipping admin creation");
        return Ok(None);
    };

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            password_hash,
            display_name: None,
            role: Role::Admin,
        })
        .await?;

    tx.commit().await?;
    info!("Created initial admin user {}", created_user.email);
    Ok(Some(created_user.id))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([http::header::CONTENT_TYPE])
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with authentication routes, the
/// marketplace API, attachment serving for the local storage backend, API
/// docs, CORS, and tracing middleware.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Contact-request intake accepts multipart uploads; everything else uses
    // the default body limit
    let upload_body_limit = (state.config.uploads.max_upload_size as usize)
        .saturating_mul(state.config.uploads.max_files_per_request)
        .saturating_add(64 * 1024);

    let api_routes = Router::new()
        // Authentication and sessions
        .route("/register", post(api::handlers::auth::register))
        .route("/login", post(api::handlers::auth::login))
        .route("/logout", post(api::handlers::auth::logout))
        .route("/user", get(api::handlers::auth::current_user))
        .route("/password-resets", post(api::handlers::auth::request_password_reset))
        .route("/password-resets/{token_id}/confirm", post(api::handlers::auth::confirm_password_reset))
        // User management (admin)
        .route("/users", get(api::handlers::users::list_users))
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route("/users/{id}", patch(api::handlers::users::update_user))
        // Provider directory
        .route("/solution-providers", get(api::handlers::providers::list_providers))
        .route("/solution-providers", post(api::handlers::providers::create_provider))
        .route("/solution-providers/{id}", get(api::handlers::providers::get_provider))
        .route("/solution-providers/{id}", patch(api::handlers::providers::update_provider))
        .route("/solution-providers/{id}", delete(api::handlers::providers::delete_provider))
        // Solution catalog
        .route("/solutions", get(api::handlers::solutions::list_solutions))
        .route("/solutions", post(api::handlers::solutions::create_solution))
        .route("/solutions/{id}", get(api::handlers::solutions::get_solution))
        .route("/solutions/{id}", delete(api::handlers::solutions::delete_solution))
        // Partner applications
        .route("/partner-applications", post(api::handlers::partner_applications::create_application))
        .route("/partner-applications", get(api::handlers::partner_applications::list_applications))
        .route("/partner-applications/{id}", get(api::handlers::partner_applications::get_application))
        .route("/partner-applications/{id}", patch(api::handlers::partner_applications::review_application))
        // Contact requests
        .route(
            "/contact-requests",
            post(api::handlers::contact_requests::create_contact_request).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/contact-requests", get(api::handlers::contact_requests::list_contact_requests))
        .route("/contact-requests/check", get(api::handlers::contact_requests::check_pending))
        .route("/contact-requests/unread-count", get(api::handlers::contact_requests::unread_count))
        .route("/contact-requests/{id}", get(api::handlers::contact_requests::get_contact_request))
        .route("/contact-requests/{id}", patch(api::handlers::contact_requests::update_contact_request))
        .route("/contact-requests/{id}", delete(api::handlers::contact_requests::delete_contact_request))
        .route("/contact-requests/{id}/read", post(api::handlers::contact_requests::mark_read))
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", ApiDoc::openapi()));

    // Local storage serves uploads straight off disk; S3 serves its own URLs
    if let StorageConfig::Local { path, .. } = &state.config.storage {
        router = router.nest_service("/uploads", ServeDir::new(path));
    }

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, seeds the initial admin user, and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting marketplace backend with configuration: {:#?}", config);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.pool.max_connections)
            .min_connections(config.database.pool.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.database.pool.acquire_timeout_secs))
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool).await?;

        let email = Arc::new(EmailService::new(&config)?);
        let storage = storage::from_config(&config).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .email(email)
            .storage(storage)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Tech Mista listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
