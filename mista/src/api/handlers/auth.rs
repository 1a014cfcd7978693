use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::{
        auth::{
            AuthResponse, LoginRequest, LoginResponse, LogoutResponse, MessageResponse, PasswordResetConfirmRequest,
            PasswordResetRequest, RegisterRequest, RegisterResponse,
        },
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{PasswordResetTokens, Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::TokenId,
    AppState,
};

/// Register a new solution seeker account
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<RegisterResponse> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    if !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    validate_password_length(&request.password, &state.config)?;
    validate_new_user_input(&request.username, &request.email)?;

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Self-registration always produces a seeker; other roles are admin-assigned
    let created_user = user_repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            display_name: request.name,
            role: Role::SolutionSeeker,
        })
        .await?;

    // Welcome email is best-effort; registration has already succeeded
    if let Err(e) = state
        .email
        .send_seeker_welcome_email(&created_user.email, created_user.display_name.as_deref())
        .await
    {
        tracing::warn!("Failed to send welcome email to {}: {e}", created_user.email);
    }

    let user_response = UserResponse::from(created_user.clone());
    let current_user = CurrentUser::from(created_user);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(RegisterResponse {
        auth_response: AuthResponse {
            user: user_response,
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Admin login requested for non-admin account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Uniform rejection for unknown users, deactivated users, and bad
    // passwords, so the response does not reveal which one it was.
    let invalid_credentials = || Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    };

    let user = user_repo
        .get_user_by_username(&request.username)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid_credentials)?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    // The admin login form asserts isAdmin; a correctly-authenticated
    // non-admin still gets no session cookie out of it.
    if request.is_admin.unwrap_or(false) && user.role != Role::Admin {
        return Err(Error::InsufficientRole {
            required: Role::Admin,
            resource: "admin login".to_string(),
        });
    }

    let user_response = UserResponse::from(user.clone());
    let current_user = CurrentUser::from(user);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: user_response,
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout (clear session cookie)
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse> {
    let cookie = create_logout_cookie(&state.config);

    Ok(LogoutResponse {
        message: MessageResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

/// Get the authenticated caller's identity
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Not authenticated"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn current_user(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/password-resets",
    request_body = PasswordResetRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    // Same response whether or not the account exists, to avoid email
    // enumeration.
    let user = {
        let mut user_repo = Users::new(&mut tx);
        user_repo.get_user_by_email(&request.email).await?
    };

    if let Some(user) = user.filter(|u| u.is_active) {
        let mut token_repo = PasswordResetTokens::new(&mut tx);
        let (raw_token, token) = token_repo.create_for_user(user.id, &state.config).await?;

        state
            .email
            .send_password_reset_email(&user.email, user.display_name.as_deref(), &token.id, &raw_token)
            .await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent.".to_string(),
    }))
}

/// Confirm a password reset with the emailed token
#[utoipa::path(
    post,
    path = "/api/password-resets/{token_id}/confirm",
    request_body = PasswordResetConfirmRequest,
    tag = "authentication",
    params(("token_id" = String, Path, format = "uuid", description = "Reset token ID from the emailed link")),
    responses(
        (status = 200, description = "Password reset successful", body = MessageResponse),
        (status = 400, description = "Invalid or expired token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Path(token_id): Path<TokenId>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }

    validate_password_length(&request.new_password, &state.config)?;

    let invalid_token = || Error::BadRequest {
        message: "Invalid or expired reset token".to_string(),
    };

    // Hash before opening the transaction; argon2 is the slow part
    let new_password_hash = tokio::task::spawn_blocking({
        let password = request.new_password.clone();
        move || password::hash_string(&password)
    })
    .await
    .map_err(|e| Error::Internal {
        operation: format!("spawn password hashing task: {e}"),
    })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let token = {
        let mut token_repo = PasswordResetTokens::new(&mut tx);
        let token = token_repo
            .find_valid_token_by_id(token_id, &request.token)
            .await?
            .ok_or_else(invalid_token)?;

        // Conditional update; a concurrent double-submit loses here
        if !token_repo.consume(token.id).await? {
            return Err(invalid_token());
        }
        token
    };

    {
        let mut user_repo = Users::new(&mut tx);
        user_repo
            .update(
                token.user_id,
                &UserUpdateDBRequest {
                    password_hash: Some(new_password_hash),
                    ..Default::default()
                },
            )
            .await?;
    }

    {
        // Any other outstanding tokens die with this one
        let mut token_repo = PasswordResetTokens::new(&mut tx);
        token_repo.invalidate_for_user(token.user_id).await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".to_string(),
    }))
}

const MIN_USERNAME_LENGTH: usize = 3;

/// Shape checks shared by self-registration and admin user creation. The
/// schema only enforces uniqueness, so malformed values would otherwise land
/// in the database and break email delivery later.
pub(crate) fn validate_new_user_input(username: &str, email: &str) -> Result<()> {
    if username.trim().len() < MIN_USERNAME_LENGTH {
        return Err(Error::BadRequest {
            message: format!("Username must be at least {MIN_USERNAME_LENGTH} characters"),
        });
    }
    if email.parse::<lettre::Address>().is_err() {
        return Err(Error::BadRequest {
            message: "Invalid email address".to_string(),
        });
    }
    Ok(())
}

fn validate_password_length(password: &str, config: &crate::config::Config) -> Result<()> {
    let password_config = &config.auth.native.password;
    if password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

/// Build the session cookie from the verified token
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = session_config.timeout.as_secs();

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_same_site, max_age
    );
    if session_config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Deletion cookie: same attributes as the session cookie so the browser
/// matches and drops it, empty value, Max-Age=0
fn create_logout_cookie(config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;

    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        session_config.cookie_name, session_config.cookie_same_site
    );
    if session_config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_user, login_session};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_sets_cookie_and_seeker_role(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "newseeker",
                "password": "a-long-password",
                "email": "newseeker@example.com",
                "name": "New Seeker"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["user"]["username"], "newseeker");
        assert_eq!(body["user"]["role"], "solution_seeker");
        assert!(response.headers().contains_key("set-cookie"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_username_conflicts(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "taken", "a-long-password", crate::api::models::users::Role::SolutionSeeker).await;

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "taken",
                "password": "a-long-password",
                "email": "other@example.com"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_short_password_rejected(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/register")
            .json(&json!({
                "username": "shorty",
                "password": "short",
                "email": "shorty@example.com"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_malformed_username_and_email(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        // Empty username never reaches the database
        server
            .post("/api/register")
            .json(&json!({
                "username": "",
                "password": "a-long-password",
                "email": "fine@example.com"
            }))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);

        // Unparseable email would break every mail sent to this user later
        server
            .post("/api/register")
            .json(&json!({
                "username": "wellformed",
                "password": "a-long-password",
                "email": "not-an-email"
            }))
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);

        // Neither attempt left a row behind
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        assert!(repo.get_user_by_email("not-an-email").await.unwrap().is_none());
        assert!(repo.get_user_by_username("wellformed").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_clears_session(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "leaver", "a-long-password", crate::api::models::users::Role::SolutionSeeker).await;
        login_session(&server, "leaver", "a-long-password").await;
        server.get("/api/user").await.assert_status_ok();

        let response = server.post("/api/logout").await;
        response.assert_status_ok();

        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("mista_session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
        // Test config runs over plain http; a Secure deletion cookie would be
        // ignored by the browser and the session would survive logout
        assert!(!set_cookie.contains("Secure"));

        server.get("/api/user").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_wrong_password_is_uniform(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "louise", "correct-password", crate::api::models::users::Role::SolutionSeeker).await;

        let wrong_password = server
            .post("/api/login")
            .json(&json!({"username": "louise", "password": "wrong-password"}))
            .await;
        let unknown_user = server
            .post("/api/login")
            .json(&json!({"username": "nobody", "password": "wrong-password"}))
            .await;

        wrong_password.assert_status(axum::http::StatusCode::UNAUTHORIZED);
        unknown_user.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        // Identical bodies: no way to tell a bad password from a bad username
        let a: serde_json::Value = wrong_password.json();
        let b: serde_json::Value = unknown_user.json();
        assert_eq!(a, b);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_deactivated_user_rejected(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_user(&pool, "ghost", "a-long-password", crate::api::models::users::Role::SolutionSeeker).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        repo.update(
            user.id,
            &UserUpdateDBRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let response = server
            .post("/api/login")
            .json(&json!({"username": "ghost", "password": "a-long-password"}))
            .await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_login_flag_rejects_non_admin(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "plain", "a-long-password", crate::api::models::users::Role::SolutionSeeker).await;

        let response = server
            .post("/api/login")
            .json(&json!({"username": "plain", "password": "a-long-password", "isAdmin": true}))
            .await;

        // Correct credentials, wrong role: forbidden and no session cookie
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key("set-cookie"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_login_flag_allows_admin(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "boss", "a-long-password", crate::api::models::users::Role::Admin).await;

        let response = server
            .post("/api/login")
            .json(&json!({"username": "boss", "password": "a-long-password", "isAdmin": true}))
            .await;

        response.assert_status_ok();
        assert!(response.headers().contains_key("set-cookie"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_roundtrip(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "whoami", "a-long-password", crate::api::models::users::Role::Agent).await;
        login_session(&server, "whoami", "a-long-password").await;

        let response = server.get("/api/user").await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "whoami");
        assert_eq!(body["role"], "agent");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_requires_session(pool: PgPool) {
        let server = create_test_app(pool).await;
        let response = server.get("/api/user").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_password_reset_request_is_generic(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "resetme", "a-long-password", crate::api::models::users::Role::SolutionSeeker).await;

        let known = server
            .post("/api/password-resets")
            .json(&json!({"email": "resetme@example.com"}))
            .await;
        let unknown = server
            .post("/api/password-resets")
            .json(&json!({"email": "stranger@example.com"}))
            .await;

        known.assert_status_ok();
        unknown.assert_status_ok();
        let a: serde_json::Value = known.json();
        let b: serde_json::Value = unknown.json();
        assert_eq!(a, b);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_password_reset_confirm_flow(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_user(&pool, "amnesiac", "old-password-123", crate::api::models::users::Role::SolutionSeeker).await;

        // Mint the token directly; the emailed link carries id + raw token
        let config = crate::test_utils::create_test_config();
        let mut conn = pool.acquire().await.unwrap();
        let (raw_token, token) = {
            let mut repo = PasswordResetTokens::new(&mut conn);
            repo.create_for_user(user.id, &config).await.unwrap()
        };
        drop(conn);

        let response = server
            .post(&format!("/api/password-resets/{}/confirm", token.id))
            .json(&json!({
                "token": raw_token,
                "newPassword": "brand-new-password"
            }))
            .await;
        response.assert_status_ok();

        // Old password dead, new password works
        server
            .post("/api/login")
            .json(&json!({"username": "amnesiac", "password": "old-password-123"}))
            .await
            .assert_status(axum::http::StatusCode::UNAUTHORIZED);
        server
            .post("/api/login")
            .json(&json!({"username": "amnesiac", "password": "brand-new-password"}))
            .await
            .assert_status_ok();

        // Token is single-use
        let replay = server
            .post(&format!("/api/password-resets/{}/confirm", token.id))
            .json(&json!({
                "token": raw_token,
                "newPassword": "yet-another-password"
            }))
            .await;
        replay.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_password_reset_confirm_bad_token(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let user = create_user(&pool, "careful", "old-password-123", crate::api::models::users::Role::SolutionSeeker).await;

        let config = crate::test_utils::create_test_config();
        let mut conn = pool.acquire().await.unwrap();
        let (_raw_token, token) = {
            let mut repo = PasswordResetTokens::new(&mut conn);
            repo.create_for_user(user.id, &config).await.unwrap()
        };
        drop(conn);

        let response = server
            .post(&format!("/api/password-resets/{}/confirm", token.id))
            .json(&json!({
                "token": "not-the-right-token",
                "newPassword": "brand-new-password"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}
