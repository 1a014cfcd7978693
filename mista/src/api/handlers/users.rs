use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::users::{ListUsersQuery, Role, UserCreate, UserResponse, UserUpdate},
    auth::{password, AdminUser},
    db::{
        handlers::{users::Users, Repository},
        models::users::{UserCreateDBRequest, UserFilter, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::UserId,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let (skip, limit) = query.pagination.params();
    let users = repo
        .list(&UserFilter {
            role: query.role,
            skip,
            limit,
        })
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = String, Path, format = "uuid", description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn get_user(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Admin user creation, used for agent and provider accounts that cannot
/// self-register.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let password_config = &state.config.auth.native.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    super::auth::validate_new_user_input(&request.username, &request.email)?;

    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let created = repo
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            password_hash,
            display_name: request.name,
            role: request.role,
        })
        .await?;

    // New agents get their credentials by email; failure to send is logged,
    // not fatal
    if created.role == Role::Agent {
        if let Err(e) = state
            .email
            .send_agent_welcome_email(&created.email, created.display_name.as_deref(), &created.username)
            .await
        {
            tracing::warn!("Failed to send agent welcome email to {}: {e}", created.email);
        }
    }

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

/// Admin update: rename, role change, or deactivation. Users are never
/// hard-deleted.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = String, Path, format = "uuid", description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<UserId>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    if repo.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    let updated = repo
        .update(
            id,
            &UserUpdateDBRequest {
                display_name: request.name,
                role: request.role,
                is_active: request.is_active,
                password_hash: None,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
