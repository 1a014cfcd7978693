use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        providers::{ListProvidersQuery, ProviderCreate, ProviderResponse, ProviderUpdate, VerificationStatus},
        users::{CurrentUser, Role},
    },
    auth::AdminUser,
    db::{
        handlers::{providers::Providers, Repository},
        models::providers::{ProviderFilter, ProviderUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ProviderId,
    AppState,
};

/// Public provider directory. Only admins can see unapproved providers.
#[utoipa::path(
    get,
    path = "/api/solution-providers",
    tag = "providers",
    summary = "List solution providers",
    params(ListProvidersQuery),
    responses(
        (status = 200, description = "List of providers", body = Vec<ProviderResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_providers(
    State(state): State<AppState>,
    caller: Option<CurrentUser>,
    Query(query): Query<ListProvidersQuery>,
) -> Result<Json<Vec<ProviderResponse>>> {
    let is_admin = caller.map(|user| user.role == Role::Admin).unwrap_or(false);

    let (skip, limit) = query.pagination.params();
    let status = if is_admin {
        query.status
    } else {
        // The public directory only shows vetted providers
        Some(VerificationStatus::Approved)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Providers::new(&mut conn);

    let providers = repo
        .list(&ProviderFilter {
            verification_status: status,
            user_id: None,
            skip,
            limit,
        })
        .await?;

    Ok(Json(providers.into_iter().map(ProviderResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/solution-providers/{id}",
    tag = "providers",
    summary = "Get solution provider",
    params(("id" = String, Path, format = "uuid", description = "Provider ID")),
    responses(
        (status = 200, description = "Provider details", body = ProviderResponse),
        (status = 404, description = "Provider not found"),
    )
)]
#[tracing::instrument(skip_all, fields(provider_id = %id))]
pub async fn get_provider(State(state): State<AppState>, Path(id): Path<ProviderId>) -> Result<Json<ProviderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Providers::new(&mut conn);

    let provider = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Provider".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ProviderResponse::from(provider)))
}

#[utoipa::path(
    post,
    path = "/api/solution-providers",
    tag = "providers",
    summary = "Create solution provider",
    request_body = ProviderCreate,
    responses(
        (status = 201, description = "Provider created", body = ProviderResponse),
        (status = 403, description = "Admin role required"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_provider(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ProviderCreate>,
) -> Result<(StatusCode, Json<ProviderResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Providers::new(&mut conn);

    let created = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ProviderResponse::from(created))))
}

#[utoipa::path(
    patch,
    path = "/api/solution-providers/{id}",
    tag = "providers",
    summary = "Update solution provider",
    params(("id" = String, Path, format = "uuid", description = "Provider ID")),
    request_body = ProviderUpdate,
    responses(
        (status = 200, description = "Provider updated", body = ProviderResponse),
        (status = 404, description = "Provider not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(provider_id = %id))]
pub async fn update_provider(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ProviderId>,
    Json(request): Json<ProviderUpdate>,
) -> Result<Json<ProviderResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Providers::new(&mut conn);

    if repo.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Provider".to_string(),
            id: id.to_string(),
        });
    }

    let updated = repo.update(id, &ProviderUpdateDBRequest::from(request)).await?;

    Ok(Json(ProviderResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/solution-providers/{id}",
    tag = "providers",
    summary = "Delete solution provider",
    params(("id" = String, Path, format = "uuid", description = "Provider ID")),
    responses(
        (status = 204, description = "Provider deleted"),
        (status = 404, description = "Provider not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(provider_id = %id))]
pub async fn delete_provider(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<ProviderId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Providers::new(&mut conn);

    if !repo.delete(id).await? {
        return Err(Error::NotFound {
            resource: "Provider".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
