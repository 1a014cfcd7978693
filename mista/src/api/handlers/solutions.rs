use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        solutions::{ListSolutionsQuery, SolutionCreate, SolutionResponse},
        users::{CurrentUser, Role},
    },
    auth::AdminUser,
    db::{
        handlers::{providers::Providers, solutions::Solutions, Repository},
        models::solutions::SolutionFilter,
    },
    errors::{Error, Result},
    types::SolutionId,
    AppState,
};

/// Public solution catalog
#[utoipa::path(
    get,
    path = "/api/solutions",
    tag = "solutions",
    summary = "List solutions",
    params(ListSolutionsQuery),
    responses(
        (status = 200, description = "List of solutions", body = Vec<SolutionResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_solutions(
    State(state): State<AppState>,
    Query(query): Query<ListSolutionsQuery>,
) -> Result<Json<Vec<SolutionResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Solutions::new(&mut conn);

    let solutions = repo
        .list(&SolutionFilter {
            category: query.category,
            provider_id: None,
            skip,
            limit,
        })
        .await?;

    Ok(Json(solutions.into_iter().map(SolutionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/solutions/{id}",
    tag = "solutions",
    summary = "Get solution",
    params(("id" = String, Path, format = "uuid", description = "Solution ID")),
    responses(
        (status = 200, description = "Solution details", body = SolutionResponse),
        (status = 404, description = "Solution not found"),
    )
)]
#[tracing::instrument(skip_all, fields(solution_id = %id))]
pub async fn get_solution(State(state): State<AppState>, Path(id): Path<SolutionId>) -> Result<Json<SolutionResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Solutions::new(&mut conn);

    let solution = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Solution".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(SolutionResponse::from(solution)))
}

/// Create a solution. Admins can create for any provider; a provider-role
/// user only for their own profile.
#[utoipa::path(
    post,
    path = "/api/solutions",
    tag = "solutions",
    summary = "Create solution",
    request_body = SolutionCreate,
    responses(
        (status = 201, description = "Solution created", body = SolutionResponse),
        (status = 403, description = "Not allowed to create for this provider"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_solution(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(request): Json<SolutionCreate>,
) -> Result<(StatusCode, Json<SolutionResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match caller.role {
        Role::Admin => {}
        Role::SolutionProvider => {
            let mut providers = Providers::new(&mut conn);
            let owned = providers.get_by_user_id(caller.id).await?;
            if owned.map(|p| p.id) != Some(request.provider_id) {
                return Err(Error::InsufficientRole {
                    required: Role::Admin,
                    resource: "solutions for another provider".to_string(),
                });
            }
        }
        _ => {
            return Err(Error::InsufficientRole {
                required: Role::SolutionProvider,
                resource: "solutions".to_string(),
            });
        }
    }

    let mut repo = Solutions::new(&mut conn);
    let created = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(SolutionResponse::from(created))))
}

#[utoipa::path(
    delete,
    path = "/api/solutions/{id}",
    tag = "solutions",
    summary = "Delete solution",
    params(("id" = String, Path, format = "uuid", description = "Solution ID")),
    responses(
        (status = 204, description = "Solution deleted"),
        (status = 404, description = "Solution not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(solution_id = %id))]
pub async fn delete_solution(State(state): State<AppState>, _admin: AdminUser, Path(id): Path<SolutionId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Solutions::new(&mut conn);

    if !repo.delete(id).await? {
        return Err(Error::NotFound {
            resource: "Solution".to_string(),
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::UserUpdateDBRequest;
    use crate::test_utils::{create_test_app, create_provider, create_user, login_session};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_category_filter_public(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "root", "a-long-password", Role::Admin).await;
        login_session(&server, "root", "a-long-password").await;

        let provider = create_provider(&pool, "solware", None).await;
        for (name, category) in [("CRM Pro", "crm"), ("LedgerX", "accounting")] {
            server
                .post("/api/solutions")
                .json(&json!({
                    "providerId": provider.id,
                    "name": name,
                    "category": category
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let public = create_test_app(pool.clone()).await;
        let crm: serde_json::Value = public.get("/api/solutions?category=crm").await.json();
        assert_eq!(crm.as_array().unwrap().len(), 1);
        assert_eq!(crm[0]["name"], "CRM Pro");

        let all: serde_json::Value = public.get("/api/solutions").await.json();
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_provider_can_only_create_for_own_profile(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let owner = create_user(&pool, "owner", "a-long-password", Role::SolutionProvider).await;

        let own = create_provider(&pool, "mineco", Some(owner.id)).await;
        let other = create_provider(&pool, "theirsco", None).await;

        login_session(&server, "owner", "a-long-password").await;

        server
            .post("/api/solutions")
            .json(&json!({"providerId": own.id, "name": "Mine", "category": "crm"}))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/api/solutions")
            .json(&json!({"providerId": other.id, "name": "Theirs", "category": "crm"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_seeker_cannot_create_solutions(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "justlooking", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "anyco", None).await;

        login_session(&server, "justlooking", "a-long-password").await;
        server
            .post("/api/solutions")
            .json(&json!({"providerId": provider.id, "name": "Nope", "category": "crm"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deactivated_provider_user_loses_access(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        let owner = create_user(&pool, "fading", "a-long-password", Role::SolutionProvider).await;
        let own = create_provider(&pool, "fadeco", Some(owner.id)).await;

        login_session(&server, "fading", "a-long-password").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut users = crate::db::handlers::Users::new(&mut conn);
        users
            .update(
                owner.id,
                &UserUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        drop(conn);

        server
            .post("/api/solutions")
            .json(&json!({"providerId": own.id, "name": "Late", "category": "crm"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
