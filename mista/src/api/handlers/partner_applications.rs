use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        partner_applications::{ApplicationCreate, ApplicationResponse, ApplicationStatus, ApplicationUpdate, ListApplicationsQuery},
        providers::VerificationStatus,
    },
    auth::AdminUser,
    db::{
        handlers::{partner_applications::PartnerApplications, providers::Providers, Repository},
        models::{
            partner_applications::{ApplicationFilter, ApplicationUpdateDBRequest},
            providers::ProviderCreateDBRequest,
        },
    },
    errors::{Error, Result},
    types::ApplicationId,
    AppState,
};

/// Public partner intake form
#[utoipa::path(
    post,
    path = "/api/partner-applications",
    tag = "partner-applications",
    summary = "Submit partner application",
    request_body = ApplicationCreate,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid input"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_application(
    State(state): State<AppState>,
    Json(request): Json<ApplicationCreate>,
) -> Result<(StatusCode, Json<ApplicationResponse>)> {
    if request.organization_name.trim().is_empty() || request.contact_email.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Organization name and contact email are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = PartnerApplications::new(&mut conn);

    let created = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/api/partner-applications",
    tag = "partner-applications",
    summary = "List partner applications",
    params(ListApplicationsQuery),
    responses(
        (status = 200, description = "List of applications", body = Vec<ApplicationResponse>),
        (status = 403, description = "Admin role required"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<ApplicationResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = PartnerApplications::new(&mut conn);

    let applications = repo
        .list(&ApplicationFilter {
            status: query.status,
            skip,
            limit,
        })
        .await?;

    Ok(Json(applications.into_iter().map(ApplicationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/partner-applications/{id}",
    tag = "partner-applications",
    summary = "Get partner application",
    params(("id" = String, Path, format = "uuid", description = "Application ID")),
    responses(
        (status = 200, description = "Application details", body = ApplicationResponse),
        (status = 404, description = "Application not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(application_id = %id))]
pub async fn get_application(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = PartnerApplications::new(&mut conn);

    let application = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Application".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApplicationResponse::from(application)))
}

/// Review an application. Approval also creates the provider record in the
/// same transaction, linked back via `application_id`.
#[utoipa::path(
    patch,
    path = "/api/partner-applications/{id}",
    tag = "partner-applications",
    summary = "Review partner application",
    params(("id" = String, Path, format = "uuid", description = "Application ID")),
    request_body = ApplicationUpdate,
    responses(
        (status = 200, description = "Application reviewed", body = ApplicationResponse),
        (status = 400, description = "Application already reviewed"),
        (status = 404, description = "Application not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(application_id = %id))]
pub async fn review_application(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ApplicationId>,
    Json(request): Json<ApplicationUpdate>,
) -> Result<Json<ApplicationResponse>> {
    if request.status == ApplicationStatus::Pending {
        return Err(Error::BadRequest {
            message: "Review decision must be approved or rejected".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let application = {
        let mut repo = PartnerApplications::new(&mut tx);
        let application = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Application".to_string(),
            id: id.to_string(),
        })?;

        // A decision is final; re-reviewing would duplicate the provider
        if application.status != ApplicationStatus::Pending {
            return Err(Error::BadRequest {
                message: "Application has already been reviewed".to_string(),
            });
        }

        repo.update(id, &ApplicationUpdateDBRequest { status: Some(request.status) }).await?
    };

    if request.status == ApplicationStatus::Approved {
        let mut providers = Providers::new(&mut tx);
        providers
            .create(&ProviderCreateDBRequest {
                name: application.organization_name.clone(),
                description: application.message.clone().unwrap_or_default(),
                contact_email: application.contact_email.clone(),
                contact_phone: application.contact_phone.clone(),
                website: application.website.clone(),
                logo_url: None,
                regions: vec![],
                verification_status: VerificationStatus::Approved,
                application_id: Some(application.id),
                user_id: None,
            })
            .await?;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ApplicationResponse::from(application)))
}
