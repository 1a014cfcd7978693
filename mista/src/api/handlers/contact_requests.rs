use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, StatusCode},
    Json,
};

use crate::{
    api::models::{
        contact_requests::{
            ContactRequestCreate, ContactRequestResponse, ContactRequestUpdate, DocumentInfo, ListContactRequestsQuery,
            PendingCheckQuery, PendingCheckResponse, RequestStatus, UnreadCountQuery, UnreadCountResponse,
        },
        users::{CurrentUser, Role},
    },
    auth::AdminUser,
    db::{
        handlers::{contact_requests::ContactRequests, providers::Providers, Repository},
        models::contact_requests::{ContactRequestCreateDBRequest, ContactRequestDBResponse, ContactRequestFilter},
    },
    errors::{Error, Result},
    storage::StoredFile,
    types::{ContactRequestId, ProviderId},
    AppState,
};

/// Create a contact request for a provider.
///
/// Accepts either a JSON body or a multipart form whose text fields mirror
/// the JSON payload, with attachments under repeated `files` fields. The
/// seeker identity always comes from the session, never the payload.
#[utoipa::path(
    post,
    path = "/api/contact-requests",
    tag = "contact-requests",
    summary = "Create contact request",
    request_body = ContactRequestCreate,
    responses(
        (status = 201, description = "Request created", body = ContactRequestResponse),
        (status = 404, description = "Provider not found"),
        (status = 409, description = "A pending request for this provider already exists"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_contact_request(
    State(state): State<AppState>,
    caller: CurrentUser,
    request: Request,
) -> Result<(StatusCode, Json<ContactRequestResponse>)> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (create, documents) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state).await.map_err(|e| Error::BadRequest {
            message: format!("Failed to parse multipart data: {e}"),
        })?;
        parse_multipart_request(&state, multipart).await?
    } else {
        let Json(create) = Json::<ContactRequestCreate>::from_request(request, &state)
            .await
            .map_err(|e| Error::BadRequest {
                message: format!("Invalid request body: {e}"),
            })?;
        (create, Vec::new())
    };

    if create.requirements.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Requirements must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let provider = {
        let mut providers = Providers::new(&mut conn);
        providers.get_by_id(create.provider_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Provider".to_string(),
            id: create.provider_id.to_string(),
        })?
    };

    let mut repo = ContactRequests::new(&mut conn);
    // The partial unique index converts a concurrent duplicate into a 409;
    // no separate pre-check needed here.
    let created = repo
        .create(&ContactRequestCreateDBRequest {
            provider_id: provider.id,
            provider_name: provider.name,
            seeker_id: caller.id,
            seeker_name: caller.display_name.clone().unwrap_or_else(|| caller.username.clone()),
            seeker_email: caller.email.clone(),
            requirements: create.requirements,
            preferred_date: create.preferred_date,
            preferred_time_slot: create.preferred_time_slot,
            urgency: create.urgency,
            phone: create.phone,
            company: create.company,
            budget: create.budget,
            additional_info: create.additional_info,
            documents,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ContactRequestResponse::from(created))))
}

/// Parse the multipart rendition of [`ContactRequestCreate`], storing
/// attachments as they stream in.
///
/// A file that exceeds the size limit or fails to store is skipped with a
/// warning rather than failing the whole request.
async fn parse_multipart_request(state: &AppState, mut multipart: Multipart) -> Result<(ContactRequestCreate, Vec<DocumentInfo>)> {
    let mut provider_id: Option<ProviderId> = None;
    let mut requirements = String::new();
    let mut preferred_date = None;
    let mut preferred_time_slot = None;
    let mut urgency = None;
    let mut phone = None;
    let mut company = None;
    let mut budget = None;
    let mut additional_info = None;
    let mut documents = Vec::new();

    let max_upload_size = state.config.uploads.max_upload_size;
    let max_files = state.config.uploads.max_files_per_request;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" => {
                let original_name = field.file_name().unwrap_or("attachment").to_string();
                let mime_type = field.content_type().unwrap_or("application/octet-stream").to_string();

                if documents.len() >= max_files {
                    tracing::warn!("Skipping attachment {original_name}: at most {max_files} files per request");
                    continue;
                }

                let content = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!("Skipping attachment {original_name}: failed to read: {e}");
                        continue;
                    }
                };
                if content.len() as u64 > max_upload_size {
                    tracing::warn!(
                        "Skipping attachment {original_name}: {} bytes exceeds the {max_upload_size} byte limit",
                        content.len()
                    );
                    continue;
                }

                match state
                    .storage
                    .store(StoredFile {
                        original_name: original_name.clone(),
                        mime_type,
                        content: content.to_vec(),
                    })
                    .await
                {
                    Ok(document) => documents.push(document),
                    Err(e) => {
                        tracing::warn!("Skipping attachment {original_name}: storage failed: {e}");
                    }
                }
            }
            name => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read field {name}: {e}"),
                })?;
                match name {
                    "providerId" => {
                        provider_id = Some(value.parse().map_err(|_| Error::BadRequest {
                            message: "providerId must be a UUID".to_string(),
                        })?)
                    }
                    "requirements" => requirements = value,
                    "preferredDate" => preferred_date = Some(value),
                    "preferredTimeSlot" => preferred_time_slot = Some(value),
                    "urgency" => urgency = Some(value),
                    "phone" => phone = Some(value),
                    "company" => company = Some(value),
                    "budget" => budget = Some(value),
                    "additionalInfo" => additional_info = Some(value),
                    other => {
                        tracing::debug!("Ignoring unknown multipart field {other}");
                    }
                }
            }
        }
    }

    let provider_id = provider_id.ok_or_else(|| Error::BadRequest {
        message: "providerId is required".to_string(),
    })?;

    Ok((
        ContactRequestCreate {
            provider_id,
            requirements,
            preferred_date,
            preferred_time_slot,
            urgency,
            phone,
            company,
            budget,
            additional_info,
        },
        documents,
    ))
}

/// Dedup pre-check used by the frontend before showing the request form
#[utoipa::path(
    get,
    path = "/api/contact-requests/check",
    tag = "contact-requests",
    summary = "Check for a pending request",
    params(PendingCheckQuery),
    responses(
        (status = 200, description = "Pending-request flag", body = PendingCheckResponse),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn check_pending(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<PendingCheckQuery>,
) -> Result<Json<PendingCheckResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ContactRequests::new(&mut conn);

    let has_pending_request = repo.has_pending_request(caller.id, query.provider_id).await?;

    Ok(Json(PendingCheckResponse { has_pending_request }))
}

/// List contact requests, scoped to what the caller may see: admins see
/// everything, a provider sees requests for their own profile, everyone else
/// sees their own requests as a seeker.
#[utoipa::path(
    get,
    path = "/api/contact-requests",
    tag = "contact-requests",
    summary = "List contact requests",
    params(ListContactRequestsQuery),
    responses(
        (status = 200, description = "List of contact requests", body = Vec<ContactRequestResponse>),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_contact_requests(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<ListContactRequestsQuery>,
) -> Result<Json<Vec<ContactRequestResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut filter = ContactRequestFilter {
        provider_id: query.provider_id,
        seeker_id: None,
        status: query.status,
        skip,
        limit,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match caller.role {
        Role::Admin => {}
        Role::SolutionProvider => {
            let mut providers = Providers::new(&mut conn);
            match providers.get_by_user_id(caller.id).await? {
                Some(provider) => filter.provider_id = Some(provider.id),
                None => return Ok(Json(vec![])),
            }
        }
        _ => {
            filter.provider_id = query.provider_id;
            filter.seeker_id = Some(caller.id);
        }
    }

    let mut repo = ContactRequests::new(&mut conn);
    let requests = repo.list(&filter).await?;

    Ok(Json(requests.into_iter().map(ContactRequestResponse::from).collect()))
}

/// Unread counter for the provider dashboard badge
#[utoipa::path(
    get,
    path = "/api/contact-requests/unread-count",
    tag = "contact-requests",
    summary = "Count unread contact requests",
    params(UnreadCountQuery),
    responses(
        (status = 200, description = "Unread count", body = UnreadCountResponse),
        (status = 403, description = "Not a provider or admin"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn unread_count(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(query): Query<UnreadCountQuery>,
) -> Result<Json<UnreadCountResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let provider_id = match caller.role {
        Role::Admin => query.provider_id,
        Role::SolutionProvider => {
            let mut providers = Providers::new(&mut conn);
            match providers.get_by_user_id(caller.id).await? {
                Some(provider) => Some(provider.id),
                None => return Ok(Json(UnreadCountResponse { count: 0 })),
            }
        }
        _ => {
            return Err(Error::InsufficientRole {
                required: Role::SolutionProvider,
                resource: "unread counters".to_string(),
            })
        }
    };

    let mut repo = ContactRequests::new(&mut conn);
    let count = repo.count_unread(provider_id).await?;

    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/api/contact-requests/{id}",
    tag = "contact-requests",
    summary = "Get contact request",
    params(("id" = String, Path, format = "uuid", description = "Contact request ID")),
    responses(
        (status = 200, description = "Contact request details", body = ContactRequestResponse),
        (status = 404, description = "Contact request not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn get_contact_request(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<ContactRequestId>,
) -> Result<Json<ContactRequestResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let request = {
        let mut repo = ContactRequests::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Contact request".to_string(),
            id: id.to_string(),
        })?
    };

    ensure_can_view(&mut conn, &caller, &request).await?;

    Ok(Json(ContactRequestResponse::from(request)))
}

/// Provider/admin status and notes update
#[utoipa::path(
    patch,
    path = "/api/contact-requests/{id}",
    tag = "contact-requests",
    summary = "Update contact request",
    params(("id" = String, Path, format = "uuid", description = "Contact request ID")),
    request_body = ContactRequestUpdate,
    responses(
        (status = 200, description = "Contact request updated", body = ContactRequestResponse),
        (status = 404, description = "Contact request not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn update_contact_request(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<ContactRequestId>,
    Json(update): Json<ContactRequestUpdate>,
) -> Result<Json<ContactRequestResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let request = {
        let mut repo = ContactRequests::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Contact request".to_string(),
            id: id.to_string(),
        })?
    };

    ensure_can_manage(&mut conn, &caller, &request).await?;

    // Re-opening a resolved request would bypass the pending dedup index
    if let Some(RequestStatus::Pending) = update.status {
        if request.status != RequestStatus::Pending {
            return Err(Error::BadRequest {
                message: "A resolved request cannot be set back to pending".to_string(),
            });
        }
    }

    let mut repo = ContactRequests::new(&mut conn);
    let updated = repo.update(id, &update.into()).await?;

    Ok(Json(ContactRequestResponse::from(updated)))
}

/// Admin-only delete; stored attachments are removed best-effort.
#[utoipa::path(
    delete,
    path = "/api/contact-requests/{id}",
    tag = "contact-requests",
    summary = "Delete contact request",
    params(("id" = String, Path, format = "uuid", description = "Contact request ID")),
    responses(
        (status = 204, description = "Contact request deleted"),
        (status = 404, description = "Contact request not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn delete_contact_request(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<ContactRequestId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ContactRequests::new(&mut conn);

    let deleted = repo.delete_returning(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Contact request".to_string(),
        id: id.to_string(),
    })?;

    // The row is gone; orphaned files are only worth a warning
    for document in deleted.documents.0 {
        if let Err(e) = state.storage.delete(&document.filename).await {
            tracing::warn!("Failed to delete attachment {}: {e}", document.filename);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Mark a request read. Idempotent.
#[utoipa::path(
    post,
    path = "/api/contact-requests/{id}/read",
    tag = "contact-requests",
    summary = "Mark contact request read",
    params(("id" = String, Path, format = "uuid", description = "Contact request ID")),
    responses(
        (status = 200, description = "Contact request marked read", body = ContactRequestResponse),
        (status = 404, description = "Contact request not found"),
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(request_id = %id))]
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<ContactRequestId>,
) -> Result<Json<ContactRequestResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let request = {
        let mut repo = ContactRequests::new(&mut conn);
        repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Contact request".to_string(),
            id: id.to_string(),
        })?
    };

    ensure_can_manage(&mut conn, &caller, &request).await?;

    let mut repo = ContactRequests::new(&mut conn);
    let updated = repo.mark_read(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Contact request".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ContactRequestResponse::from(updated)))
}

/// Admin, the receiving provider, and the sending seeker may view a request
async fn ensure_can_view(
    conn: &mut sqlx::PgConnection,
    caller: &CurrentUser,
    request: &ContactRequestDBResponse,
) -> Result<()> {
    if caller.role == Role::Admin || request.seeker_id == caller.id {
        return Ok(());
    }
    if caller.role == Role::SolutionProvider {
        let mut providers = Providers::new(conn);
        if providers.get_by_user_id(caller.id).await?.map(|p| p.id) == Some(request.provider_id) {
            return Ok(());
        }
    }

    // 404 rather than 403: don't confirm the request exists
    Err(Error::NotFound {
        resource: "Contact request".to_string(),
        id: request.id.to_string(),
    })
}

/// Only admin and the receiving provider may change a request
async fn ensure_can_manage(
    conn: &mut sqlx::PgConnection,
    caller: &CurrentUser,
    request: &ContactRequestDBResponse,
) -> Result<()> {
    if caller.role == Role::Admin {
        return Ok(());
    }
    if caller.role == Role::SolutionProvider {
        let mut providers = Providers::new(conn);
        if providers.get_by_user_id(caller.id).await?.map(|p| p.id) == Some(request.provider_id) {
            return Ok(());
        }
    }

    Err(Error::NotFound {
        resource: "Contact request".to_string(),
        id: request.id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, LocalFileStorage};
    use crate::test_utils::{create_provider, create_test_app, create_test_app_with_storage, create_user, login_session};
    use serde_json::json;
    use sqlx::PgPool;
    use std::sync::Arc;

    /// Delegates to local storage but refuses any file whose name starts
    /// with `broken`
    struct FlakyStorage(LocalFileStorage);

    #[async_trait::async_trait]
    impl FileStorage for FlakyStorage {
        async fn store(&self, file: crate::storage::StoredFile) -> Result<DocumentInfo> {
            if file.original_name.starts_with("broken") {
                return Err(Error::Upstream {
                    service: "object storage".to_string(),
                    operation: "store attachment".to_string(),
                });
            }
            self.0.store(file).await
        }

        async fn retrieve(&self, storage_key: &str) -> Result<Vec<u8>> {
            self.0.retrieve(storage_key).await
        }

        async fn delete(&self, storage_key: &str) -> Result<()> {
            self.0.delete(storage_key).await
        }

        async fn exists(&self, storage_key: &str) -> Result<bool> {
            self.0.exists(storage_key).await
        }
    }

    fn request_body(provider_id: ProviderId) -> serde_json::Value {
        json!({
            "providerId": provider_id,
            "requirements": "Need an ERP rollout",
            "preferredDate": "2026-09-15",
            "preferredTimeSlot": "morning",
            "urgency": "high"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_json_and_dedup(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "seeker", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "erpco", None).await;
        login_session(&server, "seeker", "a-long-password").await;

        // Pre-check reports nothing pending
        let check: serde_json::Value = server
            .get(&format!("/api/contact-requests/check?providerId={}", provider.id))
            .await
            .json();
        assert_eq!(check["hasPendingRequest"], false);

        let created = server.post("/api/contact-requests").json(&request_body(provider.id)).await;
        created.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = created.json();
        assert_eq!(body["providerName"], "erpco");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["seekerEmail"], "seeker@example.com");

        // Second identical submission collides with the pending index
        let duplicate = server.post("/api/contact-requests").json(&request_body(provider.id)).await;
        duplicate.assert_status(StatusCode::CONFLICT);

        let check: serde_json::Value = server
            .get(&format!("/api/contact-requests/check?providerId={}", provider.id))
            .await
            .json();
        assert_eq!(check["hasPendingRequest"], true);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_multipart_with_attachments(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "seeker", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "docco", None).await;
        login_session(&server, "seeker", "a-long-password").await;

        let form = axum_test::multipart::MultipartForm::new()
            .add_text("providerId", provider.id.to_string())
            .add_text("requirements", "Need document management")
            .add_text("urgency", "low")
            .add_part(
                "files",
                axum_test::multipart::Part::bytes(b"pdf bytes".to_vec())
                    .file_name("requirements.pdf")
                    .mime_type("application/pdf"),
            );

        let created = server.post("/api/contact-requests").multipart(form).await;
        created.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = created.json();

        let documents = body["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["originalName"], "requirements.pdf");
        assert_eq!(documents[0]["mimeType"], "application/pdf");
        assert_eq!(documents[0]["size"], 9);
        assert!(documents[0]["url"].as_str().unwrap().contains("/uploads/"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_oversized_attachment_skipped_not_fatal(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "seeker", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "bigco", None).await;
        login_session(&server, "seeker", "a-long-password").await;

        // Test config caps uploads at 1 KiB
        let form = axum_test::multipart::MultipartForm::new()
            .add_text("providerId", provider.id.to_string())
            .add_text("requirements", "Big file attached")
            .add_part(
                "files",
                axum_test::multipart::Part::bytes(vec![0u8; 4096])
                    .file_name("huge.bin")
                    .mime_type("application/octet-stream"),
            )
            .add_part(
                "files",
                axum_test::multipart::Part::bytes(b"small".to_vec())
                    .file_name("small.txt")
                    .mime_type("text/plain"),
            );

        let created = server.post("/api/contact-requests").multipart(form).await;
        created.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = created.json();

        // Oversized file dropped, small one kept
        let documents = body["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["originalName"], "small.txt");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_attachment_store_skipped_not_fatal(pool: PgPool) {
        // Leaked on purpose: the directory must outlive the server
        let upload_dir = tempfile::tempdir().unwrap().keep();
        let storage = Arc::new(FlakyStorage(LocalFileStorage::new(
            upload_dir,
            "http://localhost:8080/uploads".to_string(),
        )));
        let server = create_test_app_with_storage(pool.clone(), storage).await;

        create_user(&pool, "seeker", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "flakyco", None).await;
        login_session(&server, "seeker", "a-long-password").await;

        let form = axum_test::multipart::MultipartForm::new()
            .add_text("providerId", provider.id.to_string())
            .add_text("requirements", "One attachment will not store")
            .add_part(
                "files",
                axum_test::multipart::Part::bytes(b"lost".to_vec())
                    .file_name("broken.pdf")
                    .mime_type("application/pdf"),
            )
            .add_part(
                "files",
                axum_test::multipart::Part::bytes(b"kept".to_vec())
                    .file_name("kept.txt")
                    .mime_type("text/plain"),
            );

        let created = server.post("/api/contact-requests").multipart(form).await;
        created.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = created.json();

        // The request lands as pending with only the stored attachment
        assert_eq!(body["status"], "pending");
        let documents = body["documents"].as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["originalName"], "kept.txt");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_provider_404(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "seeker", "a-long-password", Role::SolutionSeeker).await;
        login_session(&server, "seeker", "a-long-password").await;

        server
            .post("/api/contact-requests")
            .json(&request_body(uuid::Uuid::new_v4()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_scoping(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "root", "a-long-password", Role::Admin).await;
        create_user(&pool, "alice", "a-long-password", Role::SolutionSeeker).await;
        create_user(&pool, "bob", "a-long-password", Role::SolutionSeeker).await;
        let owner = create_user(&pool, "owner", "a-long-password", Role::SolutionProvider).await;

        let owned = create_provider(&pool, "ownedco", Some(owner.id)).await;
        let other = create_provider(&pool, "otherco", None).await;

        // alice -> ownedco, bob -> otherco
        login_session(&server, "alice", "a-long-password").await;
        server
            .post("/api/contact-requests")
            .json(&request_body(owned.id))
            .await
            .assert_status(StatusCode::CREATED);
        login_session(&server, "bob", "a-long-password").await;
        server
            .post("/api/contact-requests")
            .json(&request_body(other.id))
            .await
            .assert_status(StatusCode::CREATED);

        // Seeker sees only their own
        login_session(&server, "alice", "a-long-password").await;
        let mine: serde_json::Value = server.get("/api/contact-requests").await.json();
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["seekerName"].as_str().unwrap(), "alice");

        // Provider sees only requests for their profile
        login_session(&server, "owner", "a-long-password").await;
        let theirs: serde_json::Value = server.get("/api/contact-requests").await.json();
        assert_eq!(theirs.as_array().unwrap().len(), 1);
        assert_eq!(theirs[0]["providerName"], "ownedco");

        // Admin sees everything
        login_session(&server, "root", "a-long-password").await;
        let all: serde_json::Value = server.get("/api/contact-requests").await.json();
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_read_tracking_and_unread_count(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "alice", "a-long-password", Role::SolutionSeeker).await;
        let owner = create_user(&pool, "owner", "a-long-password", Role::SolutionProvider).await;
        let provider = create_provider(&pool, "badgeco", Some(owner.id)).await;

        login_session(&server, "alice", "a-long-password").await;
        let created: serde_json::Value = server.post("/api/contact-requests").json(&request_body(provider.id)).await.json();
        let id = created["id"].as_str().unwrap();

        login_session(&server, "owner", "a-long-password").await;
        let count: serde_json::Value = server.get("/api/contact-requests/unread-count").await.json();
        assert_eq!(count["count"], 1);

        // Idempotent mark-read
        server
            .post(&format!("/api/contact-requests/{id}/read"))
            .await
            .assert_status_ok();
        server
            .post(&format!("/api/contact-requests/{id}/read"))
            .await
            .assert_status_ok();

        let count: serde_json::Value = server.get("/api/contact-requests/unread-count").await.json();
        assert_eq!(count["count"], 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_update_and_reopen_guard(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "root", "a-long-password", Role::Admin).await;
        create_user(&pool, "alice", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "flowco", None).await;

        login_session(&server, "alice", "a-long-password").await;
        let created: serde_json::Value = server.post("/api/contact-requests").json(&request_body(provider.id)).await.json();
        let id = created["id"].as_str().unwrap();

        login_session(&server, "root", "a-long-password").await;
        let updated = server
            .patch(&format!("/api/contact-requests/{id}"))
            .json(&json!({"status": "completed", "notes": "Done over email"}))
            .await;
        updated.assert_status_ok();
        let updated: serde_json::Value = updated.json();
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["notes"], "Done over email");

        // A resolved request stays resolved
        server
            .patch(&format!("/api/contact-requests/{id}"))
            .json(&json!({"status": "pending"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // And the seeker can submit a fresh request to the same provider
        login_session(&server, "alice", "a-long-password").await;
        server
            .post("/api/contact-requests")
            .json(&request_body(provider.id))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_foreign_seeker_gets_404(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "alice", "a-long-password", Role::SolutionSeeker).await;
        create_user(&pool, "mallory", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "privco", None).await;

        login_session(&server, "alice", "a-long-password").await;
        let created: serde_json::Value = server.post("/api/contact-requests").json(&request_body(provider.id)).await.json();
        let id = created["id"].as_str().unwrap();

        // Another seeker can neither view nor modify it
        login_session(&server, "mallory", "a-long-password").await;
        server
            .get(&format!("/api/contact-requests/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .patch(&format!("/api/contact-requests/{id}"))
            .json(&json!({"notes": "hijacked"}))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_delete(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;
        create_user(&pool, "root", "a-long-password", Role::Admin).await;
        create_user(&pool, "alice", "a-long-password", Role::SolutionSeeker).await;
        let provider = create_provider(&pool, "gone-co", None).await;

        login_session(&server, "alice", "a-long-password").await;
        let created: serde_json::Value = server.post("/api/contact-requests").json(&request_body(provider.id)).await.json();
        let id = created["id"].as_str().unwrap();

        // Seekers cannot delete, admins can
        server
            .delete(&format!("/api/contact-requests/{id}"))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        login_session(&server, "root", "a-long-password").await;
        server
            .delete(&format!("/api/contact-requests/{id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/api/contact-requests/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
