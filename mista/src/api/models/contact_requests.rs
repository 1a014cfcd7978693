//! API request/response models for contact requests.

use super::pagination::Pagination;
use crate::db::models::contact_requests::{ContactRequestDBResponse, ContactRequestUpdateDBRequest};
use crate::types::{ContactRequestId, ProviderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Contacted,
    Completed,
    Rejected,
}

/// Metadata for one stored attachment, embedded as a JSONB list on the
/// contact request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    /// Storage key (uuid + original extension)
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub url: String,
}

/// Create payload. Accepted as JSON, or as multipart form fields with
/// `files[]` attachments.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequestCreate {
    #[schema(value_type = String, format = "uuid")]
    pub provider_id: ProviderId,
    pub requirements: String,
    pub preferred_date: Option<String>,
    pub preferred_time_slot: Option<String>,
    pub urgency: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub budget: Option<String>,
    pub additional_info: Option<String>,
}

/// Status/notes update; any update bumps `updatedAt`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequestUpdate {
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequestResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContactRequestId,
    #[schema(value_type = String, format = "uuid")]
    pub provider_id: ProviderId,
    pub provider_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub seeker_id: UserId,
    pub seeker_name: String,
    pub seeker_email: String,
    pub requirements: String,
    pub preferred_date: Option<String>,
    pub preferred_time_slot: Option<String>,
    pub urgency: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub budget: Option<String>,
    pub additional_info: Option<String>,
    pub status: RequestStatus,
    pub is_read: bool,
    pub notes: Option<String>,
    pub documents: Vec<DocumentInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for the dedup pre-check
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheckQuery {
    #[param(value_type = String, format = "uuid")]
    #[schema(value_type = String, format = "uuid")]
    pub provider_id: ProviderId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheckResponse {
    pub has_pending_request: bool,
}

/// Query parameters for listing contact requests
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListContactRequestsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by provider
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub provider_id: Option<ProviderId>,

    /// Filter by status
    pub status: Option<RequestStatus>,
}

/// Query parameters for the unread counter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountQuery {
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub provider_id: Option<ProviderId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

impl From<ContactRequestUpdate> for ContactRequestUpdateDBRequest {
    fn from(api: ContactRequestUpdate) -> Self {
        Self {
            status: api.status,
            notes: api.notes,
        }
    }
}

impl From<ContactRequestDBResponse> for ContactRequestResponse {
    fn from(db: ContactRequestDBResponse) -> Self {
        Self {
            id: db.id,
            provider_id: db.provider_id,
            provider_name: db.provider_name,
            seeker_id: db.seeker_id,
            seeker_name: db.seeker_name,
            seeker_email: db.seeker_email,
            requirements: db.requirements,
            preferred_date: db.preferred_date,
            preferred_time_slot: db.preferred_time_slot,
            urgency: db.urgency,
            phone: db.phone,
            company: db.company,
            budget: db.budget,
            additional_info: db.additional_info,
            status: db.status,
            is_read: db.is_read,
            notes: db.notes,
            documents: db.documents.0,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
