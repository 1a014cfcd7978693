//! API request/response models for partner applications.

use super::pagination::Pagination;
use crate::db::models::partner_applications::{ApplicationCreateDBRequest, ApplicationDBResponse};
use crate::types::ApplicationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Public partner intake form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCreate {
    pub organization_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub collaboration_type: String,
    pub message: Option<String>,
}

/// Admin review decision. Approval creates the corresponding solution
/// provider in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApplicationId,
    pub organization_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub expertise: Vec<String>,
    pub collaboration_type: String,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing partner applications
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListApplicationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by review status
    pub status: Option<ApplicationStatus>,
}

impl From<ApplicationCreate> for ApplicationCreateDBRequest {
    fn from(api: ApplicationCreate) -> Self {
        Self {
            organization_name: api.organization_name,
            contact_name: api.contact_name,
            contact_email: api.contact_email,
            contact_phone: api.contact_phone,
            website: api.website,
            expertise: api.expertise,
            collaboration_type: api.collaboration_type,
            message: api.message,
        }
    }
}

impl From<ApplicationDBResponse> for ApplicationResponse {
    fn from(db: ApplicationDBResponse) -> Self {
        Self {
            id: db.id,
            organization_name: db.organization_name,
            contact_name: db.contact_name,
            contact_email: db.contact_email,
            contact_phone: db.contact_phone,
            website: db.website,
            expertise: db.expertise,
            collaboration_type: db.collaboration_type,
            message: db.message,
            status: db.status,
            created_at: db.created_at,
        }
    }
}
