//! API request/response models for solution providers.

use super::pagination::Pagination;
use crate::db::models::providers::{ProviderCreateDBRequest, ProviderDBResponse, ProviderUpdateDBRequest};
use crate::types::{ApplicationId, ProviderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub regions: Option<Vec<String>>,
    pub verification_status: Option<VerificationStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProviderId,
    pub name: String,
    pub description: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub regions: Vec<String>,
    pub verification_status: VerificationStatus,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub application_id: Option<ApplicationId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing solution providers
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListProvidersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by verification status (non-admins only ever see `approved`)
    pub status: Option<VerificationStatus>,
}

impl From<ProviderCreate> for ProviderCreateDBRequest {
    fn from(api: ProviderCreate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            contact_email: api.contact_email,
            contact_phone: api.contact_phone,
            website: api.website,
            logo_url: api.logo_url,
            regions: api.regions,
            verification_status: VerificationStatus::Pending,
            application_id: None,
            user_id: None,
        }
    }
}

impl From<ProviderUpdate> for ProviderUpdateDBRequest {
    fn from(api: ProviderUpdate) -> Self {
        Self {
            name: api.name,
            description: api.description,
            contact_email: api.contact_email,
            contact_phone: api.contact_phone,
            website: api.website,
            logo_url: api.logo_url,
            regions: api.regions,
            verification_status: api.verification_status,
        }
    }
}

impl From<ProviderDBResponse> for ProviderResponse {
    fn from(db: ProviderDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            contact_email: db.contact_email,
            contact_phone: db.contact_phone,
            website: db.website,
            logo_url: db.logo_url,
            regions: db.regions,
            verification_status: db.verification_status,
            application_id: db.application_id,
            user_id: db.user_id,
            created_at: db.created_at,
        }
    }
}
