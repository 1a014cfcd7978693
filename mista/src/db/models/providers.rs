//! Database models for solution providers.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::api::models::providers::VerificationStatus;
use crate::types::{ApplicationId, ProviderId, UserId};

/// Database request for creating a solution provider
#[derive(Debug, Clone)]
pub struct ProviderCreateDBRequest {
    pub name: String,
    pub description: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub regions: Vec<String>,
    pub verification_status: VerificationStatus,
    pub application_id: Option<ApplicationId>,
    pub user_id: Option<UserId>,
}

/// Database request for updating a solution provider
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProviderUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub regions: Option<Vec<String>>,
    pub verification_status: Option<VerificationStatus>,
}

/// Database response for a solution provider
#[derive(Debug, Clone, FromRow)]
pub struct ProviderDBResponse {
    pub id: ProviderId,
    pub name: String,
    pub description: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub regions: Vec<String>,
    pub verification_status: VerificationStatus,
    pub application_id: Option<ApplicationId>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing solution providers
#[derive(Debug, Clone)]
pub struct ProviderFilter {
    pub verification_status: Option<VerificationStatus>,
    pub user_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

impl ProviderFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            verification_status: None,
            user_id: None,
            skip,
            limit,
        }
    }
}
