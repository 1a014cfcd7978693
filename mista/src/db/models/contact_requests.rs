//! Database models for contact requests.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::api::models::contact_requests::{DocumentInfo, RequestStatus};
use crate::types::{ContactRequestId, ProviderId, UserId};

/// Database request for creating a contact request
#[derive(Debug, Clone)]
pub struct ContactRequestCreateDBRequest {
    pub provider_id: ProviderId,
    pub provider_name: String,
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
    pub documents: Vec<DocumentInfo>,
}

/// Database request for updating a contact request (status / notes)
///
/// `None` fields are left unchanged. Any update bumps `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct ContactRequestUpdateDBRequest {
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
}

/// Database response for a contact request
#[derive(Debug, Clone, FromRow)]
pub struct ContactRequestDBResponse {
    pub id: ContactRequestId,
    pub provider_id: ProviderId,
    pub provider_name: String,
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
    pub documents: Json<Vec<DocumentInfo>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for listing contact requests (newest first)
#[derive(Debug, Clone)]
pub struct ContactRequestFilter {
    pub provider_id: Option<ProviderId>,
    pub seeker_id: Option<UserId>,
    pub status: Option<RequestStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl ContactRequestFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            provider_id: None,
            seeker_id: None,
            status: None,
            skip,
            limit,
        }
    }
}
