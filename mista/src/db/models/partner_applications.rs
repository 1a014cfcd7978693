//! Database models for partner applications.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::api::models::partner_applications::ApplicationStatus;
use crate::types::ApplicationId;

/// Database request for creating a partner application
#[derive(Debug, Clone)]
pub struct ApplicationCreateDBRequest {
    pub organization_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub expertise: Vec<String>,
    pub collaboration_type: String,
    pub message: Option<String>,
}

/// Database request for updating a partner application (status review)
#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdateDBRequest {
    pub status: Option<ApplicationStatus>,
}

/// Database response for a partner application
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationDBResponse {
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

/// Filter for listing partner applications
#[derive(Debug, Clone)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl ApplicationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { status: None, skip, limit }
    }
}
