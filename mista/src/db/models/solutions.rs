//! Database models for solutions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{ProviderId, SolutionId};

/// Database request for creating a solution
#[derive(Debug, Clone)]
pub struct SolutionCreateDBRequest {
    pub provider_id: ProviderId,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// Database request for updating a solution
#[derive(Debug, Clone, Default)]
pub struct SolutionUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Database response for a solution
#[derive(Debug, Clone, FromRow)]
pub struct SolutionDBResponse {
    pub id: SolutionId,
    pub provider_id: ProviderId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing solutions
#[derive(Debug, Clone)]
pub struct SolutionFilter {
    pub category: Option<String>,
    pub provider_id: Option<ProviderId>,
    pub skip: i64,
    pub limit: i64,
}

impl SolutionFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            category: None,
            provider_id: None,
            skip,
            limit,
        }
    }
}
