//! API request/response models for solutions.

use super::pagination::Pagination;
use crate::db::models::solutions::{SolutionCreateDBRequest, SolutionDBResponse};
use crate::types::{ProviderId, SolutionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolutionCreate {
    #[schema(value_type = String, format = "uuid")]
    pub provider_id: ProviderId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SolutionId,
    #[schema(value_type = String, format = "uuid")]
    pub provider_id: ProviderId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing solutions
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSolutionsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by category
    pub category: Option<String>,
}

impl From<SolutionCreate> for SolutionCreateDBRequest {
    fn from(api: SolutionCreate) -> Self {
        Self {
            provider_id: api.provider_id,
            name: api.name,
            description: api.description,
            category: api.category,
        }
    }
}

impl From<SolutionDBResponse> for SolutionResponse {
    fn from(db: SolutionDBResponse) -> Self {
        Self {
            id: db.id,
            provider_id: db.provider_id,
            name: db.name,
            description: db.description,
            category: db.category,
            created_at: db.created_at,
        }
    }
}
