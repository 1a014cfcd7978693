//! Database repository for contact requests.

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::contact_requests::{
            ContactRequestCreateDBRequest, ContactRequestDBResponse, ContactRequestFilter, ContactRequestUpdateDBRequest,
        },
    },
    types::{abbrev_uuid, ContactRequestId, ProviderId, UserId},
};

const REQUEST_COLUMNS: &str = "id, provider_id, provider_name, seeker_id, seeker_name, seeker_email, requirements, \
     preferred_date, preferred_time_slot, urgency, phone, company, budget, additional_info, \
     status, is_read, notes, documents, created_at, updated_at";

pub struct ContactRequests<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for ContactRequests<'c> {
    type CreateRequest = ContactRequestCreateDBRequest;
    type UpdateRequest = ContactRequestUpdateDBRequest;
    type Response = ContactRequestDBResponse;
    type Id = ContactRequestId;
    type Filter = ContactRequestFilter;

    /// Insert a new `pending` request.
    ///
    /// The partial unique index on (seeker_id, provider_id) converts a
    /// concurrent duplicate into a `UniqueViolation` rather than relying on
    /// the caller's pre-check.
    #[instrument(skip(self, request), fields(provider_id = %abbrev_uuid(&request.provider_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO contact_requests
                (provider_id, provider_name, seeker_id, seeker_name, seeker_email, requirements,
                 preferred_date, preferred_time_slot, urgency, phone, company, budget,
                 additional_info, documents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(request.provider_id)
            .bind(&request.provider_name)
            .bind(request.seeker_id)
            .bind(&request.seeker_name)
            .bind(&request.seeker_email)
            .bind(&request.requirements)
            .bind(&request.preferred_date)
            .bind(&request.preferred_time_slot)
            .bind(&request.urgency)
            .bind(&request.phone)
            .bind(&request.company)
            .bind(&request.budget)
            .bind(&request.additional_info)
            .bind(Json(&request.documents))
            .fetch_one(&mut *self.db)
            .await?;

        Ok(created)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE id = $1");
        let request = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(request)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE id = ANY($1)");
        let requests = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(requests.into_iter().map(|r| (r.id, r)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {REQUEST_COLUMNS} FROM contact_requests WHERE 1=1");
        let mut bind_idx = 0;

        if filter.provider_id.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND provider_id = ${bind_idx}"));
        }
        if filter.seeker_id.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND seeker_id = ${bind_idx}"));
        }
        if filter.status.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND status = ${bind_idx}"));
        }

        // Newest first
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, ContactRequestDBResponse>(&query);
        if let Some(provider_id) = filter.provider_id {
            sql_query = sql_query.bind(provider_id);
        }
        if let Some(seeker_id) = filter.seeker_id {
            sql_query = sql_query.bind(seeker_id);
        }
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let requests = sql_query.fetch_all(&mut *self.db).await?;
        Ok(requests)
    }

    /// Unconditional overwrite of status/notes; bumps `updated_at`.
    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE contact_requests
            SET status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(id)
            .bind(request.status)
            .bind(&request.notes)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(updated)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contact_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> ContactRequests<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// UX pre-check: does this seeker already have a pending request for the
    /// provider? The database index is what actually enforces the invariant.
    #[instrument(skip(self), fields(seeker_id = %abbrev_uuid(&seeker_id), provider_id = %abbrev_uuid(&provider_id)), err)]
    pub async fn has_pending_request(&mut self, seeker_id: UserId, provider_id: ProviderId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM contact_requests
                WHERE seeker_id = $1 AND provider_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(seeker_id)
        .bind(provider_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// Delete a request, returning the prior row if it existed
    #[instrument(skip(self, id), err)]
    pub async fn delete_returning(&mut self, id: ContactRequestId) -> Result<Option<ContactRequestDBResponse>> {
        let query = format!("DELETE FROM contact_requests WHERE id = $1 RETURNING {REQUEST_COLUMNS}");
        let deleted = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(deleted)
    }

    /// Set the read flag. Idempotent; does not bump `updated_at`.
    #[instrument(skip(self, id), err)]
    pub async fn mark_read(&mut self, id: ContactRequestId) -> Result<Option<ContactRequestDBResponse>> {
        let query = format!("UPDATE contact_requests SET is_read = TRUE WHERE id = $1 RETURNING {REQUEST_COLUMNS}");
        let updated = sqlx::query_as::<_, ContactRequestDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(updated)
    }

    /// Count unread requests, optionally scoped to one provider
    #[instrument(skip(self), err)]
    pub async fn count_unread(&mut self, provider_id: Option<ProviderId>) -> Result<i64> {
        let count: i64 = match provider_id {
            Some(provider_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM contact_requests WHERE is_read = FALSE AND provider_id = $1")
                    .bind(provider_id)
                    .fetch_one(&mut *self.db)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM contact_requests WHERE is_read = FALSE")
                    .fetch_one(&mut *self.db)
                    .await?
            }
        };

        Ok(count)
    }
}
