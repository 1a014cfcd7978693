//! Database repository for solution providers.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::providers::{ProviderCreateDBRequest, ProviderDBResponse, ProviderFilter, ProviderUpdateDBRequest},
    },
    types::{ProviderId, UserId},
};

const PROVIDER_COLUMNS: &str = "id, name, description, contact_email, contact_phone, website, logo_url, regions, \
     verification_status, application_id, user_id, created_at";

pub struct Providers<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Providers<'c> {
    type CreateRequest = ProviderCreateDBRequest;
    type UpdateRequest = ProviderUpdateDBRequest;
    type Response = ProviderDBResponse;
    type Id = ProviderId;
    type Filter = ProviderFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO solution_providers
                (name, description, contact_email, contact_phone, website, logo_url, regions,
                 verification_status, application_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PROVIDER_COLUMNS}
            "#
        );

        let provider = sqlx::query_as::<_, ProviderDBResponse>(&query)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.contact_email)
            .bind(&request.contact_phone)
            .bind(&request.website)
            .bind(&request.logo_url)
            .bind(&request.regions)
            .bind(request.verification_status)
            .bind(request.application_id)
            .bind(request.user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(provider)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {PROVIDER_COLUMNS} FROM solution_providers WHERE id = $1");
        let provider = sqlx::query_as::<_, ProviderDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(provider)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let query = format!("SELECT {PROVIDER_COLUMNS} FROM solution_providers WHERE id = ANY($1)");
        let providers = sqlx::query_as::<_, ProviderDBResponse>(&query)
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(providers.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {PROVIDER_COLUMNS} FROM solution_providers WHERE 1=1");
        let mut bind_idx = 0;

        if filter.verification_status.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND verification_status = ${bind_idx}"));
        }
        if filter.user_id.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND user_id = ${bind_idx}"));
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, ProviderDBResponse>(&query);
        if let Some(status) = filter.verification_status {
            sql_query = sql_query.bind(status);
        }
        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }

        let providers = sql_query.fetch_all(&mut *self.db).await?;
        Ok(providers)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE solution_providers
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                contact_email = COALESCE($4, contact_email),
                contact_phone = COALESCE($5, contact_phone),
                website = COALESCE($6, website),
                logo_url = COALESCE($7, logo_url),
                regions = COALESCE($8, regions),
                verification_status = COALESCE($9, verification_status)
            WHERE id = $1
            RETURNING {PROVIDER_COLUMNS}
            "#
        );

        let provider = sqlx::query_as::<_, ProviderDBResponse>(&query)
            .bind(id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.contact_email)
            .bind(&request.contact_phone)
            .bind(&request.website)
            .bind(&request.logo_url)
            .bind(&request.regions)
            .bind(request.verification_status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(provider)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM solution_providers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Providers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Find the provider profile owned by a user, if any
    #[instrument(skip(self), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<ProviderDBResponse>> {
        let query = format!("SELECT {PROVIDER_COLUMNS} FROM solution_providers WHERE user_id = $1");
        let provider = sqlx::query_as::<_, ProviderDBResponse>(&query)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(provider)
    }
}
