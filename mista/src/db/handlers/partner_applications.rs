//! Database repository for partner applications.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::partner_applications::{
            ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationFilter, ApplicationUpdateDBRequest,
        },
    },
    types::ApplicationId,
};

const APPLICATION_COLUMNS: &str = "id, organization_name, contact_name, contact_email, contact_phone, website, expertise, \
     collaboration_type, message, status, created_at";

pub struct PartnerApplications<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for PartnerApplications<'c> {
    type CreateRequest = ApplicationCreateDBRequest;
    type UpdateRequest = ApplicationUpdateDBRequest;
    type Response = ApplicationDBResponse;
    type Id = ApplicationId;
    type Filter = ApplicationFilter;

    #[instrument(skip(self, request), fields(organization = %request.organization_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO partner_applications
                (organization_name, contact_name, contact_email, contact_phone, website, expertise,
                 collaboration_type, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let application = sqlx::query_as::<_, ApplicationDBResponse>(&query)
            .bind(&request.organization_name)
            .bind(&request.contact_name)
            .bind(&request.contact_email)
            .bind(&request.contact_phone)
            .bind(&request.website)
            .bind(&request.expertise)
            .bind(&request.collaboration_type)
            .bind(&request.message)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(application)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM partner_applications WHERE id = $1");
        let application = sqlx::query_as::<_, ApplicationDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(application)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM partner_applications WHERE id = ANY($1)");
        let applications = sqlx::query_as::<_, ApplicationDBResponse>(&query)
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(applications.into_iter().map(|a| (a.id, a)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {APPLICATION_COLUMNS} FROM partner_applications WHERE 1=1");

        if filter.status.is_some() {
            query.push_str(" AND status = $1");
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, ApplicationDBResponse>(&query);
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status);
        }

        let applications = sql_query.fetch_all(&mut *self.db).await?;
        Ok(applications)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE partner_applications
            SET status = COALESCE($2, status)
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let application = sqlx::query_as::<_, ApplicationDBResponse>(&query)
            .bind(id)
            .bind(request.status)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(application)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM partner_applications WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> PartnerApplications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
