//! Database repository for solutions.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::solutions::{SolutionCreateDBRequest, SolutionDBResponse, SolutionFilter, SolutionUpdateDBRequest},
    },
    types::SolutionId,
};

const SOLUTION_COLUMNS: &str = "id, provider_id, name, description, category, created_at";

pub struct Solutions<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Solutions<'c> {
    type CreateRequest = SolutionCreateDBRequest;
    type UpdateRequest = SolutionUpdateDBRequest;
    type Response = SolutionDBResponse;
    type Id = SolutionId;
    type Filter = SolutionFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO solutions (provider_id, name, description, category)
            VALUES ($1, $2, $3, $4)
            RETURNING {SOLUTION_COLUMNS}
            "#
        );

        let solution = sqlx::query_as::<_, SolutionDBResponse>(&query)
            .bind(request.provider_id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.category)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(solution)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {SOLUTION_COLUMNS} FROM solutions WHERE id = $1");
        let solution = sqlx::query_as::<_, SolutionDBResponse>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(solution)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let query = format!("SELECT {SOLUTION_COLUMNS} FROM solutions WHERE id = ANY($1)");
        let solutions = sqlx::query_as::<_, SolutionDBResponse>(&query)
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(solutions.into_iter().map(|s| (s.id, s)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {SOLUTION_COLUMNS} FROM solutions WHERE 1=1");
        let mut bind_idx = 0;

        if filter.category.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND category = ${bind_idx}"));
        }
        if filter.provider_id.is_some() {
            bind_idx += 1;
            query.push_str(&format!(" AND provider_id = ${bind_idx}"));
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, SolutionDBResponse>(&query);
        if let Some(category) = &filter.category {
            sql_query = sql_query.bind(category);
        }
        if let Some(provider_id) = filter.provider_id {
            sql_query = sql_query.bind(provider_id);
        }

        let solutions = sql_query.fetch_all(&mut *self.db).await?;
        Ok(solutions)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE solutions
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category)
            WHERE id = $1
            RETURNING {SOLUTION_COLUMNS}
            "#
        );

        let solution = sqlx::query_as::<_, SolutionDBResponse>(&query)
            .bind(id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(&request.category)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(solution)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM solutions WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Solutions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
