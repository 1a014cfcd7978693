//! Database repository for password reset tokens.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::password,
    config::Config,
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::password_reset_tokens::{
            PasswordResetToken, PasswordResetTokenCreateRequest, PasswordResetTokenFilter, PasswordResetTokenResponse,
            PasswordResetTokenUpdateRequest,
        },
    },
    types::{abbrev_uuid, UserId},
};

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expires_at, created_at, used_at";

pub struct PasswordResetTokens<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for PasswordResetTokens<'c> {
    type CreateRequest = PasswordResetTokenCreateRequest;
    type UpdateRequest = PasswordResetTokenUpdateRequest;
    type Response = PasswordResetTokenResponse;
    type Id = Uuid;
    type Filter = PasswordResetTokenFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            INSERT INTO password_reset_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {TOKEN_COLUMNS}
            "#
        );

        let token = sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(request.user_id)
            .bind(&request.token_hash)
            .bind(request.expires_at)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(token)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM password_reset_tokens WHERE id = $1");
        let token = sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(token)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM password_reset_tokens WHERE id = ANY($1)");
        let tokens = sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(tokens.into_iter().map(|t| (t.id, t)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {TOKEN_COLUMNS} FROM password_reset_tokens WHERE 1=1");

        if filter.user_id.is_some() {
            query.push_str(" AND user_id = $1");
        }

        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, PasswordResetToken>(&query);
        if let Some(user_id) = filter.user_id {
            sql_query = sql_query.bind(user_id);
        }

        let tokens = sql_query.fetch_all(&mut *self.db).await?;
        Ok(tokens)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let query = format!(
            r#"
            UPDATE password_reset_tokens
            SET used_at = COALESCE($2, used_at)
            WHERE id = $1
            RETURNING {TOKEN_COLUMNS}
            "#
        );

        let token = sqlx::query_as::<_, PasswordResetToken>(&query)
            .bind(id)
            .bind(request.used_at)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(token)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> PasswordResetTokens<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create a password reset token for a user.
    ///
    /// Prior outstanding tokens for the user are deleted first, so at most one
    /// token is valid per user at any time. Returns the raw token (for the
    /// email link) alongside the stored row; the raw value is never persisted.
    #[instrument(skip(self, config), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_for_user(&mut self, user_id: UserId, config: &Config) -> Result<(String, PasswordResetToken)> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        let raw_token = password::generate_reset_token();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(config.auth.native.password_reset_token_duration).unwrap_or(chrono::Duration::hours(1));

        // Hash on a blocking thread; argon2 is too slow for the async runtime
        let params = password::Argon2Params {
            memory_kib: config.auth.native.password.argon2_memory_kib,
            iterations: config.auth.native.password.argon2_iterations,
            parallelism: config.auth.native.password.argon2_parallelism,
        };
        let token_hash = tokio::task::spawn_blocking({
            let raw_token = raw_token.clone();
            move || password::hash_string_with_params(&raw_token, Some(params))
        })
        .await
        .map_err(|e| DbError::Other(anyhow::anyhow!("join token hashing task: {e}")))?
        .map_err(|e| DbError::Other(anyhow::anyhow!(e)))?;

        let request = PasswordResetTokenCreateRequest {
            user_id,
            token_hash,
            expires_at,
        };

        let token = self.create(&request).await?;
        Ok((raw_token, token))
    }

    /// Find a valid token by ID and verify the raw token.
    ///
    /// Fails closed: not found, already used, expired, and hash mismatch all
    /// return `None`. Expired tokens are deleted on detection.
    #[instrument(skip(self, raw_token), err)]
    pub async fn find_valid_token_by_id(&mut self, token_id: Uuid, raw_token: &str) -> Result<Option<PasswordResetToken>> {
        let token = match self.get_by_id(token_id).await? {
            Some(token) => token,
            None => return Ok(None),
        };

        if token.used_at.is_some() {
            return Ok(None);
        }
        if Utc::now() > token.expires_at {
            self.delete(token_id).await?;
            return Ok(None);
        }

        // Verify the raw token matches the hash
        match password::verify_string(raw_token, &token.token_hash) {
            Ok(true) => Ok(Some(token)),
            Ok(false) => Ok(None),
            Err(e) => {
                tracing::error!("Token verification error for token {}: {:?}", token_id, e);
                Ok(None)
            }
        }
    }

    /// Mark a token used, but only if it is still unused and unexpired.
    ///
    /// The condition lives in the UPDATE itself so concurrent double-submits
    /// cannot both succeed. Returns whether this call won the race.
    #[instrument(skip(self), err)]
    pub async fn consume(&mut self, token_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(token_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Invalidate all outstanding tokens for a user
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn invalidate_for_user(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE user_id = $1 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::Users;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn seed_user(conn: &mut PgConnection) -> UserId {
        let mut users = Users::new(conn);
        let user = users
            .create(&UserCreateDBRequest {
                username: format!("tokenuser_{}", Uuid::new_v4().simple()),
                email: format!("{}@example.com", Uuid::new_v4().simple()),
                password_hash: "$argon2id$fake$hash".to_string(),
                display_name: None,
                role: Role::SolutionSeeker,
            })
            .await
            .unwrap();
        user.id
    }

    fn fast_config() -> Config {
        // Light argon2 params keep the tests quick
        Config {
            secret_key: Some("test-secret".to_string()),
            ..Default::default()
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_token_validates_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let config = fast_config();

        let mut repo = PasswordResetTokens::new(&mut conn);
        let (raw, token) = repo.create_for_user(user_id, &config).await.unwrap();

        let found = repo.find_valid_token_by_id(token.id, &raw).await.unwrap();
        assert!(found.is_some());

        // First consume wins, second loses
        assert!(repo.consume(token.id).await.unwrap());
        assert!(!repo.consume(token.id).await.unwrap());

        // And a used token no longer validates
        let found = repo.find_valid_token_by_id(token.id, &raw).await.unwrap();
        assert!(found.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_wrong_raw_token_rejected(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let config = fast_config();

        let mut repo = PasswordResetTokens::new(&mut conn);
        let (_raw, token) = repo.create_for_user(user_id, &config).await.unwrap();

        let found = repo.find_valid_token_by_id(token.id, "not-the-token").await.unwrap();
        assert!(found.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_expired_token_invalid_and_deleted(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;

        let mut repo = PasswordResetTokens::new(&mut conn);
        let raw = password::generate_reset_token();
        let token_hash = password::hash_string_with_params(&raw, Some(crate::test_utils::test_argon2_params())).unwrap();
        let token = repo
            .create(&PasswordResetTokenCreateRequest {
                user_id,
                token_hash,
                expires_at: Utc::now() - chrono::Duration::minutes(5),
            })
            .await
            .unwrap();

        // Expired regardless of the used flag
        let found = repo.find_valid_token_by_id(token.id, &raw).await.unwrap();
        assert!(found.is_none());

        // Deleted as a side effect of detection
        assert!(repo.get_by_id(token.id).await.unwrap().is_none());

        // Consume on an expired token also fails closed
        assert!(!repo.consume(token.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_new_token_purges_outstanding(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = seed_user(&mut conn).await;
        let config = fast_config();

        let mut repo = PasswordResetTokens::new(&mut conn);
        let (raw1, token1) = repo.create_for_user(user_id, &config).await.unwrap();
        let (raw2, token2) = repo.create_for_user(user_id, &config).await.unwrap();

        // The first token is gone, only the newest is usable
        assert!(repo.find_valid_token_by_id(token1.id, &raw1).await.unwrap().is_none());
        assert!(repo.find_valid_token_by_id(token2.id, &raw2).await.unwrap().is_some());
    }
}
