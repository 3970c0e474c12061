use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use uuid::Uuid;
use crate::domains::auth::models::TempToken;

/// 임시 토큰 Repository
/// Temporary token repository (lookup by token, enumeration by instance/user/purpose)
pub struct TempTokenRepository {
    pool: PgPool,
}

impl TempTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, token: &TempToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO temp_tokens (token, instance_id, user_id, purpose, info, expiration)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&token.token)
        .bind(&token.instance_id)
        .bind(token.user_id)
        .bind(&token.purpose)
        .bind(Json(&token.info))
        .bind(token.expiration)
        .execute(&self.pool)
        .await
        .context("Failed to create temp token")?;

        Ok(())
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<TempToken>> {
        let row = sqlx::query(
            r#"
            SELECT token, instance_id, user_id, purpose, info, expiration
            FROM temp_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find temp token")?;

        Ok(row.as_ref().map(temp_token_from_row))
    }

    // purpose 가 NULL 이면 모든 목적 매칭
    pub async fn find_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<Vec<TempToken>> {
        let rows = sqlx::query(
            r#"
            SELECT token, instance_id, user_id, purpose, info, expiration
            FROM temp_tokens
            WHERE instance_id = $1 AND user_id = $2 AND ($3::TEXT IS NULL OR purpose = $3)
            "#,
        )
        .bind(instance_id)
        .bind(user_id)
        .bind(purpose)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find temp tokens for user")?;

        Ok(rows.iter().map(temp_token_from_row).collect())
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM temp_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete temp token")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_all_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM temp_tokens
            WHERE instance_id = $1 AND user_id = $2 AND ($3::TEXT IS NULL OR purpose = $3)
            "#,
        )
        .bind(instance_id)
        .bind(user_id)
        .bind(purpose)
        .execute(&self.pool)
        .await
        .context("Failed to delete temp tokens for user")?;

        Ok(result.rows_affected())
    }

    pub async fn delete_expired_before(
        &self,
        instance_id: &str,
        purpose: Option<&str>,
        expires_before: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM temp_tokens
            WHERE instance_id = $1 AND ($2::TEXT IS NULL OR purpose = $2) AND expiration < $3
            "#,
        )
        .bind(instance_id)
        .bind(purpose)
        .bind(expires_before)
        .execute(&self.pool)
        .await
        .context("Failed to delete expired temp tokens")?;

        Ok(result.rows_affected())
    }
}

fn temp_token_from_row(row: &PgRow) -> TempToken {
    TempToken {
        token: row.get("token"),
        instance_id: row.get("instance_id"),
        user_id: row.get("user_id"),
        purpose: row.get("purpose"),
        info: row.get::<Json<HashMap<String, String>>, _>("info").0,
        expiration: row.get("expiration"),
    }
}
