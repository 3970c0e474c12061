use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use uuid::Uuid;
use crate::domains::auth::models::{RenewToken, RotationWindow};

/// Renew Token Repository
/// Renew Token 데이터베이스 작업 처리
pub struct RenewTokenRepository {
    pool: PgPool,
}

impl RenewTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Renew Token 생성 (저장). 같은 토큰이 이미 있으면 아무것도 하지 않음
    /// Create and store renew token; a row with the same token is left alone
    pub async fn create(&self, instance_id: &str, token: &RenewToken) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO renew_tokens (instance_id, user_id, renew_token, expires_at, next_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (instance_id, renew_token) DO NOTHING
            "#,
        )
        .bind(instance_id)
        .bind(token.user_id)
        .bind(&token.renew_token)
        .bind(token.expires_at)
        .bind(token.next_token.as_deref())
        .execute(&self.pool)
        .await
        .context("Failed to create renew token")?;

        Ok(result.rows_affected() == 1)
    }

    /// 회전 (조회 + 조건부 업데이트를 한 번에)
    /// Rotation lookup-and-set in one statement.
    ///
    /// `SET` 의 우변은 업데이트 전 값을 참조하므로 next_token 이 비어 있을 때만
    /// 새 값과 유예 만료 시각이 들어감. 동시 요청은 행 잠금 후 WHERE 를 재평가함.
    /// The right-hand sides see the pre-update row, so next_token and the grace
    /// expiry are only written when next_token was NULL. Concurrent updates queue
    /// on the row lock and re-evaluate the predicate, so the loser returns the
    /// winner's next_token unchanged.
    pub async fn find_and_update(
        &self,
        instance_id: &str,
        user_id: Uuid,
        renew_token: &str,
        next_token: &str,
        window: RotationWindow,
    ) -> Result<Option<RenewToken>> {
        let row = sqlx::query(
            r#"
            UPDATE renew_tokens
            SET next_token = COALESCE(next_token, $4),
                expires_at = CASE WHEN next_token IS NULL THEN $6 ELSE expires_at END
            WHERE instance_id = $1 AND user_id = $2 AND renew_token = $3 AND expires_at > $5
            RETURNING user_id, renew_token, expires_at, next_token
            "#,
        )
        .bind(instance_id)
        .bind(user_id)
        .bind(renew_token)
        .bind(next_token)
        .bind(window.now)
        .bind(window.grace_expires_at)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to rotate renew token")?;

        Ok(row.as_ref().map(renew_token_from_row))
    }

    /// 단일 토큰 삭제 (로그아웃)
    /// Delete one token (logout)
    pub async fn delete_by_token(&self, instance_id: &str, renew_token: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM renew_tokens WHERE instance_id = $1 AND renew_token = $2",
        )
        .bind(instance_id)
        .bind(renew_token)
        .execute(&self.pool)
        .await
        .context("Failed to delete renew token")?;

        Ok(result.rows_affected() == 1)
    }

    /// 사용자의 모든 Renew Token 삭제
    /// Delete all renew tokens for a user
    pub async fn delete_all_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM renew_tokens WHERE instance_id = $1 AND user_id = $2",
        )
        .bind(instance_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .context("Failed to delete renew tokens for user")?;

        Ok(result.rows_affected())
    }

    /// 만료된 토큰 삭제 (정리 작업)
    /// Delete expired tokens (cleanup)
    pub async fn delete_expired(&self, instance_id: &str, now: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM renew_tokens WHERE instance_id = $1 AND expires_at < $2",
        )
        .bind(instance_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to delete expired renew tokens")?;

        Ok(result.rows_affected())
    }

    /// 특정 사용자의 Renew Token 개수 조회
    /// Count renew tokens for a user
    pub async fn count_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM renew_tokens
            WHERE instance_id = $1 AND user_id = $2
            "#,
        )
        .bind(instance_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count renew tokens")?;

        Ok(row.get::<i64, _>("count").max(0) as u64)
    }
}

fn renew_token_from_row(row: &PgRow) -> RenewToken {
    RenewToken {
        user_id: row.get("user_id"),
        renew_token: row.get("renew_token"),
        expires_at: row.get("expires_at"),
        next_token: row.get("next_token"),
    }
}
