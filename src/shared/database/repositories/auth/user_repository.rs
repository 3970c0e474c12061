use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use anyhow::{Context, Result};
use uuid::Uuid;
use crate::domains::auth::models::{
    Account, Activity, ContactPreferences, MarkForDeletion, Profile, Timestamps, User,
    PARTICIPANT_ROLE,
};

const USER_COLUMNS: &str = r#"
    id, account_type, account_id, password_hash, account_confirmed_at, preferred_language,
    roles, profiles, contact_preferences,
    created_at, last_login, last_token_refresh, reminder_to_confirm_sent_at, marked_for_deletion
"#;

/// 사용자 Repository (인스턴스별 분할)
/// User repository, every query scoped by instance_id
pub struct UserRepository {
    pool: PgPool
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, instance_id: &str, user: &User) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (
                instance_id, id, account_type, account_id, password_hash, account_confirmed_at,
                preferred_language, roles, profiles, contact_preferences,
                created_at, last_login, last_token_refresh, reminder_to_confirm_sent_at,
                marked_for_deletion
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id
            "#,
        )
        .bind(instance_id)
        .bind(user.id)
        .bind(&user.account.account_type)
        .bind(&user.account.account_id)
        .bind(&user.account.password_hash)
        .bind(user.account.account_confirmed_at)
        .bind(&user.account.preferred_language)
        .bind(&user.roles)
        .bind(Json(&user.profiles))
        .bind(Json(&user.contact_preferences))
        .bind(user.timestamps.created_at)
        .bind(user.timestamps.last_login)
        .bind(user.timestamps.last_token_refresh)
        .bind(user.timestamps.reminder_to_confirm_sent_at)
        .bind(user.timestamps.marked_for_deletion)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(row.get("id"))
    }

    // ID로 사용자 조회
    // Get user by ID
    pub async fn get_user_by_id(&self, instance_id: &str, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE instance_id = $1 AND id = $2"
        ))
        .bind(instance_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by id")?;

        Ok(row.as_ref().map(user_from_row))
    }

    // 계정 ID(이메일)로 사용자 조회 (로그인용)
    // Get user by account id (for login)
    pub async fn get_user_by_account_id(
        &self,
        instance_id: &str,
        account_id: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE instance_id = $1 AND account_id = $2"
        ))
        .bind(instance_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by account id")?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn record_activity(
        &self,
        instance_id: &str,
        id: Uuid,
        activity: Activity,
        at: i64,
    ) -> Result<bool> {
        let sql = match activity {
            Activity::Login => {
                "UPDATE users SET last_login = $3 WHERE instance_id = $1 AND id = $2"
            }
            Activity::TokenRefresh => {
                "UPDATE users SET last_token_refresh = $3 WHERE instance_id = $1 AND id = $2"
            }
        };

        let result = sqlx::query(sql)
            .bind(instance_id)
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .context("Failed to record user activity")?;

        Ok(result.rows_affected() == 1)
    }

    /// 삭제 예정 플래그 조건부 업데이트 (단일 UPDATE)
    /// Conditional mark/reset in a single statement
    pub async fn update_marked_for_deletion(
        &self,
        instance_id: &str,
        id: Uuid,
        update: MarkForDeletion,
    ) -> Result<bool> {
        let query = match update {
            MarkForDeletion::Mark { delete_at, inactive_before } => sqlx::query(
                r#"
                UPDATE users
                SET marked_for_deletion = $3
                WHERE instance_id = $1 AND id = $2
                  AND marked_for_deletion = 0
                  AND last_login < $4
                  AND last_token_refresh < $4
                "#,
            )
            .bind(instance_id)
            .bind(id)
            .bind(delete_at)
            .bind(inactive_before),
            MarkForDeletion::Reset => sqlx::query(
                r#"
                UPDATE users
                SET marked_for_deletion = 0
                WHERE instance_id = $1 AND id = $2 AND marked_for_deletion <> 0
                "#,
            )
            .bind(instance_id)
            .bind(id),
        };

        let result = query
            .execute(&self.pool)
            .await
            .context("Failed to update marked_for_deletion")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_reminder_sent(&self, instance_id: &str, id: Uuid, at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reminder_to_confirm_sent_at = $3
            WHERE instance_id = $1 AND id = $2 AND reminder_to_confirm_sent_at = 0
            "#,
        )
        .bind(instance_id)
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .context("Failed to mark reminder as sent")?;

        Ok(result.rows_affected() == 1)
    }

    // 발송 실패 시 기록 해제 (다른 값으로 바뀌었으면 그대로 둠)
    pub async fn release_reminder_claim(
        &self,
        instance_id: &str,
        id: Uuid,
        claimed_at: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET reminder_to_confirm_sent_at = 0
            WHERE instance_id = $1 AND id = $2 AND reminder_to_confirm_sent_at = $3
            "#,
        )
        .bind(instance_id)
        .bind(id)
        .bind(claimed_at)
        .execute(&self.pool)
        .await
        .context("Failed to release reminder claim")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_user(&self, instance_id: &str, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE instance_id = $1 AND id = $2")
            .bind(instance_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_unverified_users(&self, instance_id: &str, created_before: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE instance_id = $1 AND account_confirmed_at = 0 AND created_at < $2
            "#,
        )
        .bind(instance_id)
        .bind(created_before)
        .execute(&self.pool)
        .await
        .context("Failed to delete unverified users")?;

        Ok(result.rows_affected())
    }

    pub async fn find_unverified_users_for_reminder(
        &self,
        instance_id: &str,
        created_after: i64,
        created_before: i64,
    ) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE instance_id = $1
              AND account_confirmed_at = 0
              AND reminder_to_confirm_sent_at = 0
              AND created_at >= $2 AND created_at < $3
            ORDER BY created_at, account_id
            "#
        ))
        .bind(instance_id)
        .bind(created_after)
        .bind(created_before)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find unverified users")?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn find_inactive_users(&self, instance_id: &str, inactive_before: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE instance_id = $1
              AND roles = ARRAY[$3]::TEXT[]
              AND marked_for_deletion = 0
              AND last_login < $2
              AND last_token_refresh < $2
            ORDER BY created_at, account_id
            "#
        ))
        .bind(instance_id)
        .bind(inactive_before)
        .bind(PARTICIPANT_ROLE)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find inactive users")?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    pub async fn find_users_marked_for_deletion(&self, instance_id: &str, now: i64) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE instance_id = $1 AND marked_for_deletion > 0 AND marked_for_deletion < $2
            ORDER BY created_at, account_id
            "#
        ))
        .bind(instance_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find users marked for deletion")?;

        Ok(rows.iter().map(user_from_row).collect())
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        account: Account {
            account_type: row.get("account_type"),
            account_id: row.get("account_id"),
            password_hash: row.get("password_hash"),
            account_confirmed_at: row.get("account_confirmed_at"),
            preferred_language: row.get("preferred_language"),
        },
        roles: row.get("roles"),
        profiles: row.get::<Json<Vec<Profile>>, _>("profiles").0,
        contact_preferences: row.get::<Json<ContactPreferences>, _>("contact_preferences").0,
        timestamps: Timestamps {
            created_at: row.get("created_at"),
            last_login: row.get("last_login"),
            last_token_refresh: row.get("last_token_refresh"),
            reminder_to_confirm_sent_at: row.get("reminder_to_confirm_sent_at"),
            marked_for_deletion: row.get("marked_for_deletion"),
        },
    }
}
