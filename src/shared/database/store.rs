use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::auth::models::{
    Activity, MarkForDeletion, RenewToken, RotationWindow, TempToken, User,
};

/// 인스턴스 (테넌트) 레지스트리 항목
/// Entry of the instance (tenant) registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub instance_id: String,
}

/// 테넌트별로 분할된 저장소
/// Tenant-partitioned persistence used by the rotation manager and the lifecycle sweeps.
///
/// 역할: 리포지토리들을 하나의 계약으로 묶음 (PostgreSQL / 메모리 구현)
///
/// Every record set is addressed by `instance_id`. Methods that race with other
/// actors (`find_and_update_renew_token`, `update_marked_for_deletion`,
/// `mark_reminder_sent`) must be single atomic conditional writes, never
/// read-then-write. Time is always passed in by the caller (Unix epoch seconds).
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// 등록된 모든 인스턴스
    /// All registered instances
    async fn get_all_instances(&self) -> Result<Vec<Instance>>;

    // ---------- users ----------

    /// 사용자 추가 (account_id 중복 시 에러)
    /// Insert a user; fails when the account id already exists in the instance
    async fn add_user(&self, instance_id: &str, user: &User) -> Result<Uuid>;

    async fn get_user_by_id(&self, instance_id: &str, user_id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_account_id(
        &self,
        instance_id: &str,
        account_id: &str,
    ) -> Result<Option<User>>;

    /// 로그인 / 토큰 갱신 시각 기록
    /// Record a login or token refresh at `at`
    async fn record_activity(
        &self,
        instance_id: &str,
        user_id: Uuid,
        activity: Activity,
        at: i64,
    ) -> Result<bool>;

    /// 삭제 예정 플래그 조건부 업데이트. 적용되었으면 true.
    /// Conditional mark/reset of `marked_for_deletion`; `true` if the write applied
    async fn update_marked_for_deletion(
        &self,
        instance_id: &str,
        user_id: Uuid,
        update: MarkForDeletion,
    ) -> Result<bool>;

    /// 인증 리마인더 발송 기록 (아직 기록 없을 때만)
    /// Set `reminder_to_confirm_sent_at` only if it is still 0
    async fn mark_reminder_sent(&self, instance_id: &str, user_id: Uuid, at: i64) -> Result<bool>;

    /// 리마인더 발송 기록 해제 (기록값이 `claimed_at` 일 때만)
    /// Reset `reminder_to_confirm_sent_at` to 0 only while it still equals `claimed_at`
    async fn release_reminder_claim(
        &self,
        instance_id: &str,
        user_id: Uuid,
        claimed_at: i64,
    ) -> Result<bool>;

    async fn delete_user(&self, instance_id: &str, user_id: Uuid) -> Result<bool>;

    /// 미인증 상태로 `created_before` 이전에 생성된 사용자 삭제
    /// Delete unconfirmed users created before `created_before`
    async fn delete_unverified_users(&self, instance_id: &str, created_before: i64) -> Result<u64>;

    /// 리마인더 대상: 미인증, 리마인더 미발송, created_at ∈ [created_after, created_before)
    /// Unconfirmed users without a reminder, created inside the window
    async fn find_unverified_users_for_reminder(
        &self,
        instance_id: &str,
        created_after: i64,
        created_before: i64,
    ) -> Result<Vec<User>>;

    /// 비활성 참가자: last_login, last_token_refresh 모두 `inactive_before` 이전, 삭제 예정 아님
    /// Plain participants whose login and refresh are both older than `inactive_before`
    /// and who are not marked yet, ordered by creation time
    async fn find_inactive_users(&self, instance_id: &str, inactive_before: i64)
    -> Result<Vec<User>>;

    /// 삭제 예정 시각이 지난 사용자
    /// Users whose `marked_for_deletion` is set and earlier than `now`
    async fn find_users_marked_for_deletion(&self, instance_id: &str, now: i64)
    -> Result<Vec<User>>;

    // ---------- renew tokens ----------

    /// 토큰 행 삽입 (이미 있으면 무시). 삽입되었으면 true.
    /// Insert a token row unless one with the same token exists; `true` if inserted
    async fn create_renew_token(&self, instance_id: &str, token: &RenewToken) -> Result<bool>;

    /// 회전 원자적 조건부 업데이트
    /// Atomic rotation step.
    ///
    /// Matches `(user_id, renew_token, expires_at > window.now)`. If `next_token`
    /// is empty it becomes `next_token` and `expires_at` becomes
    /// `window.grace_expires_at`; otherwise the row is left as is. Returns the row
    /// after the write, or `None` when nothing matched.
    async fn find_and_update_renew_token(
        &self,
        instance_id: &str,
        user_id: Uuid,
        renew_token: &str,
        next_token: &str,
        window: RotationWindow,
    ) -> Result<Option<RenewToken>>;

    async fn delete_renew_token_by_token(&self, instance_id: &str, renew_token: &str)
    -> Result<bool>;

    async fn delete_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64>;

    async fn delete_expired_renew_tokens(&self, instance_id: &str, now: i64) -> Result<u64>;

    async fn count_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64>;

    // ---------- temp tokens ----------

    async fn add_temp_token(&self, token: &TempToken) -> Result<()>;

    async fn get_temp_token(&self, token: &str) -> Result<Option<TempToken>>;

    /// purpose 가 None 이면 모든 목적
    /// `purpose = None` matches every purpose
    async fn get_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<Vec<TempToken>>;

    async fn delete_temp_token(&self, token: &str) -> Result<bool>;

    async fn delete_all_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<u64>;

    async fn delete_temp_tokens_expired_before(
        &self,
        instance_id: &str,
        purpose: Option<&str>,
        expires_before: i64,
    ) -> Result<u64>;
}
