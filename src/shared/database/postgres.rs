use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domains::auth::models::{
    Activity, MarkForDeletion, RenewToken, RotationWindow, TempToken, User,
};
use crate::shared::database::connection::Database;
use crate::shared::database::repositories::{
    InstanceRepository, RenewTokenRepository, TempTokenRepository, UserRepository,
};
use crate::shared::database::store::{Instance, TenantStore};

// PostgreSQL 기반 TenantStore 구현
// 역할: 각 리포지토리를 호출 시점에 생성해서 위임
// PostgreSQL-backed TenantStore; builds repositories per call and delegates
impl Database {
    fn users(&self) -> UserRepository {
        UserRepository::new(self.pool().clone())
    }

    fn renew_tokens(&self) -> RenewTokenRepository {
        RenewTokenRepository::new(self.pool().clone())
    }

    fn temp_tokens(&self) -> TempTokenRepository {
        TempTokenRepository::new(self.pool().clone())
    }
}

#[async_trait]
impl TenantStore for Database {
    async fn get_all_instances(&self) -> Result<Vec<Instance>> {
        InstanceRepository::new(self.pool().clone()).get_all().await
    }

    async fn add_user(&self, instance_id: &str, user: &User) -> Result<Uuid> {
        self.users().create_user(instance_id, user).await
    }

    async fn get_user_by_id(&self, instance_id: &str, user_id: Uuid) -> Result<Option<User>> {
        self.users().get_user_by_id(instance_id, user_id).await
    }

    async fn get_user_by_account_id(
        &self,
        instance_id: &str,
        account_id: &str,
    ) -> Result<Option<User>> {
        self.users().get_user_by_account_id(instance_id, account_id).await
    }

    async fn record_activity(
        &self,
        instance_id: &str,
        user_id: Uuid,
        activity: Activity,
        at: i64,
    ) -> Result<bool> {
        self.users().record_activity(instance_id, user_id, activity, at).await
    }

    async fn update_marked_for_deletion(
        &self,
        instance_id: &str,
        user_id: Uuid,
        update: MarkForDeletion,
    ) -> Result<bool> {
        self.users()
            .update_marked_for_deletion(instance_id, user_id, update)
            .await
    }

    async fn mark_reminder_sent(&self, instance_id: &str, user_id: Uuid, at: i64) -> Result<bool> {
        self.users().mark_reminder_sent(instance_id, user_id, at).await
    }

    async fn release_reminder_claim(
        &self,
        instance_id: &str,
        user_id: Uuid,
        claimed_at: i64,
    ) -> Result<bool> {
        self.users()
            .release_reminder_claim(instance_id, user_id, claimed_at)
            .await
    }

    async fn delete_user(&self, instance_id: &str, user_id: Uuid) -> Result<bool> {
        self.users().delete_user(instance_id, user_id).await
    }

    async fn delete_unverified_users(&self, instance_id: &str, created_before: i64) -> Result<u64> {
        self.users()
            .delete_unverified_users(instance_id, created_before)
            .await
    }

    async fn find_unverified_users_for_reminder(
        &self,
        instance_id: &str,
        created_after: i64,
        created_before: i64,
    ) -> Result<Vec<User>> {
        self.users()
            .find_unverified_users_for_reminder(instance_id, created_after, created_before)
            .await
    }

    async fn find_inactive_users(
        &self,
        instance_id: &str,
        inactive_before: i64,
    ) -> Result<Vec<User>> {
        self.users().find_inactive_users(instance_id, inactive_before).await
    }

    async fn find_users_marked_for_deletion(
        &self,
        instance_id: &str,
        now: i64,
    ) -> Result<Vec<User>> {
        self.users().find_users_marked_for_deletion(instance_id, now).await
    }

    async fn create_renew_token(&self, instance_id: &str, token: &RenewToken) -> Result<bool> {
        self.renew_tokens().create(instance_id, token).await
    }

    async fn find_and_update_renew_token(
        &self,
        instance_id: &str,
        user_id: Uuid,
        renew_token: &str,
        next_token: &str,
        window: RotationWindow,
    ) -> Result<Option<RenewToken>> {
        self.renew_tokens()
            .find_and_update(instance_id, user_id, renew_token, next_token, window)
            .await
    }

    async fn delete_renew_token_by_token(
        &self,
        instance_id: &str,
        renew_token: &str,
    ) -> Result<bool> {
        self.renew_tokens().delete_by_token(instance_id, renew_token).await
    }

    async fn delete_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        self.renew_tokens().delete_all_for_user(instance_id, user_id).await
    }

    async fn delete_expired_renew_tokens(&self, instance_id: &str, now: i64) -> Result<u64> {
        self.renew_tokens().delete_expired(instance_id, now).await
    }

    async fn count_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        self.renew_tokens().count_for_user(instance_id, user_id).await
    }

    async fn add_temp_token(&self, token: &TempToken) -> Result<()> {
        self.temp_tokens().create(token).await
    }

    async fn get_temp_token(&self, token: &str) -> Result<Option<TempToken>> {
        self.temp_tokens().find_by_token(token).await
    }

    async fn get_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<Vec<TempToken>> {
        self.temp_tokens().find_for_user(instance_id, user_id, purpose).await
    }

    async fn delete_temp_token(&self, token: &str) -> Result<bool> {
        self.temp_tokens().delete_by_token(token).await
    }

    async fn delete_all_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<u64> {
        self.temp_tokens()
            .delete_all_for_user(instance_id, user_id, purpose)
            .await
    }

    async fn delete_temp_tokens_expired_before(
        &self,
        instance_id: &str,
        purpose: Option<&str>,
        expires_before: i64,
    ) -> Result<u64> {
        self.temp_tokens()
            .delete_expired_before(instance_id, purpose, expires_before)
            .await
    }
}
