use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::domains::auth::models::{
    Activity, MarkForDeletion, RenewToken, RotationWindow, TempToken, User,
};
use crate::shared::database::store::{Instance, TenantStore};

/// 메모리 저장소 (테스트 / 로컬 실행용)
/// In-memory tenant store.
///
/// 모든 조건부 업데이트는 하나의 락 안에서 수행되므로 원자적
/// Every conditional write happens under a single lock, so it is atomic with
/// respect to every other call. The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct MemoryTenantStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    instances: Vec<Instance>,
    partitions: HashMap<String, Partition>,
    temp_tokens: HashMap<String, TempToken>,
}

#[derive(Debug, Default)]
struct Partition {
    users: HashMap<Uuid, User>,
    renew_tokens: HashMap<String, RenewToken>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 인스턴스가 등록된 저장소 생성
    /// Store with the given instances registered
    pub fn with_instances<I, S>(instance_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut state = store.inner.lock();
            for id in instance_ids {
                let instance_id = id.into();
                state.partitions.entry(instance_id.clone()).or_default();
                state.instances.push(Instance { instance_id });
            }
        }
        store
    }
}

impl MemoryState {
    fn partition(&mut self, instance_id: &str) -> &mut Partition {
        self.partitions.entry(instance_id.to_string()).or_default()
    }
}

fn sorted_by_creation(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| {
        a.timestamps
            .created_at
            .cmp(&b.timestamps.created_at)
            .then_with(|| a.account.account_id.cmp(&b.account.account_id))
    });
    users
}

fn purpose_matches(token: &TempToken, purpose: Option<&str>) -> bool {
    purpose.map_or(true, |p| token.purpose == p)
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn get_all_instances(&self) -> Result<Vec<Instance>> {
        Ok(self.inner.lock().instances.clone())
    }

    async fn add_user(&self, instance_id: &str, user: &User) -> Result<Uuid> {
        let mut state = self.inner.lock();
        let partition = state.partition(instance_id);

        if partition
            .users
            .values()
            .any(|u| u.account.account_id == user.account.account_id)
        {
            bail!("user already exists: {}", user.account.account_id);
        }
        if partition.users.contains_key(&user.id) {
            bail!("duplicate user id: {}", user.id);
        }

        partition.users.insert(user.id, user.clone());
        Ok(user.id)
    }

    async fn get_user_by_id(&self, instance_id: &str, user_id: Uuid) -> Result<Option<User>> {
        let mut state = self.inner.lock();
        Ok(state.partition(instance_id).users.get(&user_id).cloned())
    }

    async fn get_user_by_account_id(
        &self,
        instance_id: &str,
        account_id: &str,
    ) -> Result<Option<User>> {
        let mut state = self.inner.lock();
        Ok(state
            .partition(instance_id)
            .users
            .values()
            .find(|u| u.account.account_id == account_id)
            .cloned())
    }

    async fn record_activity(
        &self,
        instance_id: &str,
        user_id: Uuid,
        activity: Activity,
        at: i64,
    ) -> Result<bool> {
        let mut state = self.inner.lock();
        let Some(user) = state.partition(instance_id).users.get_mut(&user_id) else {
            return Ok(false);
        };
        match activity {
            Activity::Login => user.timestamps.last_login = at,
            Activity::TokenRefresh => user.timestamps.last_token_refresh = at,
        }
        Ok(true)
    }

    async fn update_marked_for_deletion(
        &self,
        instance_id: &str,
        user_id: Uuid,
        update: MarkForDeletion,
    ) -> Result<bool> {
        let mut state = self.inner.lock();
        let Some(user) = state.partition(instance_id).users.get_mut(&user_id) else {
            return Ok(false);
        };
        let ts = &mut user.timestamps;

        match update {
            MarkForDeletion::Mark {
                delete_at,
                inactive_before,
            } => {
                if ts.marked_for_deletion != 0
                    || ts.last_login >= inactive_before
                    || ts.last_token_refresh >= inactive_before
                {
                    return Ok(false);
                }
                ts.marked_for_deletion = delete_at;
            }
            MarkForDeletion::Reset => {
                if ts.marked_for_deletion == 0 {
                    return Ok(false);
                }
                ts.marked_for_deletion = 0;
            }
        }
        Ok(true)
    }

    async fn mark_reminder_sent(&self, instance_id: &str, user_id: Uuid, at: i64) -> Result<bool> {
        let mut state = self.inner.lock();
        match state.partition(instance_id).users.get_mut(&user_id) {
            Some(user) if user.timestamps.reminder_to_confirm_sent_at == 0 => {
                user.timestamps.reminder_to_confirm_sent_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_reminder_claim(
        &self,
        instance_id: &str,
        user_id: Uuid,
        claimed_at: i64,
    ) -> Result<bool> {
        let mut state = self.inner.lock();
        match state.partition(instance_id).users.get_mut(&user_id) {
            Some(user) if user.timestamps.reminder_to_confirm_sent_at == claimed_at => {
                user.timestamps.reminder_to_confirm_sent_at = 0;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_user(&self, instance_id: &str, user_id: Uuid) -> Result<bool> {
        let mut state = self.inner.lock();
        Ok(state.partition(instance_id).users.remove(&user_id).is_some())
    }

    async fn delete_unverified_users(&self, instance_id: &str, created_before: i64) -> Result<u64> {
        let mut state = self.inner.lock();
        let users = &mut state.partition(instance_id).users;
        let before = users.len();
        users.retain(|_, u| {
            !(u.account.account_confirmed_at == 0 && u.timestamps.created_at < created_before)
        });
        Ok((before - users.len()) as u64)
    }

    async fn find_unverified_users_for_reminder(
        &self,
        instance_id: &str,
        created_after: i64,
        created_before: i64,
    ) -> Result<Vec<User>> {
        let mut state = self.inner.lock();
        let users = state
            .partition(instance_id)
            .users
            .values()
            .filter(|u| {
                u.account.account_confirmed_at == 0
                    && u.timestamps.reminder_to_confirm_sent_at == 0
                    && u.timestamps.created_at >= created_after
                    && u.timestamps.created_at < created_before
            })
            .cloned()
            .collect();
        Ok(sorted_by_creation(users))
    }

    async fn find_inactive_users(
        &self,
        instance_id: &str,
        inactive_before: i64,
    ) -> Result<Vec<User>> {
        let mut state = self.inner.lock();
        let users = state
            .partition(instance_id)
            .users
            .values()
            .filter(|u| {
                u.is_plain_participant()
                    && u.timestamps.marked_for_deletion == 0
                    && u.timestamps.last_login < inactive_before
                    && u.timestamps.last_token_refresh < inactive_before
            })
            .cloned()
            .collect();
        Ok(sorted_by_creation(users))
    }

    async fn find_users_marked_for_deletion(
        &self,
        instance_id: &str,
        now: i64,
    ) -> Result<Vec<User>> {
        let mut state = self.inner.lock();
        let users = state
            .partition(instance_id)
            .users
            .values()
            .filter(|u| {
                u.timestamps.marked_for_deletion > 0 && u.timestamps.marked_for_deletion < now
            })
            .cloned()
            .collect();
        Ok(sorted_by_creation(users))
    }

    async fn create_renew_token(&self, instance_id: &str, token: &RenewToken) -> Result<bool> {
        let mut state = self.inner.lock();
        let tokens = &mut state.partition(instance_id).renew_tokens;
        if tokens.contains_key(&token.renew_token) {
            return Ok(false);
        }
        tokens.insert(token.renew_token.clone(), token.clone());
        Ok(true)
    }

    async fn find_and_update_renew_token(
        &self,
        instance_id: &str,
        user_id: Uuid,
        renew_token: &str,
        next_token: &str,
        window: RotationWindow,
    ) -> Result<Option<RenewToken>> {
        let mut state = self.inner.lock();
        let Some(row) = state.partition(instance_id).renew_tokens.get_mut(renew_token) else {
            return Ok(None);
        };
        if row.user_id != user_id || row.expires_at <= window.now {
            return Ok(None);
        }

        if row.next_token.is_none() {
            row.next_token = Some(next_token.to_string());
            row.expires_at = window.grace_expires_at;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_renew_token_by_token(
        &self,
        instance_id: &str,
        renew_token: &str,
    ) -> Result<bool> {
        let mut state = self.inner.lock();
        Ok(state
            .partition(instance_id)
            .renew_tokens
            .remove(renew_token)
            .is_some())
    }

    async fn delete_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        let mut state = self.inner.lock();
        let tokens = &mut state.partition(instance_id).renew_tokens;
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn delete_expired_renew_tokens(&self, instance_id: &str, now: i64) -> Result<u64> {
        let mut state = self.inner.lock();
        let tokens = &mut state.partition(instance_id).renew_tokens;
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }

    async fn count_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        let mut state = self.inner.lock();
        Ok(state
            .partition(instance_id)
            .renew_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .count() as u64)
    }

    async fn add_temp_token(&self, token: &TempToken) -> Result<()> {
        let mut state = self.inner.lock();
        if state.temp_tokens.contains_key(&token.token) {
            bail!("temp token already exists");
        }
        state.temp_tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_temp_token(&self, token: &str) -> Result<Option<TempToken>> {
        Ok(self.inner.lock().temp_tokens.get(token).cloned())
    }

    async fn get_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<Vec<TempToken>> {
        let state = self.inner.lock();
        Ok(state
            .temp_tokens
            .values()
            .filter(|t| {
                t.instance_id == instance_id && t.user_id == user_id && purpose_matches(t, purpose)
            })
            .cloned()
            .collect())
    }

    async fn delete_temp_token(&self, token: &str) -> Result<bool> {
        Ok(self.inner.lock().temp_tokens.remove(token).is_some())
    }

    async fn delete_all_temp_tokens_for_user(
        &self,
        instance_id: &str,
        user_id: Uuid,
        purpose: Option<&str>,
    ) -> Result<u64> {
        let mut state = self.inner.lock();
        let before = state.temp_tokens.len();
        state.temp_tokens.retain(|_, t| {
            !(t.instance_id == instance_id && t.user_id == user_id && purpose_matches(t, purpose))
        });
        Ok((before - state.temp_tokens.len()) as u64)
    }

    async fn delete_temp_tokens_expired_before(
        &self,
        instance_id: &str,
        purpose: Option<&str>,
        expires_before: i64,
    ) -> Result<u64> {
        let mut state = self.inner.lock();
        let before = state.temp_tokens.len();
        state.temp_tokens.retain(|_, t| {
            !(t.instance_id == instance_id
                && purpose_matches(t, purpose)
                && t.expiration < expires_before)
        });
        Ok((before - state.temp_tokens.len()) as u64)
    }
}
