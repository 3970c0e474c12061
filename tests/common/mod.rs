// =====================================================
// 통합 테스트 공통 헬퍼
// =====================================================
// 목적: 메모리 저장소, 기록용 외부 서비스 클라이언트, 테스트 사용자/앱 생성
//
// 사용법:
// ```rust
// mod common;
// use common::*;
//
// #[tokio::test]
// async fn test_something() {
//     let store = setup_store();
//     // 테스트 코드...
// }
// ```
// =====================================================
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use account_server::domains::auth::models::{
    Account, Activity, ContactPreferences, MarkForDeletion, Profile, RenewToken, RotationWindow,
    TempToken, Timestamps, TokenInfos, User, ACCOUNT_TYPE_EMAIL, PARTICIPANT_ROLE,
};
use account_server::domains::auth::services::{AuthState, JwtService};
use account_server::routes::create_router;
use account_server::shared::clients::{
    AuditLogger, EmailMessage, LogEvent, MessageSender, ProfileDeprovisioner, ServiceClients,
};
use account_server::shared::database::{Instance, MemoryTenantStore, TenantStore};
use account_server::shared::errors::ClientError;
use account_server::shared::middleware::InstanceAllowList;
use account_server::shared::services::AppState;

// 테스트용 상수
pub const INSTANCE: &str = "test-instance";
pub const OTHER_INSTANCE: &str = "other-instance";
pub const TEST_SIGNING_KEY: &[u8] = b"integration-test-signing-key";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// 두 개의 인스턴스가 등록된 메모리 저장소
pub fn setup_store() -> Arc<MemoryTenantStore> {
    Arc::new(MemoryTenantStore::with_instances([INSTANCE, OTHER_INSTANCE]))
}

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// 테스트 사용자 생성 (참가자 역할, 인증 완료, 메인 프로필 하나)
pub fn make_user(account_id: &str) -> User {
    let created_at = now() - 10;
    User {
        id: Uuid::new_v4(),
        account: Account {
            account_type: ACCOUNT_TYPE_EMAIL.to_string(),
            account_id: account_id.to_string(),
            password_hash: String::new(),
            account_confirmed_at: created_at,
            preferred_language: "en".to_string(),
        },
        roles: vec![PARTICIPANT_ROLE.to_string()],
        profiles: vec![Profile {
            id: Uuid::new_v4(),
            alias: account_id.to_string(),
            main_profile: true,
        }],
        contact_preferences: ContactPreferences {
            subscribed_to_newsletter: true,
            receive_weekly_message_day_of_week: -1,
        },
        timestamps: Timestamps {
            created_at,
            last_login: created_at,
            last_token_refresh: created_at,
            ..Default::default()
        },
    }
}

pub fn unconfirmed(mut user: User, created_at: i64) -> User {
    user.account.account_confirmed_at = 0;
    user.timestamps.created_at = created_at;
    user
}

pub fn inactive_since(mut user: User, at: i64) -> User {
    user.timestamps.last_login = at;
    user.timestamps.last_token_refresh = at;
    user
}

pub async fn insert_user(store: &MemoryTenantStore, instance_id: &str, user: &User) {
    store.add_user(instance_id, user).await.unwrap();
}

/// 호출 순서 기록 (모든 기록용 클라이언트가 공유)
#[derive(Debug, Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// 발송된 메일을 기록하는 MessageSender (실패 주입 가능)
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: Mutex<bool>,
    gate: Mutex<Option<Arc<Notify>>>,
    journal: Arc<Journal>,
}

impl RecordingMessenger {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// 이후 발송은 반환된 Notify 가 깨울 때까지 대기
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn sent_of_type(&self, message_type: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.message_type == message_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessageSender for RecordingMessenger {
    async fn send_email(&self, message: EmailMessage) -> Result<(), ClientError> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.fail.lock() {
            return Err(ClientError::Rejected {
                service: "messaging",
                reason: "injected failure".to_string(),
            });
        }
        self.journal.push(format!("email:{}", message.message_type));
        self.sent.lock().push(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub events: Mutex<Vec<LogEvent>>,
    journal: Arc<Journal>,
}

#[async_trait]
impl AuditLogger for RecordingAudit {
    async fn save_log_event(&self, event: LogEvent) -> Result<(), ClientError> {
        self.journal.push(format!("audit:{}", event.event_name));
        self.events.lock().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingStudy {
    pub deleted: Mutex<Vec<TokenInfos>>,
    journal: Arc<Journal>,
}

#[async_trait]
impl ProfileDeprovisioner for RecordingStudy {
    async fn profile_deleted(&self, token: TokenInfos) -> Result<(), ClientError> {
        let profile = token.profile_id.map(|p| p.to_string()).unwrap_or_default();
        self.journal.push(format!("study:{}", profile));
        self.deleted.lock().push(token);
        Ok(())
    }
}

/// 기록용 클라이언트 묶음
pub struct Recorders {
    pub journal: Arc<Journal>,
    pub messenger: Arc<RecordingMessenger>,
    pub audit: Arc<RecordingAudit>,
    pub study: Arc<RecordingStudy>,
}

impl Recorders {
    pub fn new() -> Self {
        let journal = Arc::new(Journal::default());
        Self {
            messenger: Arc::new(RecordingMessenger {
                journal: journal.clone(),
                ..Default::default()
            }),
            audit: Arc::new(RecordingAudit {
                journal: journal.clone(),
                ..Default::default()
            }),
            study: Arc::new(RecordingStudy {
                journal: journal.clone(),
                ..Default::default()
            }),
            journal,
        }
    }

    pub fn clients(&self) -> ServiceClients {
        ServiceClients {
            messaging: self.messenger.clone(),
            audit: self.audit.clone(),
            study: self.study.clone(),
        }
    }
}

pub fn jwt_service() -> JwtService {
    JwtService::new(TEST_SIGNING_KEY)
}

/// 테스트용 라우터 (메모리 저장소 + 기록용 감사 로그)
pub fn test_app(store: Arc<MemoryTenantStore>, recorders: &Recorders) -> Router {
    let store: Arc<dyn TenantStore> = store;
    let auth_state = AuthState::new(
        store,
        jwt_service(),
        recorders.audit.clone(),
        chrono::Duration::minutes(60),
    );
    let state = AppState::new(auth_state, InstanceAllowList::new([INSTANCE, OTHER_INSTANCE]));

    create_router().with_state(state)
}

/// 활동 기록 / 삭제 예정 해제 직후마다 비활성 표시를 끼워 넣는 저장소
/// (sweep 의 조건부 표시가 두 쓰기 사이에 도착하는 경우 재현)
pub struct InterleavingStore {
    inner: Arc<MemoryTenantStore>,
    mark: MarkForDeletion,
    pub applied: Mutex<Vec<bool>>,
}

impl InterleavingStore {
    pub fn new(inner: Arc<MemoryTenantStore>, mark: MarkForDeletion) -> Self {
        Self {
            inner,
            mark,
            applied: Mutex::new(Vec::new()),
        }
    }

    async fn interleave(&self, instance_id: &str, user_id: Uuid) -> Result<()> {
        let applied = self
            .inner
            .update_marked_for_deletion(instance_id, user_id, self.mark)
            .await?;
        self.applied.lock().push(applied);
        Ok(())
    }
}

#[async_trait]
impl TenantStore for InterleavingStore {
    async fn get_all_instances(&self) -> Result<Vec<Instance>> {
        self.inner.get_all_instances().await
    }

    async fn add_user(&self, instance_id: &str, user: &User) -> Result<Uuid> {
        self.inner.add_user(instance_id, user).await
    }

    async fn get_user_by_id(&self, instance_id: &str, user_id: Uuid) -> Result<Option<User>> {
        self.inner.get_user_by_id(instance_id, user_id).await
    }

    async fn get_user_by_account_id(&self, instance_id: &str, account_id: &str) -> Result<Option<User>> {
        self.inner.get_user_by_account_id(instance_id, account_id).await
    }

    async fn record_activity(&self, instance_id: &str, user_id: Uuid, activity: Activity, at: i64) -> Result<bool> {
        let result = self.inner.record_activity(instance_id, user_id, activity, at).await?;
        self.interleave(instance_id, user_id).await?;
        Ok(result)
    }

    async fn update_marked_for_deletion(&self, instance_id: &str, user_id: Uuid, update: MarkForDeletion) -> Result<bool> {
        let result = self.inner.update_marked_for_deletion(instance_id, user_id, update).await?;
        if update == MarkForDeletion::Reset {
            self.interleave(instance_id, user_id).await?;
        }
        Ok(result)
    }

    async fn mark_reminder_sent(&self, instance_id: &str, user_id: Uuid, at: i64) -> Result<bool> {
        self.inner.mark_reminder_sent(instance_id, user_id, at).await
    }

    async fn release_reminder_claim(&self, instance_id: &str, user_id: Uuid, claimed_at: i64) -> Result<bool> {
        self.inner.release_reminder_claim(instance_id, user_id, claimed_at).await
    }

    async fn delete_user(&self, instance_id: &str, user_id: Uuid) -> Result<bool> {
        self.inner.delete_user(instance_id, user_id).await
    }

    async fn delete_unverified_users(&self, instance_id: &str, created_before: i64) -> Result<u64> {
        self.inner.delete_unverified_users(instance_id, created_before).await
    }

    async fn find_unverified_users_for_reminder(&self, instance_id: &str, created_after: i64, created_before: i64) -> Result<Vec<User>> {
        self.inner
            .find_unverified_users_for_reminder(instance_id, created_after, created_before)
            .await
    }

    async fn find_inactive_users(&self, instance_id: &str, inactive_before: i64) -> Result<Vec<User>> {
        self.inner.find_inactive_users(instance_id, inactive_before).await
    }

    async fn find_users_marked_for_deletion(&self, instance_id: &str, now: i64) -> Result<Vec<User>> {
        self.inner.find_users_marked_for_deletion(instance_id, now).await
    }

    async fn create_renew_token(&self, instance_id: &str, token: &RenewToken) -> Result<bool> {
        self.inner.create_renew_token(instance_id, token).await
    }

    async fn find_and_update_renew_token(
        &self,
        instance_id: &str,
        user_id: Uuid,
        renew_token: &str,
        next_token: &str,
        window: RotationWindow,
    ) -> Result<Option<RenewToken>> {
        self.inner
            .find_and_update_renew_token(instance_id, user_id, renew_token, next_token, window)
            .await
    }

    async fn delete_renew_token_by_token(&self, instance_id: &str, renew_token: &str) -> Result<bool> {
        self.inner.delete_renew_token_by_token(instance_id, renew_token).await
    }

    async fn delete_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        self.inner.delete_renew_tokens_for_user(instance_id, user_id).await
    }

    async fn delete_expired_renew_tokens(&self, instance_id: &str, now: i64) -> Result<u64> {
        self.inner.delete_expired_renew_tokens(instance_id, now).await
    }

    async fn count_renew_tokens_for_user(&self, instance_id: &str, user_id: Uuid) -> Result<u64> {
        self.inner.count_renew_tokens_for_user(instance_id, user_id).await
    }

    async fn add_temp_token(&self, token: &TempToken) -> Result<()> {
        self.inner.add_temp_token(token).await
    }

    async fn get_temp_token(&self, token: &str) -> Result<Option<TempToken>> {
        self.inner.get_temp_token(token).await
    }

    async fn get_temp_tokens_for_user(&self, instance_id: &str, user_id: Uuid, purpose: Option<&str>) -> Result<Vec<TempToken>> {
        self.inner.get_temp_tokens_for_user(instance_id, user_id, purpose).await
    }

    async fn delete_temp_token(&self, token: &str) -> Result<bool> {
        self.inner.delete_temp_token(token).await
    }

    async fn delete_all_temp_tokens_for_user(&self, instance_id: &str, user_id: Uuid, purpose: Option<&str>) -> Result<u64> {
        self.inner.delete_all_temp_tokens_for_user(instance_id, user_id, purpose).await
    }

    async fn delete_temp_tokens_expired_before(&self, instance_id: &str, purpose: Option<&str>, expires_before: i64) -> Result<u64> {
        self.inner
            .delete_temp_tokens_expired_before(instance_id, purpose, expires_before)
            .await
    }
}
