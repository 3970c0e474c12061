use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::domains::auth::models::{
    MarkForDeletion, TempToken, TokenInfos, User, ACCOUNT_TYPE_EMAIL,
    TOKEN_PURPOSE_CONTACT_VERIFICATION, TOKEN_PURPOSE_INACTIVE_USER_NOTIFICATION,
};
use crate::domains::auth::services::RenewTokenService;
use crate::domains::lifecycle::models::{LifecycleThresholds, SweepKind, SweepReport};
use crate::shared::clients::{
    EmailMessage, LogEvent, LogEventType, ServiceClients, EMAIL_TYPE_ACCOUNT_DELETED_AFTER_INACTIVITY,
    EMAIL_TYPE_ACCOUNT_INACTIVITY, EMAIL_TYPE_VERIFICATION_REMINDER,
    LOG_EVENT_ACCOUNT_DELETED_AFTER_INACTIVITY,
};
use crate::shared::database::TenantStore;
use crate::shared::utils::generate_unique_token;

/// 계정 생명주기 sweep
/// Account lifecycle sweeps.
///
/// 역할:
/// - 미인증 계정 삭제 (+ 만료된 임시 토큰 정리)
/// - 미인증 계정 리마인더
/// - 비활성 사용자 감지 → 삭제 예정 표시 → 통지
/// - 삭제 예정 시각이 지난 계정 삭제
///
/// 사용자 단위 실패는 로그만 남기고 다음 사용자로 진행
/// A failed step stops work on that user only. Every such failure is logged
/// with `instance_id`, `user_id` and `step`; the next tick retries whatever
/// predicate still holds.
#[derive(Clone)]
pub struct LifecycleSweeps {
    store: Arc<dyn TenantStore>,
    clients: ServiceClients,
    renew_tokens: RenewTokenService,
    thresholds: LifecycleThresholds,
}

impl LifecycleSweeps {
    pub fn new(
        store: Arc<dyn TenantStore>,
        clients: ServiceClients,
        thresholds: LifecycleThresholds,
    ) -> Self {
        Self {
            renew_tokens: RenewTokenService::new(store.clone()),
            store,
            clients,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &LifecycleThresholds {
        &self.thresholds
    }

    /// 해당 sweep 실행 여부
    /// Whether `kind` does anything under the configured thresholds
    pub fn is_enabled(&self, kind: SweepKind) -> bool {
        match kind {
            // 임시 토큰 정리는 항상 수행
            SweepKind::CleanUpUnverifiedUsers => true,
            SweepKind::ReminderToConfirmAccount => self.thresholds.reminder_enabled(),
            SweepKind::DetectAndNotifyInactiveUsers => self.thresholds.inactivity_enabled(),
            // 이전 설정에서 남은 표시도 처리
            SweepKind::CleanupUsersMarkedForDeletion => true,
        }
    }

    /// 한 종류의 sweep 을 모든 인스턴스에 대해 실행
    /// Run one sweep kind over every instance. Instance-level failures (the
    /// candidate query itself failing) are logged and the next instance runs.
    pub async fn run(&self, kind: SweepKind, instance_ids: &[String]) -> SweepReport {
        let mut total = SweepReport::default();
        if !self.is_enabled(kind) {
            tracing::debug!(sweep = %kind, "sweep disabled by configuration");
            return total;
        }

        let t = self.thresholds;
        for instance_id in instance_ids {
            let result = match kind {
                SweepKind::CleanUpUnverifiedUsers => {
                    self.clean_up_instance(instance_id, t.clean_up_unverified_after).await
                }
                SweepKind::ReminderToConfirmAccount => {
                    self.reminder_to_confirm_account(
                        instance_id,
                        t.reminder_after,
                        t.clean_up_unverified_after,
                    )
                    .await
                }
                SweepKind::DetectAndNotifyInactiveUsers => {
                    self.detect_and_notify_inactive_users(
                        instance_id,
                        t.notify_inactive_after,
                        t.delete_after_notify,
                    )
                    .await
                }
                SweepKind::CleanupUsersMarkedForDeletion => {
                    self.cleanup_users_marked_for_deletion(instance_id).await
                }
            };

            match result {
                Ok(report) => {
                    if report.processed > 0 || report.failed > 0 {
                        tracing::info!(
                            sweep = %kind,
                            instance_id = %instance_id,
                            processed = report.processed,
                            failed = report.failed,
                            "sweep finished"
                        );
                    } else {
                        tracing::debug!(sweep = %kind, instance_id = %instance_id, "sweep finished, nothing to do");
                    }
                    total.merge(report);
                }
                Err(e) => {
                    tracing::error!(
                        sweep = %kind,
                        instance_id = %instance_id,
                        error = %format!("{:#}", e),
                        "sweep failed for instance"
                    );
                }
            }
        }

        total
    }

    async fn clean_up_instance(&self, instance_id: &str, threshold: i64) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        if threshold > 0 {
            report.merge(self.clean_up_unverified_users(instance_id, threshold).await?);
        }
        self.purge_expired_temp_tokens(instance_id).await?;
        Ok(report)
    }

    /// 미인증 계정 삭제 (생성 후 threshold 초 경과)
    /// Delete accounts still unconfirmed `threshold` seconds after creation
    pub async fn clean_up_unverified_users(
        &self,
        instance_id: &str,
        threshold: i64,
    ) -> Result<SweepReport> {
        let now = Utc::now().timestamp();
        let deleted = self
            .store
            .delete_unverified_users(instance_id, now - threshold)
            .await?;

        Ok(SweepReport {
            processed: deleted,
            failed: 0,
        })
    }

    /// 만료된 임시 토큰 삭제
    /// Drop temp tokens of any purpose whose expiration has passed
    pub async fn purge_expired_temp_tokens(&self, instance_id: &str) -> Result<u64> {
        let now = Utc::now().timestamp();
        let count = self
            .store
            .delete_temp_tokens_expired_before(instance_id, None, now)
            .await?;
        if count > 0 {
            tracing::debug!(instance_id, count, "purged expired temp tokens");
        }
        Ok(count)
    }

    /// 미인증 계정 리마인더
    /// Remind unconfirmed accounts created between `now - cleanup` and
    /// `now - reminder`. The reminder is claimed on the user record before it is
    /// sent, so each account gets at most one; a failed send releases the claim.
    pub async fn reminder_to_confirm_account(
        &self,
        instance_id: &str,
        reminder: i64,
        cleanup: i64,
    ) -> Result<SweepReport> {
        let now = Utc::now().timestamp();
        let created_after = if cleanup > 0 { now - cleanup } else { 0 };
        let users = self
            .store
            .find_unverified_users_for_reminder(instance_id, created_after, now - reminder)
            .await?;

        let mut report = SweepReport::default();
        for user in users {
            match self.send_reminder(instance_id, &user, now).await {
                Ok(true) => report.processed += 1,
                Ok(false) => {}
                Err(step) => {
                    report.failed += 1;
                    tracing::debug!(instance_id, user_id = %user.id, step, "reminder not sent");
                }
            }
        }
        Ok(report)
    }

    async fn send_reminder(
        &self,
        instance_id: &str,
        user: &User,
        now: i64,
    ) -> Result<bool, &'static str> {
        match self.store.mark_reminder_sent(instance_id, user.id, now).await {
            Ok(true) => {}
            Ok(false) => return Ok(false),
            Err(e) => return Err(log_step_failure(instance_id, user.id, "claim_reminder", &e)),
        }

        let expiration = now + self.thresholds.contact_verification_token_lifetime;
        let token = match self
            .add_temp_token(instance_id, user, TOKEN_PURPOSE_CONTACT_VERIFICATION, expiration)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                let step = log_step_failure(instance_id, user.id, "create_verification_token", &e);
                self.release_reminder_claim(instance_id, user.id, now).await;
                return Err(step);
            }
        };

        let message = email_for(instance_id, user, EMAIL_TYPE_VERIFICATION_REMINDER, Some(&token));
        if let Err(e) = self.clients.messaging.send_email(message).await {
            let step = log_step_failure(instance_id, user.id, "send_reminder", &e);
            self.discard_temp_token(instance_id, user.id, &token).await;
            self.release_reminder_claim(instance_id, user.id, now).await;
            return Err(step);
        }

        Ok(true)
    }

    /// 보상 동작: 발송 실패 시 리마인더 기록 해제 (다음 주기에 재시도)
    /// Compensation: an unsent reminder must not keep the user out of the next tick
    async fn release_reminder_claim(&self, instance_id: &str, user_id: Uuid, claimed_at: i64) {
        if let Err(e) = self
            .store
            .release_reminder_claim(instance_id, user_id, claimed_at)
            .await
        {
            log_step_failure(instance_id, user_id, "release_reminder_claim", &e);
        }
    }

    /// 비활성 사용자 감지 및 통지 (표시 후 통지)
    /// Mark-then-notify for inactive plain participants.
    ///
    /// 1. 조건부 표시 (미표시 + 여전히 비활성일 때만)
    /// 2. 임시 토큰 생성
    /// 3. 통지 메일 발송
    /// 2 또는 3 실패 시 표시를 되돌림
    pub async fn detect_and_notify_inactive_users(
        &self,
        instance_id: &str,
        notify: i64,
        delete_after: i64,
    ) -> Result<SweepReport> {
        let now = Utc::now().timestamp();
        let inactive_before = now - notify;
        let users = self
            .store
            .find_inactive_users(instance_id, inactive_before)
            .await?;

        let mut report = SweepReport::default();
        for user in users.iter().filter(|u| u.is_plain_participant()) {
            let mark = MarkForDeletion::Mark {
                delete_at: now + delete_after,
                inactive_before,
            };
            match self.notify_inactive_user(instance_id, user, mark, now + delete_after).await {
                Ok(true) => report.processed += 1,
                Ok(false) => {}
                Err(_) => report.failed += 1,
            }
        }
        Ok(report)
    }

    async fn notify_inactive_user(
        &self,
        instance_id: &str,
        user: &User,
        mark: MarkForDeletion,
        delete_at: i64,
    ) -> Result<bool, &'static str> {
        match self
            .store
            .update_marked_for_deletion(instance_id, user.id, mark)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // 이미 표시되었거나 그 사이 활동 있음
                tracing::debug!(instance_id, user_id = %user.id, "mark not applied, user skipped");
                return Ok(false);
            }
            Err(e) => return Err(log_step_failure(instance_id, user.id, "mark_for_deletion", &e)),
        }

        let token = match self
            .add_temp_token(instance_id, user, TOKEN_PURPOSE_INACTIVE_USER_NOTIFICATION, delete_at)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                let step = log_step_failure(instance_id, user.id, "create_notification_token", &e);
                self.reset_mark(instance_id, user.id).await;
                return Err(step);
            }
        };

        let message = email_for(instance_id, user, EMAIL_TYPE_ACCOUNT_INACTIVITY, Some(&token));
        if let Err(e) = self.clients.messaging.send_email(message).await {
            let step = log_step_failure(instance_id, user.id, "send_inactivity_notice", &e);
            self.discard_temp_token(instance_id, user.id, &token).await;
            self.reset_mark(instance_id, user.id).await;
            return Err(step);
        }

        Ok(true)
    }

    /// 삭제 예정 시각이 지난 계정 삭제
    /// Delete accounts whose `marked_for_deletion` time has passed.
    ///
    /// 순서: 최종 안내 메일 → 임시 토큰 → Renew Token → 사용자 → 프로필별 통지 → 감사 로그
    /// A failed final notice is only logged. Failing to delete tokens or the
    /// record stops work on that user; the next tick picks it up again.
    pub async fn cleanup_users_marked_for_deletion(&self, instance_id: &str) -> Result<SweepReport> {
        let now = Utc::now().timestamp();
        let users = self
            .store
            .find_users_marked_for_deletion(instance_id, now)
            .await?;

        let mut report = SweepReport::default();
        for user in users {
            match self.delete_marked_user(instance_id, &user).await {
                Ok(()) => {
                    tracing::info!(instance_id, user_id = %user.id, "removed inactive account");
                    report.processed += 1;
                }
                Err(_) => report.failed += 1,
            }
        }
        Ok(report)
    }

    async fn delete_marked_user(&self, instance_id: &str, user: &User) -> Result<(), &'static str> {
        let mut notice = email_for(
            instance_id,
            user,
            EMAIL_TYPE_ACCOUNT_DELETED_AFTER_INACTIVITY,
            None,
        );
        notice.use_low_prio = true;
        notice.instant = true;
        if let Err(e) = self.clients.messaging.send_email(notice).await {
            log_step_failure(instance_id, user.id, "send_deletion_notice", &e);
        }

        if let Err(e) = self
            .store
            .delete_all_temp_tokens_for_user(instance_id, user.id, None)
            .await
        {
            return Err(log_step_failure(instance_id, user.id, "delete_temp_tokens", &e));
        }

        if let Err(e) = self.renew_tokens.revoke(instance_id, user.id).await {
            return Err(log_step_failure(instance_id, user.id, "delete_renew_tokens", &e));
        }

        match self.store.delete_user(instance_id, user.id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(instance_id, user_id = %user.id, "user already removed");
                return Ok(());
            }
            Err(e) => return Err(log_step_failure(instance_id, user.id, "delete_user", &e)),
        }

        // 메인 프로필 먼저, 프로필마다 한 번씩
        let (main_profile, other_profiles) = user.main_and_other_profiles();
        for profile_id in main_profile.into_iter().chain(other_profiles.iter().copied()) {
            let token = TokenInfos {
                id: user.id,
                instance_id: instance_id.to_string(),
                issued_at: 0,
                account_confirmed: user.is_confirmed(),
                payload: HashMap::new(),
                profile_id: Some(profile_id),
                other_profile_ids: other_profiles.clone(),
            };
            if let Err(e) = self.clients.study.profile_deleted(token).await {
                tracing::error!(
                    instance_id,
                    user_id = %user.id,
                    profile_id = %profile_id,
                    step = "notify_profile_deleted",
                    error = %e,
                    "failed to notify study service"
                );
            }
        }

        let event = LogEvent::new(
            instance_id,
            user.id,
            LogEventType::Log,
            LOG_EVENT_ACCOUNT_DELETED_AFTER_INACTIVITY,
            user.account.account_id.clone(),
        );
        if let Err(e) = self.clients.audit.save_log_event(event).await {
            log_step_failure(instance_id, user.id, "save_log_event", &e);
        }

        Ok(())
    }

    async fn add_temp_token(
        &self,
        instance_id: &str,
        user: &User,
        purpose: &str,
        expiration: i64,
    ) -> Result<String> {
        let token = TempToken {
            token: generate_unique_token(),
            instance_id: instance_id.to_string(),
            user_id: user.id,
            purpose: purpose.to_string(),
            info: HashMap::from([
                ("type".to_string(), ACCOUNT_TYPE_EMAIL.to_string()),
                ("email".to_string(), user.account.account_id.clone()),
            ]),
            expiration,
        };
        self.store.add_temp_token(&token).await?;
        Ok(token.token)
    }

    async fn discard_temp_token(&self, instance_id: &str, user_id: Uuid, token: &str) {
        if let Err(e) = self.store.delete_temp_token(token).await {
            log_step_failure(instance_id, user_id, "discard_temp_token", &e);
        }
    }

    /// 보상 동작: 통지 실패 시 표시 해제
    /// Compensation: a mark must not outlive a failed notice
    async fn reset_mark(&self, instance_id: &str, user_id: Uuid) {
        match self
            .store
            .update_marked_for_deletion(instance_id, user_id, MarkForDeletion::Reset)
            .await
        {
            Ok(_) => {}
            Err(e) => {
                log_step_failure(instance_id, user_id, "reset_mark", &e);
            }
        }
    }
}

fn email_for(instance_id: &str, user: &User, message_type: &str, token: Option<&str>) -> EmailMessage {
    let mut content_infos = HashMap::new();
    if let Some(token) = token {
        content_infos.insert("token".to_string(), token.to_string());
    }

    EmailMessage {
        instance_id: instance_id.to_string(),
        to: vec![user.account.account_id.clone()],
        message_type: message_type.to_string(),
        content_infos,
        preferred_language: user.account.preferred_language.clone(),
        use_low_prio: false,
        instant: false,
    }
}

fn log_step_failure(
    instance_id: &str,
    user_id: Uuid,
    step: &'static str,
    error: &dyn std::fmt::Display,
) -> &'static str {
    tracing::error!(instance_id, user_id = %user_id, step, error = %error, "lifecycle step failed");
    step
}
