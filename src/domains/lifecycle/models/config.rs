use serde::{Deserialize, Serialize};

/// 계정 생명주기 임계값 (모두 초 단위)
/// Account lifecycle thresholds, all in seconds
///
/// 0 이면 해당 sweep 비활성화
/// A threshold of 0 disables the sweep that reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleThresholds {
    /// 미인증 계정 삭제 (생성 후)
    /// Delete unverified accounts this long after creation
    pub clean_up_unverified_after: i64,

    /// 미인증 계정 리마인더 (생성 후)
    /// Remind unverified accounts this long after creation
    pub reminder_after: i64,

    /// 비활성 사용자 통지 (마지막 로그인 / 토큰 갱신 후)
    /// Notify users inactive for this long
    pub notify_inactive_after: i64,

    /// 통지 후 계정 삭제까지
    /// Delete notified accounts this long after the notice
    pub delete_after_notify: i64,

    /// 리마인더에 포함되는 인증 토큰 수명
    /// Lifetime of the contact verification token sent with a reminder
    pub contact_verification_token_lifetime: i64,
}

impl Default for LifecycleThresholds {
    fn default() -> Self {
        Self {
            clean_up_unverified_after: 0,
            reminder_after: 0,
            notify_inactive_after: 0,
            delete_after_notify: 0,
            contact_verification_token_lifetime: 30 * 24 * 60 * 60,
        }
    }
}

impl LifecycleThresholds {
    pub fn cleanup_enabled(&self) -> bool {
        self.clean_up_unverified_after > 0
    }

    /// 리마인더는 삭제 기준보다 먼저 와야 의미가 있음
    /// The reminder window is empty unless it opens before cleanup
    pub fn reminder_enabled(&self) -> bool {
        self.reminder_after > 0
            && (self.clean_up_unverified_after == 0
                || self.reminder_after < self.clean_up_unverified_after)
    }

    /// 통지와 삭제 모두 설정되어야 동작
    /// Inactivity handling needs both the notify and the delete threshold
    pub fn inactivity_enabled(&self) -> bool {
        self.notify_inactive_after > 0 && self.delete_after_notify > 0
    }
}
