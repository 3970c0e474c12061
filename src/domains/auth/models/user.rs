use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// 일반 참가자 역할 (비활성 감지 대상)
/// Plain participant role (the only accounts the inactivity sweep touches)
pub const PARTICIPANT_ROLE: &str = "PARTICIPANT";

/// 이메일 계정 타입
/// Email account type
pub const ACCOUNT_TYPE_EMAIL: &str = "email";

/// 사용자 모델 (인스턴스별 저장)
/// User record, stored per instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub account: Account,
    pub roles: Vec<String>,
    pub profiles: Vec<Profile>,
    pub contact_preferences: ContactPreferences,
    pub timestamps: Timestamps,
}

/// 계정 정보
/// Account credentials and verification state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_type: String,
    /// Unique within an instance (e-mail address for email accounts)
    pub account_id: String,
    pub password_hash: String,
    /// 0 = 미인증 / 0 = not verified yet
    pub account_confirmed_at: i64,
    pub preferred_language: String,
}

/// 프로필 (한 사용자가 여러 프로필을 가질 수 있음)
/// Profile owned by a user (one main profile plus any number of secondary ones)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub alias: String,
    pub main_profile: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPreferences {
    pub subscribed_to_newsletter: bool,
    /// -1 when no weekday was assigned
    pub receive_weekly_message_day_of_week: i32,
}

/// 활동 타임스탬프 (Unix epoch 초)
/// Activity timestamps, Unix epoch seconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: i64,
    pub last_login: i64,
    pub last_token_refresh: i64,
    pub reminder_to_confirm_sent_at: i64,
    /// 0 = 삭제 예정 아님, >0 = 삭제 예정 시각
    /// 0 = not marked, >0 = epoch at which the account gets deleted
    pub marked_for_deletion: i64,
}

impl User {
    /// 계정 인증 여부
    /// Whether the account was confirmed
    pub fn is_confirmed(&self) -> bool {
        self.account.account_confirmed_at > 0
    }

    /// 메인 프로필 ID와 나머지 프로필 ID 목록
    /// Main profile id plus the ids of all other profiles.
    ///
    /// Falls back to the first profile when none is flagged as main.
    pub fn main_and_other_profiles(&self) -> (Option<Uuid>, Vec<Uuid>) {
        let main = self
            .profiles
            .iter()
            .find(|p| p.main_profile)
            .or_else(|| self.profiles.first())
            .map(|p| p.id);

        let others = self
            .profiles
            .iter()
            .map(|p| p.id)
            .filter(|id| Some(*id) != main)
            .collect();

        (main, others)
    }

    /// 비활성 감지 대상 여부 (참가자 역할만 가진 계정)
    /// Only accounts holding exactly the participant role are subject to inactivity handling
    pub fn is_plain_participant(&self) -> bool {
        self.roles.len() == 1 && self.roles.iter().all(|r| r == PARTICIPANT_ROLE)
    }
}

/// 활동 종류 (로그인 / 토큰 갱신)
/// Kind of activity recorded on the user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Login,
    TokenRefresh,
}

/// 삭제 예정 플래그 조건부 업데이트
/// Conditional update of `marked_for_deletion`.
///
/// `Mark` only applies while the field is unset and the account is still
/// inactive; `Reset` only applies while the field is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkForDeletion {
    Mark { delete_at: i64, inactive_before: i64 },
    Reset,
}
