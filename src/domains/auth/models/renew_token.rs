use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Renew Token 모델 (DB 저장용)
/// Renewal token row, one per link of a rotation chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewToken {
    pub user_id: Uuid,
    /// 인스턴스 내에서 유일 / unique within an instance
    pub renew_token: String,
    /// Unix epoch 초 / Unix epoch seconds
    pub expires_at: i64,
    /// 이 토큰을 대체할 다음 토큰 (한 번만 설정됨)
    /// Token replacing this one; written once, never overwritten
    pub next_token: Option<String>,
}

impl RenewToken {
    /// 새 체인 시작 (next_token 비어 있음)
    /// Fresh row with no successor yet
    pub fn new(user_id: Uuid, renew_token: String, expires_at: i64) -> Self {
        Self {
            user_id,
            renew_token,
            expires_at,
            next_token: None,
        }
    }
}

/// 회전(rotation) 조건부 업데이트 파라미터
/// Parameters of the single-round-trip rotation write
#[derive(Debug, Clone, Copy)]
pub struct RotationWindow {
    /// 이 시각 이후에 만료되는 행만 매칭
    /// Only rows expiring after this instant match
    pub now: i64,
    /// next_token 이 처음 설정될 때의 새 만료 시각
    /// Expiry written when `next_token` is set for the first time
    pub grace_expires_at: i64,
}
