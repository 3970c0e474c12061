use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 비활성 사용자 알림 토큰 목적
/// Purpose tag of the receipt token sent with the inactivity notice
pub const TOKEN_PURPOSE_INACTIVE_USER_NOTIFICATION: &str = "inactive_user_notification";

/// 연락처 인증 토큰 목적
/// Purpose tag of contact (e-mail) verification tokens
pub const TOKEN_PURPOSE_CONTACT_VERIFICATION: &str = "contact_verification";

/// 임시 토큰 (목적별, 단일 사용)
/// Single-purpose temporary token scoped to (instance, user, purpose)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempToken {
    pub token: String,
    pub instance_id: String,
    pub user_id: Uuid,
    pub purpose: String,
    /// 목적별 부가 정보 (예: 대상 이메일)
    /// Opaque purpose-specific payload, e.g. the destination e-mail
    pub info: HashMap<String, String>,
    /// Unix epoch 초 / Unix epoch seconds
    pub expiration: i64,
}
