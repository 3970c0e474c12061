use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// payload 안의 역할 키 (쉼표로 구분)
/// Payload key holding the comma-separated role list
pub const PAYLOAD_KEY_ROLES: &str = "roles";

/// payload 안의 사용자명 키
/// Payload key holding the username
pub const PAYLOAD_KEY_USERNAME: &str = "username";

/// JWT Claims (토큰에 포함될 데이터)
/// JWT Claims (data to be included in token)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID
    /// User ID
    pub user_id: Uuid,

    /// 인스턴스 ID
    /// Instance (tenant) the user belongs to
    pub instance_id: String,

    pub account_confirmed: bool,

    /// 선택된 프로필
    /// Selected profile
    pub profile_id: Option<Uuid>,

    pub other_profile_ids: Vec<Uuid>,

    /// 역할, 사용자명 등
    /// Roles, username, ...
    pub payload: HashMap<String, String>,

    /// 발급 시간 (Unix timestamp)
    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// 만료 시간 (Unix timestamp)
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// 토큰 발급 요청 (Claims 구성용)
/// Identity and profile data a new access token is minted from
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub user_id: Uuid,
    pub instance_id: String,
    pub account_confirmed: bool,
    pub profile_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub username: String,
    pub other_profile_ids: Vec<Uuid>,
}

impl Claims {
    /// 새 Claims 생성 (만료 시간 자동 계산)
    /// Create new Claims (expiration = now + ttl)
    pub fn new(request: TokenRequest, ttl: chrono::Duration) -> Self {
        let now = chrono::Utc::now().timestamp();

        let mut payload = HashMap::new();
        if !request.roles.is_empty() {
            payload.insert(PAYLOAD_KEY_ROLES.to_string(), request.roles.join(","));
        }
        if !request.username.is_empty() {
            payload.insert(PAYLOAD_KEY_USERNAME.to_string(), request.username);
        }

        Self {
            user_id: request.user_id,
            instance_id: request.instance_id,
            account_confirmed: request.account_confirmed,
            profile_id: request.profile_id,
            other_profile_ids: request.other_profile_ids,
            payload,
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }

    /// payload 에서 역할 목록 추출
    /// Roles carried in the payload
    pub fn roles(&self) -> Vec<String> {
        self.payload
            .get(PAYLOAD_KEY_ROLES)
            .map(|roles| {
                roles
                    .split(',')
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn username(&self) -> String {
        self.payload
            .get(PAYLOAD_KEY_USERNAME)
            .cloned()
            .unwrap_or_default()
    }
}

/// 검증된 토큰 정보 (다른 서비스로 전달되는 형태)
/// Token descriptor handed to other services after validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenInfos {
    pub id: Uuid,
    pub instance_id: String,
    #[serde(default)]
    pub issued_at: i64,
    #[serde(default)]
    pub account_confirmed: bool,
    #[serde(default)]
    pub payload: HashMap<String, String>,
    #[serde(default)]
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub other_profile_ids: Vec<Uuid>,
}

impl From<Claims> for TokenInfos {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            instance_id: claims.instance_id,
            issued_at: claims.iat,
            account_confirmed: claims.account_confirmed,
            payload: claims.payload,
            profile_id: claims.profile_id,
            other_profile_ids: claims.other_profile_ids,
        }
    }
}
