use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domains::auth::models::jwt::TokenInfos;
use crate::domains::auth::models::user::Profile;
use crate::shared::middleware::instance::InstanceScoped;

// JWT 검증 요청 모델
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(as = JwtRequest)]
pub struct JwtRequest {
    /// Access Token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    #[serde(default)]
    pub token: String,
}

// 토큰 갱신 요청 모델
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(as = RefreshJwtRequest)]
pub struct RefreshJwtRequest {
    /// 현재 (만료되었을 수 있는) Access Token
    /// Current access token, may already be expired
    #[serde(default)]
    pub access_token: String,

    /// Refresh Token
    /// 리프레시 토큰
    #[schema(example = "Zk3n0dJ...")]
    #[serde(default)]
    pub refresh_token: String,
}

// 토큰 응답 모델 (로그인 / 갱신 공통)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenResponse)]
pub struct TokenResponse {
    /// 새 Access Token
    /// New Access Token
    pub access_token: String,

    /// 새 Refresh Token
    /// New Refresh Token
    pub refresh_token: String,

    pub account_confirmed: bool,

    /// Access Token 수명 (분)
    /// Access token lifetime in minutes
    pub expires_in: i64,

    pub selected_profile_id: Option<Uuid>,

    pub profiles: Vec<Profile>,

    pub preferred_language: String,
}

// 전체 Refresh Token 무효화 요청
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(as = RevokeRefreshTokensRequest)]
pub struct RevokeRefreshTokensRequest {
    /// 검증된 토큰 정보 (게이트웨이가 전달)
    /// Validated token descriptor forwarded by the gateway
    #[serde(default)]
    pub token: Option<TokenInfos>,
}

// 서비스 상태 응답
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = ServiceStatus)]
pub struct ServiceStatus {
    pub status: String,
    pub msg: String,
    pub version: String,
}

// 로그인 요청 모델
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(as = SigninRequest)]
pub struct SigninRequest {
    /// Instance ID
    /// 인스턴스 ID
    #[schema(example = "default")]
    #[serde(default)]
    pub instance_id: String,

    /// Email address
    /// 이메일 주소
    #[schema(example = "user@example.com")]
    #[serde(default)]
    pub email: String,

    /// Password
    /// 비밀번호
    #[schema(example = "password123")]
    #[serde(default)]
    pub password: String,
}

// 로그아웃 요청 모델
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[schema(as = LogoutRequest)]
pub struct LogoutRequest {
    #[serde(default)]
    pub instance_id: String,

    /// Refresh Token
    /// 리프레시 토큰
    #[serde(default)]
    pub refresh_token: String,
}

impl InstanceScoped for SigninRequest {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

impl InstanceScoped for LogoutRequest {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }
}
