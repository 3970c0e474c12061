use thiserror::Error;
use axum::{http::StatusCode, Json};
use serde_json::json;

/// 인증 관련 에러
/// Authentication-related errors
///
/// The `Display` text is for logs only. What goes over the wire is the coarse
/// message chosen in the `From` impl below, so "user not found" and
/// "wrong token" look identical to a caller.
#[derive(Error, Debug)]
pub enum AuthError {
    /// 필수 인자 누락
    /// Required request field missing
    #[error("missing arguments")]
    MissingArguments,

    /// 허용되지 않은 인스턴스
    /// Instance id not in the allow-list
    #[error("instance not allowed: {instance_id}")]
    InstanceNotAllowed { instance_id: String },

    /// 잘못된 또는 만료된 토큰
    /// Invalid or expired access token
    #[error("invalid token")]
    InvalidToken,

    /// 만료 이외의 이유로 Access Token 검증 실패 (갱신 거부)
    /// Access token failed validation for a reason other than expiry
    #[error("access token rejected: {0}")]
    AccessDenied(String),

    /// 갱신 토큰 없음 (잘못됨 / 만료 / 이미 사용됨)
    /// No renewal row matched (wrong, expired or already consumed)
    #[error("renew token not found")]
    RenewalNotFound,

    /// 사용자를 찾을 수 없음
    /// User not found
    #[error("user not found: instance={instance_id} id={user_id}")]
    UserNotFound { instance_id: String, user_id: String },

    /// 갱신 실패 (외부에는 불투명하게 노출)
    /// Refresh failed; reported opaquely
    #[error("refresh token error: {0}")]
    RefreshFailed(String),

    /// 잘못된 이메일 또는 비밀번호
    /// Invalid email or password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 비밀번호 해싱 실패
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    PasswordHashingFailed(String),

    /// 토큰 서명 실패 (키 설정 문제)
    /// Signing failed, which points at a key configuration problem
    #[error("Failed to encode token: {0}")]
    TokenEncoding(String),

    /// 데이터베이스 에러
    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 내부 서버 에러
    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::DatabaseError(format!("{:#}", err))
    }
}

/// AuthError를 HTTP 응답으로 변환
/// Maps to coarse status codes:
/// InvalidArgument → 400, Unauthenticated → 401, PermissionDenied → 403, Internal → 500
impl From<AuthError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: AuthError) -> Self {
        let (status, message) = match &err {
            AuthError::MissingArguments => (StatusCode::BAD_REQUEST, "missing arguments"),
            AuthError::InstanceNotAllowed { .. } => (StatusCode::BAD_REQUEST, "invalid arguments"),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "invalid token"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid email or password"),
            AuthError::AccessDenied(_) => (StatusCode::FORBIDDEN, "refresh token error"),
            AuthError::RenewalNotFound
            | AuthError::UserNotFound { .. }
            | AuthError::RefreshFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "refresh token error")
            }
            AuthError::PasswordHashingFailed(_)
            | AuthError::TokenEncoding(_)
            | AuthError::DatabaseError(_)
            | AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        };

        (status, Json(json!({ "error": message })))
    }
}
