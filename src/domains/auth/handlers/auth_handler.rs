use crate::domains::auth::models::{
    JwtRequest, LogoutRequest, RefreshJwtRequest, RevokeRefreshTokensRequest, ServiceStatus,
    SigninRequest, TokenInfos, TokenResponse,
};
use crate::shared::errors::AuthError;
use crate::shared::middleware::ScopedJson;
use crate::shared::services::AppState;
use axum::{extract::State, http::StatusCode, Json};

type ApiError = (StatusCode, Json<serde_json::Value>);

/// Access Token 검증 핸들러
/// Validate JWT handler
#[utoipa::path(
    post,
    path = "/api/auth/validate",
    request_body = JwtRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenInfos),
        (status = 400, description = "Missing or invalid token")
    ),
    tag = "Auth"
)]
pub async fn validate(
    State(app_state): State<AppState>,
    Json(request): Json<JwtRequest>,
) -> Result<Json<TokenInfos>, ApiError> {
    let infos = app_state
        .auth_state
        .auth_service
        .validate_jwt(request)
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(infos))
}

/// 토큰 갱신 핸들러
/// Renew JWT handler
#[utoipa::path(
    post,
    path = "/api/auth/renew",
    request_body = RefreshJwtRequest,
    responses(
        (status = 200, description = "Token renewed", body = TokenResponse),
        (status = 400, description = "Missing arguments"),
        (status = 403, description = "Access token rejected"),
        (status = 500, description = "Refresh token error")
    ),
    tag = "Auth"
)]
pub async fn renew(
    State(app_state): State<AppState>,
    Json(request): Json<RefreshJwtRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let response = app_state
        .auth_state
        .auth_service
        .renew_jwt(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(response))
}

/// 전체 Refresh Token 무효화 핸들러
/// Revoke all refresh tokens handler
#[utoipa::path(
    post,
    path = "/api/auth/revoke-all",
    request_body = RevokeRefreshTokensRequest,
    responses(
        (status = 200, description = "Refresh tokens revoked", body = ServiceStatus),
        (status = 400, description = "Missing token descriptor"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn revoke_all(
    State(app_state): State<AppState>,
    Json(request): Json<RevokeRefreshTokensRequest>,
) -> Result<Json<ServiceStatus>, ApiError> {
    let status = app_state
        .auth_state
        .auth_service
        .revoke_all_refresh_tokens(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(status))
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Missing arguments or unknown instance"),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn signin(
    State(app_state): State<AppState>,
    ScopedJson(request): ScopedJson<SigninRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let response = app_state
        .auth_state
        .auth_service
        .signin(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(response))
}

/// 로그아웃 핸들러
/// Logout handler
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logout successful", body = ServiceStatus),
        (status = 400, description = "Missing arguments or unknown instance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn logout(
    State(app_state): State<AppState>,
    ScopedJson(request): ScopedJson<LogoutRequest>,
) -> Result<Json<ServiceStatus>, ApiError> {
    let status = app_state
        .auth_state
        .auth_service
        .logout(request)
        .await
        .map_err(|e: AuthError| -> ApiError { e.into() })?;

    Ok(Json(status))
}
