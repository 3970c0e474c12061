use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;

use crate::domains::auth::models::{
    Activity, Claims, JwtRequest, LogoutRequest, MarkForDeletion, RefreshJwtRequest,
    RevokeRefreshTokensRequest, ServiceStatus, SigninRequest, TokenInfos, TokenRequest,
    TokenResponse, User,
};
use crate::domains::auth::services::{JwtService, RenewTokenService};
use crate::shared::clients::{
    AuditLogger, LogEvent, LogEventType, LOG_EVENT_TOKEN_REFRESH_FAILED,
    LOG_EVENT_TOKEN_REFRESH_SUCCESS,
};
use crate::shared::database::TenantStore;
use crate::shared::errors::{AuthError, TokenError};

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

// 인증 서비스
// AuthService: token validation, renewal, revocation, sign-in and logout
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn TenantStore>,
    jwt_service: JwtService,
    renew_tokens: RenewTokenService,
    audit: Arc<dyn AuditLogger>,
    /// Access Token 수명
    token_expiration: chrono::Duration,
}

impl AuthService {
    // 생성자
    pub fn new(
        store: Arc<dyn TenantStore>,
        jwt_service: JwtService,
        audit: Arc<dyn AuditLogger>,
        token_expiration: chrono::Duration,
    ) -> Self {
        Self {
            renew_tokens: RenewTokenService::new(store.clone()),
            store,
            jwt_service,
            audit,
            token_expiration,
        }
    }

    pub fn renew_tokens(&self) -> &RenewTokenService {
        &self.renew_tokens
    }

    /// Access Token 검증
    /// Validate an access token and describe it
    pub fn validate_jwt(&self, request: JwtRequest) -> Result<TokenInfos, AuthError> {
        if request.token.is_empty() {
            return Err(AuthError::MissingArguments);
        }

        let claims = self
            .jwt_service
            .validate(&request.token)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(TokenInfos::from(claims))
    }

    /// 토큰 갱신
    /// Renew an access token with a renew token.
    ///
    /// 처리 흐름:
    /// 1. Access Token 검증 (만료는 허용)
    /// 2. 만료된 Renew Token 정리 (백그라운드)
    /// 3. 사용자 조회
    /// 4. Renew Token 회전
    /// 5. 새 Access Token 발급
    /// 6. 갱신 시각 기록, 삭제 예정 해제, 감사 로그
    pub async fn renew_jwt(&self, request: RefreshJwtRequest) -> Result<TokenResponse, AuthError> {
        if request.access_token.is_empty() || request.refresh_token.is_empty() {
            return Err(AuthError::MissingArguments);
        }

        let claims = match self.jwt_service.validate(&request.access_token) {
            Ok(claims) => claims,
            Err(TokenError::Expired { claims }) => *claims,
            Err(TokenError::Invalid(reason)) => {
                tracing::warn!(reason = %reason, "token refresh: access token rejected");
                return Err(AuthError::AccessDenied(reason));
            }
        };
        let instance_id = claims.instance_id.as_str();

        self.renew_tokens.purge_expired(instance_id);

        let user = self
            .store
            .get_user_by_id(instance_id, claims.user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound {
                instance_id: instance_id.to_string(),
                user_id: claims.user_id.to_string(),
            })?;

        let refresh_token = match self
            .renew_tokens
            .rotate_and_promote(instance_id, user.id, &request.refresh_token)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(instance_id, user_id = %user.id, error = %e, "token refresh: rotation failed");
                self.save_log_event(LogEvent::new(
                    instance_id,
                    user.id,
                    LogEventType::Security,
                    LOG_EVENT_TOKEN_REFRESH_FAILED,
                    "wrong refresh token, cannot renew",
                ))
                .await;
                return Err(AuthError::RefreshFailed(e.to_string()));
            }
        };

        let access_token = self.issue_for(&user, &claims)?;

        // 활동 기록 후 해제: 그 사이의 비활성 표시는 조건 불충족으로 실패
        self.store
            .record_activity(instance_id, user.id, Activity::TokenRefresh, Utc::now().timestamp())
            .await?;
        self.store
            .update_marked_for_deletion(instance_id, user.id, MarkForDeletion::Reset)
            .await?;

        self.save_log_event(LogEvent::new(
            instance_id,
            user.id,
            LogEventType::Log,
            LOG_EVENT_TOKEN_REFRESH_SUCCESS,
            "",
        ))
        .await;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            account_confirmed: user.is_confirmed(),
            expires_in: self.token_expiration.num_minutes(),
            selected_profile_id: claims.profile_id,
            profiles: user.profiles,
            preferred_language: user.account.preferred_language,
        })
    }

    /// 사용자의 모든 Refresh Token 무효화 (모든 기기에서 로그아웃)
    /// Revoke all refresh tokens for user (logout from all devices)
    pub async fn revoke_all_refresh_tokens(
        &self,
        request: RevokeRefreshTokensRequest,
    ) -> Result<ServiceStatus, AuthError> {
        let token = match request.token {
            Some(token) if !token.instance_id.is_empty() && !token.id.is_nil() => token,
            _ => return Err(AuthError::MissingArguments),
        };

        self.store
            .get_user_by_id(&token.instance_id, token.id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound {
                instance_id: token.instance_id.clone(),
                user_id: token.id.to_string(),
            })?;

        let count = self.renew_tokens.revoke(&token.instance_id, token.id).await?;
        tracing::debug!(instance_id = %token.instance_id, user_id = %token.id, count, "revoked renew tokens");

        Ok(status("refresh tokens revoked"))
    }

    // 로그인 (비즈니스 로직)
    // Sign in with email and password; starts a new session
    pub async fn signin(&self, request: SigninRequest) -> Result<TokenResponse, AuthError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingArguments);
        }
        let instance_id = request.instance_id.as_str();
        let account_id = request.email.trim().to_lowercase();

        // 1. 이메일로 사용자 조회
        let user = self
            .store
            .get_user_by_account_id(instance_id, &account_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // 2. 비밀번호 검증
        verify_password(&request.password, &user.account.password_hash)?;

        // 3. 활동 기록 + 삭제 예정 해제
        self.store
            .record_activity(instance_id, user.id, Activity::Login, Utc::now().timestamp())
            .await?;
        self.store
            .update_marked_for_deletion(instance_id, user.id, MarkForDeletion::Reset)
            .await?;

        // 4. 새 세션 시작
        let (refresh_token, _) = self.renew_tokens.begin_session(instance_id, user.id).await?;

        let (main_profile, other_profiles) = user.main_and_other_profiles();
        let access_token = self.jwt_service.issue(
            TokenRequest {
                user_id: user.id,
                instance_id: instance_id.to_string(),
                account_confirmed: user.is_confirmed(),
                profile_id: main_profile,
                roles: user.roles.clone(),
                username: user.account.account_id.clone(),
                other_profile_ids: other_profiles,
            },
            self.token_expiration,
        )?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            account_confirmed: user.is_confirmed(),
            expires_in: self.token_expiration.num_minutes(),
            selected_profile_id: main_profile,
            profiles: user.profiles,
            preferred_language: user.account.preferred_language,
        })
    }

    /// 로그아웃 - 단일 Refresh Token 삭제
    /// Logout - delete one refresh token; an unknown token is not an error
    pub async fn logout(&self, request: LogoutRequest) -> Result<ServiceStatus, AuthError> {
        if request.refresh_token.is_empty() {
            return Err(AuthError::MissingArguments);
        }

        let removed = self
            .renew_tokens
            .revoke_token(&request.instance_id, &request.refresh_token)
            .await?;
        if !removed {
            tracing::debug!(instance_id = %request.instance_id, "logout: renew token not found");
        }

        Ok(status("logged out"))
    }

    /// 갱신 시 새 Access Token: 역할 / 사용자명은 이전 토큰에서 유지
    /// Roles and username carry over from the presented token's payload
    fn issue_for(&self, user: &User, claims: &Claims) -> Result<String, AuthError> {
        let (main_profile, other_profiles) = user.main_and_other_profiles();
        self.jwt_service.issue(
            TokenRequest {
                user_id: claims.user_id,
                instance_id: claims.instance_id.clone(),
                account_confirmed: user.is_confirmed(),
                profile_id: main_profile,
                roles: claims.roles(),
                username: claims.username(),
                other_profile_ids: other_profiles,
            },
            self.token_expiration,
        )
    }

    async fn save_log_event(&self, event: LogEvent) {
        if let Err(e) = self.audit.save_log_event(event).await {
            tracing::error!(error = %e, "failed to save log event");
        }
    }
}

fn status(msg: &str) -> ServiceStatus {
    ServiceStatus {
        status: "NORMAL".to_string(),
        msg: msg.to_string(),
        version: API_VERSION.to_string(),
    }
}

/// 비밀번호 해싱 (argon2)
/// Hash a password with argon2 (PHC string)
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHashingFailed(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    // 해시 형식이 잘못된 경우도 자격 증명 실패로 처리
    let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
