// Auth domain state
// 인증 도메인 상태
use std::sync::Arc;

use crate::domains::auth::services::{AuthService, JwtService};
use crate::shared::clients::AuditLogger;
use crate::shared::database::TenantStore;

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
}

impl AuthState {
    /// Create AuthState with store, JWT service and audit client
    /// AuthState 생성 (저장소, JWT 서비스, 감사 로그 클라이언트 필요)
    pub fn new(
        store: Arc<dyn TenantStore>,
        jwt_service: JwtService,
        audit: Arc<dyn AuditLogger>,
        token_expiration: chrono::Duration,
    ) -> Self {
        Self {
            auth_service: AuthService::new(store, jwt_service, audit, token_expiration),
        }
    }
}
