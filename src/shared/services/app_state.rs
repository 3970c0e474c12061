use crate::domains::auth::services::state::AuthState;
use crate::shared::middleware::InstanceAllowList;

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
///
/// 역할: 핸들러에서 필요한 서비스와 인스턴스 허용 목록을 묶음
#[derive(Clone)]
pub struct AppState {
    pub auth_state: AuthState,
    /// 허용된 인스턴스 (시작 시 로드)
    /// Allowed instances (loaded at startup)
    pub instances: InstanceAllowList,
}

impl AppState {
    pub fn new(auth_state: AuthState, instances: InstanceAllowList) -> Self {
        Self {
            auth_state,
            instances,
        }
    }
}
