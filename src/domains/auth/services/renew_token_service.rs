use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domains::auth::models::{RenewToken, RotationWindow};
use crate::shared::database::TenantStore;
use crate::shared::errors::AuthError;
use crate::shared::utils::generate_unique_token;

/// 회전 직후 이전 토큰이 유효한 시간 (초)
/// Seconds the rotated-away token stays usable, to absorb client retries
pub const RENEW_TOKEN_GRACE_PERIOD: i64 = 30;

/// 새 Renew Token 수명 (90일)
/// Lifetime of a fresh renew token (90 days)
pub const RENEW_TOKEN_DEFAULT_LIFETIME: i64 = 90 * 24 * 60 * 60;

/// Renew Token 회전 관리자
/// Credential rotation manager: owns the renew token rows of every instance.
///
/// 역할:
/// - 세션 시작 (새 체인)
/// - 회전: 조회와 next_token 설정을 한 번의 조건부 쓰기로 처리
/// - 사용자 전체 / 단일 토큰 폐기, 만료 토큰 정리
///
/// Concurrent rotations of the same presented token converge: the first write
/// stores its candidate as `next_token`, every later one gets that value back.
#[derive(Clone)]
pub struct RenewTokenService {
    store: Arc<dyn TenantStore>,
}

impl RenewTokenService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// 새 체인 시작
    /// Start a fresh chain; returns the token and its expiry
    pub async fn begin_session(
        &self,
        instance_id: &str,
        user_id: Uuid,
    ) -> Result<(String, i64), AuthError> {
        let token = generate_unique_token();
        let expires_at = Utc::now().timestamp() + RENEW_TOKEN_DEFAULT_LIFETIME;

        let inserted = self
            .store
            .create_renew_token(instance_id, &RenewToken::new(user_id, token.clone(), expires_at))
            .await?;
        if !inserted {
            return Err(AuthError::Internal("renew token collision".to_string()));
        }

        Ok((token, expires_at))
    }

    /// 회전 (단일 조건부 쓰기)
    /// Rotation step. Matches `(user_id, presented, expires_at > now)`; the
    /// returned row carries the chain's successor, which is `candidate` only if
    /// this call won.
    pub async fn rotate(
        &self,
        instance_id: &str,
        user_id: Uuid,
        presented: &str,
        candidate: &str,
    ) -> Result<RenewToken, AuthError> {
        if presented.is_empty() || candidate.is_empty() {
            return Err(AuthError::RenewalNotFound);
        }

        let now = Utc::now().timestamp();
        let window = RotationWindow {
            now,
            grace_expires_at: now + RENEW_TOKEN_GRACE_PERIOD,
        };

        self.store
            .find_and_update_renew_token(instance_id, user_id, presented, candidate, window)
            .await?
            .ok_or(AuthError::RenewalNotFound)
    }

    /// 후속 토큰을 새 행으로 등록 (이미 있으면 그대로)
    /// Store the successor as a live row with the default lifetime. Idempotent:
    /// returns `false` when the row already exists.
    pub async fn promote(
        &self,
        instance_id: &str,
        user_id: Uuid,
        successor: &str,
    ) -> Result<bool, AuthError> {
        let expires_at = Utc::now().timestamp() + RENEW_TOKEN_DEFAULT_LIFETIME;
        let inserted = self
            .store
            .create_renew_token(
                instance_id,
                &RenewToken::new(user_id, successor.to_string(), expires_at),
            )
            .await?;
        Ok(inserted)
    }

    /// 회전 + 후속 토큰 등록
    /// Rotate with a fresh candidate and make sure the successor row exists.
    /// Returns the token the client should use from now on.
    pub async fn rotate_and_promote(
        &self,
        instance_id: &str,
        user_id: Uuid,
        presented: &str,
    ) -> Result<String, AuthError> {
        let candidate = generate_unique_token();
        let row = self.rotate(instance_id, user_id, presented, &candidate).await?;

        let successor = row
            .next_token
            .ok_or_else(|| AuthError::RefreshFailed("rotation left no successor".to_string()))?;

        // 경쟁에서 진 경우에도 등록 시도 (승자의 등록이 실패했을 수 있음)
        let created = self.promote(instance_id, user_id, &successor).await?;
        if successor == candidate && !created {
            tracing::warn!(instance_id, %user_id, "successor row already existed");
        }

        Ok(successor)
    }

    /// 사용자의 모든 Renew Token 삭제
    /// Delete every renew token of the user; returns how many were removed
    pub async fn revoke(&self, instance_id: &str, user_id: Uuid) -> Result<u64, AuthError> {
        let deleted = self
            .store
            .delete_renew_tokens_for_user(instance_id, user_id)
            .await?;
        Ok(deleted)
    }

    /// 단일 토큰 삭제 (로그아웃)
    /// Delete one token (logout of a single session)
    pub async fn revoke_token(&self, instance_id: &str, token: &str) -> Result<bool, AuthError> {
        let deleted = self
            .store
            .delete_renew_token_by_token(instance_id, token)
            .await?;
        Ok(deleted)
    }

    /// 만료 토큰 정리 (백그라운드, 에러는 로그만)
    /// Delete expired rows in the background; failures are logged, never returned
    pub fn purge_expired(&self, instance_id: &str) -> JoinHandle<()> {
        let store = self.store.clone();
        let instance_id = instance_id.to_string();

        tokio::spawn(async move {
            let now = Utc::now().timestamp();
            match store.delete_expired_renew_tokens(&instance_id, now).await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::debug!(instance_id = %instance_id, count, "purged expired renew tokens");
                }
                Err(e) => {
                    tracing::error!(
                        instance_id = %instance_id,
                        error = %format!("{:#}", e),
                        "failed to purge expired renew tokens"
                    );
                }
            }
        })
    }
}
