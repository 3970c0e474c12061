// =====================================================
// Renew Token 회전 통합 테스트
// =====================================================

mod common;
use common::*;

use std::sync::Arc;

use account_server::domains::auth::models::RenewToken;
use account_server::domains::auth::services::{RenewTokenService, RENEW_TOKEN_GRACE_PERIOD};
use account_server::shared::database::TenantStore;
use account_server::shared::errors::AuthError;
use uuid::Uuid;

async fn setup_session() -> (Arc<account_server::shared::database::MemoryTenantStore>, RenewTokenService, Uuid, String) {
    let store = setup_store();
    let user = make_user("rotate@example.com");
    insert_user(&store, INSTANCE, &user).await;

    let service = RenewTokenService::new(store.clone());
    let (token, _) = service.begin_session(INSTANCE, user.id).await.unwrap();
    (store, service, user.id, token)
}

/// 테스트: 같은 토큰으로 동시에 회전하면 모두 같은 후속 토큰을 받음
#[tokio::test]
async fn test_concurrent_rotation_converges() {
    let (store, service, user_id, token) = setup_session().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            service.rotate_and_promote(INSTANCE, user_id, &token).await
        }));
    }

    let mut successors = Vec::new();
    for handle in handles {
        successors.push(handle.await.unwrap().unwrap());
    }

    let first = successors[0].clone();
    assert!(successors.iter().all(|s| *s == first), "every caller must see the same successor");
    assert_ne!(first, token);

    // 이전 토큰 (유예 중) + 후속 토큰
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user_id).await.unwrap(), 2);
}

/// 테스트: 유예 기간 내 재시도는 같은 후속 토큰을 반환하고 행을 늘리지 않음
#[tokio::test]
async fn test_retry_within_grace_is_idempotent() {
    let (store, service, user_id, token) = setup_session().await;

    let first = service.rotate_and_promote(INSTANCE, user_id, &token).await.unwrap();
    let again = service.rotate_and_promote(INSTANCE, user_id, &token).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user_id).await.unwrap(), 2);

    // 회전된 행의 만료 시각은 유예 기간으로 줄어듦
    let row = service
        .rotate(INSTANCE, user_id, &token, "ignored-candidate")
        .await
        .unwrap();
    assert_eq!(row.next_token.as_deref(), Some(first.as_str()));
    assert!(row.expires_at <= now() + RENEW_TOKEN_GRACE_PERIOD);
}

/// 테스트: 후속 토큰으로 다시 회전하면 체인이 진행됨
#[tokio::test]
async fn test_successor_continues_chain() {
    let (_store, service, user_id, token) = setup_session().await;

    let second = service.rotate_and_promote(INSTANCE, user_id, &token).await.unwrap();
    let third = service.rotate_and_promote(INSTANCE, user_id, &second).await.unwrap();

    assert_ne!(third, second);
    assert_ne!(third, token);
}

/// 테스트: 만료된 토큰 / 다른 사용자 / 빈 입력은 회전 불가
#[tokio::test]
async fn test_rotation_rejects_expired_or_foreign_tokens() {
    let (store, service, user_id, token) = setup_session().await;

    // 유예가 끝난 행 (next_token 이미 설정)
    let exhausted = RenewToken {
        user_id,
        renew_token: "exhausted-token".to_string(),
        expires_at: now() - 1,
        next_token: Some("successor".to_string()),
    };
    store.create_renew_token(INSTANCE, &exhausted).await.unwrap();

    let result = service.rotate_and_promote(INSTANCE, user_id, "exhausted-token").await;
    assert!(matches!(result, Err(AuthError::RenewalNotFound)));

    let result = service.rotate_and_promote(INSTANCE, Uuid::new_v4(), &token).await;
    assert!(matches!(result, Err(AuthError::RenewalNotFound)));

    let result = service.rotate_and_promote(INSTANCE, user_id, "").await;
    assert!(matches!(result, Err(AuthError::RenewalNotFound)));

    // 다른 인스턴스에서는 보이지 않음
    let result = service.rotate_and_promote(OTHER_INSTANCE, user_id, &token).await;
    assert!(matches!(result, Err(AuthError::RenewalNotFound)));
}

/// 테스트: 후속 토큰 등록은 멱등
#[tokio::test]
async fn test_promote_is_idempotent() {
    let (store, service, user_id, _token) = setup_session().await;

    assert!(service.promote(INSTANCE, user_id, "successor-token").await.unwrap());
    assert!(!service.promote(INSTANCE, user_id, "successor-token").await.unwrap());
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user_id).await.unwrap(), 2);
}

/// 테스트: 사용자 전체 폐기 후에는 어떤 토큰도 회전 불가
#[tokio::test]
async fn test_revoke_removes_every_chain() {
    let (store, service, user_id, token) = setup_session().await;
    let (other_session, _) = service.begin_session(INSTANCE, user_id).await.unwrap();

    assert_eq!(service.revoke(INSTANCE, user_id).await.unwrap(), 2);
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user_id).await.unwrap(), 0);

    for presented in [token, other_session] {
        let result = service.rotate_and_promote(INSTANCE, user_id, &presented).await;
        assert!(matches!(result, Err(AuthError::RenewalNotFound)));
    }
}

/// 테스트: 만료 토큰 정리는 살아 있는 토큰을 건드리지 않음
#[tokio::test]
async fn test_purge_expired_keeps_live_tokens() {
    let (store, service, user_id, token) = setup_session().await;
    store
        .create_renew_token(INSTANCE, &RenewToken::new(user_id, "old".to_string(), now() - 100))
        .await
        .unwrap();

    service.purge_expired(INSTANCE).await.unwrap();

    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user_id).await.unwrap(), 1);
    assert!(service.rotate_and_promote(INSTANCE, user_id, &token).await.is_ok());
}
