// =====================================================
// 인증 API 통합 테스트 (라우터 + 메모리 저장소)
// =====================================================

mod common;
use common::*;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use std::sync::Arc;

use account_server::domains::auth::models::{MarkForDeletion, RefreshJwtRequest, TokenRequest};
use account_server::domains::auth::services::{hash_password, AuthService};
use account_server::shared::clients::{LOG_EVENT_TOKEN_REFRESH_FAILED, LOG_EVENT_TOKEN_REFRESH_SUCCESS};
use account_server::shared::database::TenantStore;

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn signed_up_user(store: &account_server::shared::database::MemoryTenantStore) -> account_server::domains::auth::models::User {
    let mut user = make_user("person@example.com");
    user.account.password_hash = hash_password(TEST_PASSWORD).unwrap();
    insert_user(store, INSTANCE, &user).await;
    user
}

async fn signin(app: &Router) -> Value {
    let (status, body) = post(
        app,
        "/api/auth/signin",
        json!({ "instance_id": INSTANCE, "email": " Person@Example.com ", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signin failed: {body}");
    body
}

/// 테스트: 로그인 → 검증 → 갱신 → 로그아웃 전체 흐름
#[tokio::test]
async fn test_signin_validate_renew_logout() {
    let store = setup_store();
    let recorders = Recorders::new();
    let app = test_app(store.clone(), &recorders);
    let user = signed_up_user(&store).await;

    let session = signin(&app).await;
    let access_token = session["access_token"].as_str().unwrap().to_string();
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(session["expires_in"], 60);

    let (status, infos) = post(&app, "/api/auth/validate", json!({ "token": access_token })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(infos["id"], user.id.to_string());
    assert_eq!(infos["instance_id"], INSTANCE);
    assert_eq!(infos["payload"]["username"], "person@example.com");

    let (status, renewed) = post(
        &app,
        "/api/auth/renew",
        json!({ "access_token": access_token, "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let next_refresh = renewed["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(next_refresh, refresh_token);

    let events = recorders.audit.events.lock().clone();
    assert_eq!(events.last().unwrap().event_name, LOG_EVENT_TOKEN_REFRESH_SUCCESS);

    let (status, _) = post(
        &app,
        "/api/auth/logout",
        json!({ "instance_id": INSTANCE, "refresh_token": next_refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 로그아웃된 토큰으로는 갱신 불가
    let (status, _) = post(
        &app,
        "/api/auth/renew",
        json!({ "access_token": access_token, "refresh_token": next_refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

/// 테스트: 만료된 Access Token 으로도 갱신 가능, 삭제 예정 표시는 해제됨
#[tokio::test]
async fn test_renew_accepts_expired_access_token_and_clears_mark() {
    let store = setup_store();
    let recorders = Recorders::new();
    let app = test_app(store.clone(), &recorders);
    let mut user = make_user("sleepy@example.com");
    user.timestamps.marked_for_deletion = now() + 3600;
    insert_user(&store, INSTANCE, &user).await;

    let (refresh_token, _) = account_server::domains::auth::services::RenewTokenService::new(store.clone())
        .begin_session(INSTANCE, user.id)
        .await
        .unwrap();
    let expired = jwt_service()
        .issue(
            TokenRequest {
                user_id: user.id,
                instance_id: INSTANCE.to_string(),
                account_confirmed: true,
                profile_id: Some(user.profiles[0].id),
                roles: vec!["PARTICIPANT".to_string()],
                username: "sleepy@example.com".to_string(),
                other_profile_ids: vec![],
            },
            chrono::Duration::seconds(-60),
        )
        .unwrap();

    let (status, body) = post(
        &app,
        "/api/auth/renew",
        json!({ "access_token": expired, "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "renew failed: {body}");
    assert_eq!(body["selected_profile_id"], user.profiles[0].id.to_string());

    let stored = store.get_user_by_id(INSTANCE, user.id).await.unwrap().unwrap();
    assert_eq!(stored.timestamps.marked_for_deletion, 0);
    assert!(stored.timestamps.last_token_refresh >= now() - 5);
}

/// 테스트: 갱신 중간에 비활성 표시가 끼어들어도 활동한 사용자는 표시되지 않음
#[tokio::test]
async fn test_renew_wins_against_interleaved_inactivity_mark() {
    let memory = setup_store();
    let recorders = Recorders::new();
    let t = now();
    let user = inactive_since(make_user("returning@example.com"), t - 1000);
    insert_user(&memory, INSTANCE, &user).await;

    // sweep 의 조건부 표시를 활동 기록 / 해제 직후마다 실행
    let store = Arc::new(InterleavingStore::new(
        memory.clone(),
        MarkForDeletion::Mark {
            delete_at: t + 500,
            inactive_before: t - 100,
        },
    ));
    let service = AuthService::new(
        store.clone(),
        jwt_service(),
        recorders.audit.clone(),
        chrono::Duration::minutes(60),
    );

    let (refresh_token, _) = service
        .renew_tokens()
        .begin_session(INSTANCE, user.id)
        .await
        .unwrap();
    let access_token = jwt_service()
        .issue(
            TokenRequest {
                user_id: user.id,
                instance_id: INSTANCE.to_string(),
                account_confirmed: true,
                profile_id: Some(user.profiles[0].id),
                roles: vec!["PARTICIPANT".to_string()],
                username: "returning@example.com".to_string(),
                other_profile_ids: vec![],
            },
            chrono::Duration::seconds(-60),
        )
        .unwrap();

    service
        .renew_jwt(RefreshJwtRequest {
            access_token,
            refresh_token,
        })
        .await
        .unwrap();

    let applied = store.applied.lock().clone();
    assert!(!applied.is_empty());
    assert!(applied.iter().all(|a| !a), "inactivity mark applied during refresh: {applied:?}");

    let stored = memory.get_user_by_id(INSTANCE, user.id).await.unwrap().unwrap();
    assert_eq!(stored.timestamps.marked_for_deletion, 0);
    assert!(stored.timestamps.last_token_refresh >= t);
}

/// 테스트: 잘못된 입력의 상태 코드 (400 / 401 / 403 / 500)
#[tokio::test]
async fn test_error_status_codes() {
    let store = setup_store();
    let recorders = Recorders::new();
    let app = test_app(store.clone(), &recorders);
    let user = signed_up_user(&store).await;
    let session = signin(&app).await;
    let access_token = session["access_token"].as_str().unwrap();

    // 400: 빈 토큰 / 잘못된 토큰
    let (status, _) = post(&app, "/api/auth/validate", json!({ "token": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(&app, "/api/auth/validate", json!({ "token": "garbage" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 401: 비밀번호 불일치
    let (status, _) = post(
        &app,
        "/api/auth/signin",
        json!({ "instance_id": INSTANCE, "email": "person@example.com", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 403: 서명이 맞지 않는 Access Token
    let (status, _) = post(
        &app,
        "/api/auth/renew",
        json!({ "access_token": "not.a.jwt", "refresh_token": "whatever" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 500: 잘못된 Refresh Token (감사 로그 SECURITY)
    let (status, body) = post(
        &app,
        "/api/auth/renew",
        json!({ "access_token": access_token, "refresh_token": "not-a-renew-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "refresh token error");
    let events = recorders.audit.events.lock().clone();
    let failed = events.last().unwrap();
    assert_eq!(failed.event_name, LOG_EVENT_TOKEN_REFRESH_FAILED);
    assert_eq!(failed.user_id, user.id.to_string());
}

/// 테스트: 허용 목록에 없는 인스턴스는 거부
#[tokio::test]
async fn test_unknown_instance_is_rejected() {
    let store = setup_store();
    let recorders = Recorders::new();
    let app = test_app(store.clone(), &recorders);
    signed_up_user(&store).await;

    for path in ["/api/auth/signin", "/api/auth/logout"] {
        let (status, _) = post(
            &app,
            path,
            json!({ "instance_id": "unknown", "email": "person@example.com", "password": TEST_PASSWORD, "refresh_token": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
    }

    let (status, _) = post(
        &app,
        "/api/auth/signin",
        json!({ "email": "person@example.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// 테스트: 전체 무효화 후 모든 세션 갱신 불가
#[tokio::test]
async fn test_revoke_all_ends_every_session() {
    let store = setup_store();
    let recorders = Recorders::new();
    let app = test_app(store.clone(), &recorders);
    let user = signed_up_user(&store).await;

    let first = signin(&app).await;
    let second = signin(&app).await;
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user.id).await.unwrap(), 2);

    let (status, infos) = post(
        &app,
        "/api/auth/validate",
        json!({ "token": first["access_token"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/api/auth/revoke-all", json!({ "token": infos })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.count_renew_tokens_for_user(INSTANCE, user.id).await.unwrap(), 0);

    for session in [first, second] {
        let (status, _) = post(
            &app,
            "/api/auth/renew",
            json!({ "access_token": session["access_token"], "refresh_token": session["refresh_token"] }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let (status, _) = post(&app, "/api/auth/revoke-all", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
