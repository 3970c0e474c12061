// 외부 서비스 클라이언트
// Downstream service clients (messaging, audit logging, study service)
//
// The lifecycle sweeps and the auth service only see the traits below; the
// HTTP adapters and the no-op adapters are picked at startup.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domains::auth::models::TokenInfos;
use crate::shared::errors::ClientError;

pub mod audit;
pub mod messaging;
pub mod study;

pub use audit::*;
pub use messaging::*;
pub use study::*;

/// 감사 로그 이벤트 출처
/// Origin recorded on every audit event
pub const LOG_EVENT_ORIGIN: &str = "account-server";

pub const LOG_EVENT_TOKEN_REFRESH_SUCCESS: &str = "TOKEN_REFRESH_SUCCESS";
pub const LOG_EVENT_TOKEN_REFRESH_FAILED: &str = "TOKEN_REFRESH_FAILED";
pub const LOG_EVENT_ACCOUNT_DELETED_AFTER_INACTIVITY: &str = "ACCOUNT_DELETED_AFTER_INACTIVITY";

pub const EMAIL_TYPE_VERIFICATION_REMINDER: &str = "registration-reminder";
pub const EMAIL_TYPE_ACCOUNT_INACTIVITY: &str = "account-inactivity";
pub const EMAIL_TYPE_ACCOUNT_DELETED_AFTER_INACTIVITY: &str = "account-deleted-after-inactivity";

/// 이메일 발송 요청
/// Email dispatch request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub instance_id: String,
    pub to: Vec<String>,
    pub message_type: String,
    #[serde(default)]
    pub content_infos: HashMap<String, String>,
    #[serde(default)]
    pub preferred_language: String,
    #[serde(default)]
    pub use_low_prio: bool,
    /// true: 즉시 발송 / false: 큐에 등록
    /// Send immediately instead of queueing
    #[serde(skip)]
    pub instant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogEventType {
    Log,
    Security,
    Error,
}

/// 감사 로그 이벤트
/// Audit log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub origin: String,
    pub instance_id: String,
    pub user_id: String,
    pub event_type: LogEventType,
    pub event_name: String,
    #[serde(default)]
    pub msg: String,
}

impl LogEvent {
    pub fn new(
        instance_id: &str,
        user_id: impl ToString,
        event_type: LogEventType,
        event_name: &str,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            origin: LOG_EVENT_ORIGIN.to_string(),
            instance_id: instance_id.to_string(),
            user_id: user_id.to_string(),
            event_type,
            event_name: event_name.to_string(),
            msg: msg.into(),
        }
    }
}

/// 이메일 / 메시지 발송
/// "Send notification"
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<(), ClientError>;
}

/// 감사 로그 기록
/// "Record audit event"
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn save_log_event(&self, event: LogEvent) -> Result<(), ClientError>;
}

/// 프로필 삭제 통지 (study service)
/// "Notify profile deprovisioned"; called once per deleted profile
#[async_trait]
pub trait ProfileDeprovisioner: Send + Sync {
    async fn profile_deleted(&self, token: TokenInfos) -> Result<(), ClientError>;
}

/// 주입되는 클라이언트 묶음
/// Collaborators handed to the services at construction time
#[derive(Clone)]
pub struct ServiceClients {
    pub messaging: Arc<dyn MessageSender>,
    pub audit: Arc<dyn AuditLogger>,
    pub study: Arc<dyn ProfileDeprovisioner>,
}

impl ServiceClients {
    /// 모든 호출을 버리는 클라이언트 묶음
    /// Bundle that accepts and drops every call
    pub fn noop() -> Self {
        Self {
            messaging: Arc::new(NoopClient),
            audit: Arc::new(NoopClient),
            study: Arc::new(NoopClient),
        }
    }
}

/// 주소가 설정되지 않은 서비스용
/// Stand-in for a service without a configured address
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClient;

#[async_trait]
impl MessageSender for NoopClient {
    async fn send_email(&self, message: EmailMessage) -> Result<(), ClientError> {
        tracing::debug!(
            instance_id = %message.instance_id,
            message_type = %message.message_type,
            "messaging service not configured, email dropped"
        );
        Ok(())
    }
}

#[async_trait]
impl AuditLogger for NoopClient {
    async fn save_log_event(&self, event: LogEvent) -> Result<(), ClientError> {
        tracing::debug!(
            instance_id = %event.instance_id,
            event_name = %event.event_name,
            "logging service not configured, event dropped"
        );
        Ok(())
    }
}

#[async_trait]
impl ProfileDeprovisioner for NoopClient {
    async fn profile_deleted(&self, token: TokenInfos) -> Result<(), ClientError> {
        tracing::debug!(
            instance_id = %token.instance_id,
            "study service not configured, profile deletion not forwarded"
        );
        Ok(())
    }
}

/// 공통 HTTP 클라이언트 생성
/// Shared reqwest client builder for the HTTP adapters
pub(crate) fn build_http_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .user_agent("account-server/1.0")
        .build()
        .map_err(|source| ClientError::Unavailable {
            service: "http-client",
            source,
        })
}

/// JSON POST 후 상태 코드 확인
/// POST a JSON body and turn non-success statuses into `ClientError::Status`
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    http_client: &reqwest::Client,
    service: &'static str,
    url: &str,
    body: &T,
) -> Result<(), ClientError> {
    let response = http_client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|source| ClientError::Unavailable { service, source })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            service,
            status,
            body,
        });
    }

    Ok(())
}
