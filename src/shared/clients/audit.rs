use async_trait::async_trait;

use super::{build_http_client, post_json, AuditLogger, LogEvent};
use crate::shared::errors::ClientError;

const SERVICE: &str = "logging-service";

// 로깅 서비스 HTTP 클라이언트
// Logging (audit) service HTTP adapter
pub struct HttpAuditLogger {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpAuditLogger {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AuditLogger for HttpAuditLogger {
    async fn save_log_event(&self, event: LogEvent) -> Result<(), ClientError> {
        let url = format!("{}/v1/log-events", self.base_url);
        post_json(&self.http_client, SERVICE, &url, &event).await
    }
}
