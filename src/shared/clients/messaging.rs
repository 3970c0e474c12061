use async_trait::async_trait;

use super::{build_http_client, post_json, EmailMessage, MessageSender};
use crate::shared::errors::ClientError;

const SERVICE: &str = "messaging-service";

// 메시지 서비스 HTTP 클라이언트
// Messaging service HTTP adapter
pub struct HttpMessageSender {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpMessageSender {
    // 클라이언트 생성
    // base_url: ADDR_MESSAGING_SERVICE (예: "http://messaging:5004")
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MessageSender for HttpMessageSender {
    async fn send_email(&self, message: EmailMessage) -> Result<(), ClientError> {
        // 즉시 발송 / 큐 등록
        // Instant send or queue for the next outgoing batch
        let path = if message.instant {
            "v1/email/send-instant"
        } else {
            "v1/email/queue"
        };
        let url = format!("{}/{}", self.base_url, path);

        tracing::debug!(
            instance_id = %message.instance_id,
            message_type = %message.message_type,
            url = %url,
            "sending email request"
        );
        post_json(&self.http_client, SERVICE, &url, &message).await
    }
}
