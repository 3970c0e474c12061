use async_trait::async_trait;

use super::{build_http_client, post_json, ProfileDeprovisioner};
use crate::domains::auth::models::TokenInfos;
use crate::shared::errors::ClientError;

const SERVICE: &str = "study-service";

// Study 서비스 HTTP 클라이언트
// Study service HTTP adapter; told about every deleted profile
pub struct HttpProfileDeprovisioner {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpProfileDeprovisioner {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http_client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProfileDeprovisioner for HttpProfileDeprovisioner {
    async fn profile_deleted(&self, token: TokenInfos) -> Result<(), ClientError> {
        let url = format!("{}/v1/profile-deleted", self.base_url);
        post_json(&self.http_client, SERVICE, &url, &token).await
    }
}
