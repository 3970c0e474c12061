use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::shared::errors::AuthError;
use crate::shared::services::AppState;

/// 인스턴스 ID 를 가진 요청
/// Request type that names the instance it targets
pub trait InstanceScoped {
    fn instance_id(&self) -> &str;
}

/// 허용된 인스턴스 목록 (시작 시 한 번 로드)
/// Instance allow-list, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct InstanceAllowList {
    instances: Arc<HashSet<String>>,
}

impl InstanceAllowList {
    pub fn new<I, S>(instance_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            instances: Arc::new(instance_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.instances.contains(instance_id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.instances.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// 요청의 인스턴스 ID 검사
    /// Check the request's instance id by plain equality against the list
    pub fn check<R: InstanceScoped + ?Sized>(&self, request: &R) -> Result<(), AuthError> {
        let instance_id = request.instance_id();
        if instance_id.is_empty() {
            return Err(AuthError::MissingArguments);
        }
        if !self.contains(instance_id) {
            return Err(AuthError::InstanceNotAllowed {
                instance_id: instance_id.to_string(),
            });
        }
        Ok(())
    }
}

/// 인스턴스 검사를 통과한 JSON 본문
/// JSON body whose instance id passed the allow-list
///
/// 사용법:
/// ```rust,ignore
/// pub async fn signin(
///     State(app_state): State<AppState>,
///     ScopedJson(request): ScopedJson<SigninRequest>,
/// ) -> Result<...> { ... }
/// ```
#[derive(Debug)]
pub struct ScopedJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for ScopedJson<T>
where
    T: DeserializeOwned + InstanceScoped + Send,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| AuthError::MissingArguments)?;

        if let Err(e) = state.instances.check(&body) {
            tracing::warn!(error = %e, "request rejected by instance allow-list");
            return Err(e.into());
        }

        Ok(Self(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Req(&'static str);

    impl InstanceScoped for Req {
        fn instance_id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn check_compares_instance_ids() {
        let list = InstanceAllowList::new(["alpha", "beta"]);

        assert!(list.check(&Req("alpha")).is_ok());
        assert!(matches!(list.check(&Req("")), Err(AuthError::MissingArguments)));
        assert!(matches!(
            list.check(&Req("gamma")),
            Err(AuthError::InstanceNotAllowed { .. })
        ));
        assert_eq!(list.ids(), vec!["alpha", "beta"]);
    }
}
