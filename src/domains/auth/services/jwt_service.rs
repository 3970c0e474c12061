// src/domains/auth/services/jwt_service.rs
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domains::auth::models::jwt::{Claims, TokenRequest};
use crate::shared::errors::{AuthError, ConfigError, TokenError};

/// JWT 서비스
/// JWT Service for access token issuance and validation (HS256)
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// JWT Service 생성
    /// Create JWT Service from raw key bytes
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// base64 로 인코딩된 키로 생성 (JWT_TOKEN_KEY)
    /// Create from the base64 key carried in JWT_TOKEN_KEY
    pub fn from_base64(key: &str) -> Result<Self, ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Missing {
                name: "JWT_TOKEN_KEY",
            });
        }

        let secret = STANDARD.decode(key).map_err(|e| ConfigError::Invalid {
            name: "JWT_TOKEN_KEY",
            value: "<redacted>".to_string(),
            reason: e.to_string(),
        })?;
        if secret.is_empty() {
            return Err(ConfigError::Missing {
                name: "JWT_TOKEN_KEY",
            });
        }

        Ok(Self::new(&secret))
    }

    /// Access Token 발급
    /// Issue an access token valid for `ttl`
    pub fn issue(&self, request: TokenRequest, ttl: chrono::Duration) -> Result<String, AuthError> {
        let claims = Claims::new(request, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Access Token 검증
    /// Verify an access token. Expiry is checked last, without leeway, so an
    /// expired but authentic token yields its claims in `TokenError::Expired`.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid("empty token".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        let claims = token_data.claims;
        if claims.exp <= chrono::Utc::now().timestamp() {
            return Err(TokenError::Expired {
                claims: Box::new(claims),
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> TokenRequest {
        TokenRequest {
            user_id: Uuid::new_v4(),
            instance_id: "test-instance".to_string(),
            account_confirmed: true,
            profile_id: Some(Uuid::new_v4()),
            roles: vec!["PARTICIPANT".to_string(), "ADMIN".to_string()],
            username: "user@example.com".to_string(),
            other_profile_ids: vec![],
        }
    }

    #[test]
    fn issued_token_validates_with_same_key() {
        let jwt = JwtService::new(b"0123456789abcdef0123456789abcdef");
        let req = request();
        let token = jwt.issue(req.clone(), chrono::Duration::minutes(5)).unwrap();

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.user_id, req.user_id);
        assert_eq!(claims.instance_id, "test-instance");
        assert_eq!(claims.roles(), vec!["PARTICIPANT", "ADMIN"]);
        assert_eq!(claims.username(), "user@example.com");
    }

    #[test]
    fn expired_token_returns_claims() {
        let jwt = JwtService::new(b"0123456789abcdef0123456789abcdef");
        let req = request();
        let token = jwt.issue(req.clone(), chrono::Duration::seconds(-10)).unwrap();

        match jwt.validate(&token) {
            Err(TokenError::Expired { claims }) => assert_eq!(claims.user_id, req.user_id),
            other => panic!("expected expired, got {:?}", other),
        }
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() {
        let issuer = JwtService::new(b"0123456789abcdef0123456789abcdef");
        let verifier = JwtService::new(b"fedcba9876543210fedcba9876543210");
        let token = issuer.issue(request(), chrono::Duration::minutes(5)).unwrap();

        assert!(matches!(verifier.validate(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(verifier.validate("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(verifier.validate(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn from_base64_rejects_missing_and_malformed_keys() {
        assert_eq!(
            JwtService::from_base64("").err(),
            Some(ConfigError::Missing { name: "JWT_TOKEN_KEY" })
        );
        assert!(matches!(
            JwtService::from_base64("%%%not base64%%%"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(JwtService::from_base64("c2VjcmV0LWtleS1mb3ItdGVzdHM=").is_ok());
    }
}
