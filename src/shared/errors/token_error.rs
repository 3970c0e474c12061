use thiserror::Error;

use crate::domains::auth::models::Claims;

/// Access Token 검증 에러
/// Access token validation outcome other than success
///
/// `Expired` still carries the decoded claims: the renewal flow needs them to
/// know who is asking, and the signature was verified before expiry was checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired { claims: Box<Claims> },

    #[error("invalid token: {0}")]
    Invalid(String),
}
