use thiserror::Error;

/// 설정 에러 (시작 시 치명적)
/// Startup configuration error; the process refuses to start
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}: not provided")]
    Missing { name: &'static str },

    #[error("{name}: invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
