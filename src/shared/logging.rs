// 로깅 초기화 (tracing-subscriber)
// Tracing subscriber setup
use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 로그 출력 형식
/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// RUST_LOG 이 없을 때 사용할 기본 레벨
    /// Default level when RUST_LOG is unset
    pub level: String,
    pub format: LogFormat,
}

/// RUST_LOG 우선, 없으면 LOG_LEVEL 기반 필터
/// RUST_LOG wins; otherwise the configured level with noisy crates turned down
fn build_env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},sqlx=warn,hyper=warn,tower=warn,reqwest=warn",
            config.level
        ))
    })
}

/// 전역 subscriber 설치 (프로세스당 한 번)
/// Install the global subscriber; fails if one is already installed
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(build_env_filter(config));

    match config.format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?,
    }

    Ok(())
}
