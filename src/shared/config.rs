// 애플리케이션 설정 (환경변수)
// Application configuration, read from the environment once at startup
use std::time::Duration;

use crate::domains::lifecycle::models::LifecycleThresholds;
use crate::domains::lifecycle::services::DEFAULT_TIMER_EVENT_FREQUENCY;
use crate::shared::errors::ConfigError;
use crate::shared::logging::{LogConfig, LogFormat};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
pub const ENV_JWT_TOKEN_KEY: &str = "JWT_TOKEN_KEY";
pub const ENV_TOKEN_EXPIRATION_MIN: &str = "TOKEN_EXPIRATION_MIN";
pub const ENV_CONTACT_VERIFICATION_TOKEN_LIFETIME: &str = "CONTACT_VERIFICATION_TOKEN_LIFETIME";
pub const ENV_CLEAN_UP_UNVERIFIED_USERS_AFTER: &str = "CLEAN_UP_UNVERIFIED_USERS_AFTER";
pub const ENV_SEND_REMINDER_TO_UNVERIFIED_USERS_AFTER: &str = "SEND_REMINDER_TO_UNVERIFIED_USERS_AFTER";
pub const ENV_NOTIFY_INACTIVE_USERS_AFTER: &str = "NOTIFY_INACTIVE_USERS_AFTER";
pub const ENV_DELETE_ACCOUNT_AFTER_NOTIFYING_USER: &str = "DELETE_ACCOUNT_AFTER_NOTIFYING_USER";
pub const ENV_TIMER_EVENT_FREQUENCY: &str = "TIMER_EVENT_FREQUENCY";
pub const ENV_DISABLE_TIMER_TASK: &str = "DISABLE_TIMER_TASK";
pub const ENV_ADDR_MESSAGING_SERVICE: &str = "ADDR_MESSAGING_SERVICE";
pub const ENV_ADDR_LOGGING_SERVICE: &str = "ADDR_LOGGING_SERVICE";
pub const ENV_ADDR_STUDY_SERVICE: &str = "ADDR_STUDY_SERVICE";
pub const ENV_WEEKDAY_ASSIGNATION_WEIGHTS: &str = "WEEKDAY_ASSIGNATION_WEIGHTS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3002";
const DEFAULT_TOKEN_EXPIRATION_MIN: i64 = 55;
const DEFAULT_CONTACT_VERIFICATION_TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// 외부 서비스 주소 (없으면 no-op 클라이언트 사용)
/// Downstream service addresses; a missing one gets the no-op client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUrls {
    pub messaging: Option<String>,
    pub logging: Option<String>,
    pub study: Option<String>,
}

/// 애플리케이션 설정
/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: String,
    /// base64 HS256 키 / base64-encoded HS256 key
    pub jwt_token_key: String,
    /// Access Token 수명 / access token lifetime
    pub token_expiration: chrono::Duration,
    pub lifecycle: LifecycleThresholds,
    pub timer_event_frequency: Duration,
    pub disable_timer_task: bool,
    pub service_urls: ServiceUrls,
    /// 요일 배정 가중치 (해석하지 않고 그대로 전달)
    /// Weekday assignment weights, passed through untouched
    pub weekday_assignation_weights: Option<String>,
    pub log: LogConfig,
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 조회 함수로부터 설정 로드 (테스트용으로도 사용)
    /// Load configuration through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get(ENV_DATABASE_URL).ok_or(ConfigError::Missing {
            name: ENV_DATABASE_URL,
        })?;
        let jwt_token_key = get(ENV_JWT_TOKEN_KEY).ok_or(ConfigError::Missing {
            name: ENV_JWT_TOKEN_KEY,
        })?;

        let token_expiration_min = match get(ENV_TOKEN_EXPIRATION_MIN) {
            Some(v) => v.parse::<i64>().ok().filter(|m| *m > 0).ok_or_else(|| {
                ConfigError::Invalid {
                    name: ENV_TOKEN_EXPIRATION_MIN,
                    value: v.clone(),
                    reason: "expected a positive number of minutes".to_string(),
                }
            })?,
            None => DEFAULT_TOKEN_EXPIRATION_MIN,
        };

        // 미인증 정리 / 리마인더 기준은 필수
        let clean_up = required_seconds(&get, ENV_CLEAN_UP_UNVERIFIED_USERS_AFTER)?;
        let reminder = required_seconds(&get, ENV_SEND_REMINDER_TO_UNVERIFIED_USERS_AFTER)?;
        let notify = optional_seconds(&get, ENV_NOTIFY_INACTIVE_USERS_AFTER, Duration::ZERO)?;
        let delete_after = optional_seconds(&get, ENV_DELETE_ACCOUNT_AFTER_NOTIFYING_USER, Duration::ZERO)?;

        let contact_verification = env_duration(
            &get,
            ENV_CONTACT_VERIFICATION_TOKEN_LIFETIME,
            DEFAULT_CONTACT_VERIFICATION_TOKEN_LIFETIME,
            "m",
        )?;

        let timer_event_frequency =
            env_duration(&get, ENV_TIMER_EVENT_FREQUENCY, DEFAULT_TIMER_EVENT_FREQUENCY, "s")?;
        if timer_event_frequency.is_zero() {
            return Err(ConfigError::Invalid {
                name: ENV_TIMER_EVENT_FREQUENCY,
                value: "0".to_string(),
                reason: "frequency must be positive".to_string(),
            });
        }

        let service_urls = ServiceUrls {
            messaging: get(ENV_ADDR_MESSAGING_SERVICE),
            logging: get(ENV_ADDR_LOGGING_SERVICE),
            study: get(ENV_ADDR_STUDY_SERVICE),
        };

        let log_format = match get(ENV_LOG_FORMAT) {
            Some(v) => v.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                name: ENV_LOG_FORMAT,
                value: v.clone(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            listen_addr: get(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            jwt_token_key,
            token_expiration: chrono::Duration::minutes(token_expiration_min),
            lifecycle: LifecycleThresholds {
                clean_up_unverified_after: clean_up,
                reminder_after: reminder,
                notify_inactive_after: notify,
                delete_after_notify: delete_after,
                contact_verification_token_lifetime: contact_verification.as_secs() as i64,
            },
            timer_event_frequency,
            disable_timer_task: get(ENV_DISABLE_TIMER_TASK).as_deref() == Some("true"),
            service_urls,
            weekday_assignation_weights: get(ENV_WEEKDAY_ASSIGNATION_WEIGHTS),
            log: LogConfig {
                level: get(ENV_LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
                format: log_format,
            },
        })
    }
}

fn required_seconds<G>(get: &G, name: &'static str) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = get(name).ok_or(ConfigError::Missing { name })?;
    to_seconds(name, &value, parse_duration(&value, "s"))
}

fn optional_seconds<G>(get: &G, name: &'static str, default: Duration) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(env_duration(get, name, default, "s")?.as_secs() as i64)
}

fn to_seconds(
    name: &'static str,
    value: &str,
    parsed: Result<Duration, String>,
) -> Result<i64, ConfigError> {
    parsed
        .map(|d| d.as_secs() as i64)
        .map_err(|reason| ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason,
        })
}

/// 환경변수 기간 값 (없으면 기본값)
/// Duration from the environment, or `default` when unset
fn env_duration<G>(
    get: &G,
    name: &'static str,
    default: Duration,
    default_unit: &str,
) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => parse_duration(&value, default_unit).map_err(|reason| ConfigError::Invalid {
            name,
            value,
            reason,
        }),
        None => Ok(default),
    }
}

/// 기간 문자열 파싱
/// Parse a duration. A bare integer takes `default_unit`; otherwise the value
/// is a sequence of `<integer><unit>` pairs with units `s`, `m`, `h`, `d`
/// (e.g. `90s`, `5m`, `1h30m`).
pub fn parse_duration(value: &str, default_unit: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }

    if value.chars().all(|c| c.is_ascii_digit()) {
        return parse_duration(&format!("{}{}", value, default_unit), "s");
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            other => return Err(format!("unknown unit '{}'", other)),
        };
        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("missing number before '{}'", c))?;
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| "duration overflow".to_string())?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after '{}'", digits));
    }
    Ok(Duration::from_secs(total))
}
