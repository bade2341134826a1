/// 환경 변수 기반 설정
// region:    --- Imports
use std::time::Duration;
use thiserror::Error;
// endregion: --- Imports

const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
// 하루에 한 번
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub kafka_brokers: String,
    pub listen_addr: String,
    pub max_connections: u32,
    pub closing_sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 변수 조회 함수를 받아서 설정 구성 (테스트에서 환경 변수 없이 사용)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let kafka_brokers =
            lookup("KAFKA_BROKERS").unwrap_or_else(|| DEFAULT_KAFKA_BROKERS.to_string());
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let sweep_secs = parse_or(
            "CLOSING_SWEEP_INTERVAL_SECS",
            lookup("CLOSING_SWEEP_INTERVAL_SECS"),
            DEFAULT_SWEEP_INTERVAL_SECS,
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CLOSING_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            kafka_brokers,
            listen_addr,
            max_connections,
            closing_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
