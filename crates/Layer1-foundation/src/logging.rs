//! Logging - tracing subscriber 초기화
//!
//! `RUST_LOG` 환경 변수가 있으면 그 필터를, 없으면 [`LoggingConfig::level`]을 사용합니다.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 설정에서 필터 생성
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e))),
    }
}

/// 전역 subscriber 설치
///
/// 이미 설치되어 있으면 `Error::Config`를 반환합니다 (panic 하지 않음).
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| Error::config(format!("Logging already initialized: {}", e)))
}
