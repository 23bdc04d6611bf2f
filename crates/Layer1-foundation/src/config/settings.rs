//! Settings - 이벤트 버스 / 로깅 설정 타입
//!
//! 모든 필드는 `#[serde(default)]` 이므로 설정 파일에는 바꾸고 싶은 값만 적으면 됩니다.
//!
//! ```toml
//! [event_bus]
//! debug_mode = true
//! slow_handler_threshold_ms = 50
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// EventBusConfig
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// 디버그 모드 (모든 dispatch / 핸들러 호출을 trace 로깅)
    pub debug_mode: bool,

    /// 핸들러 panic을 `HandlerInvocation` 에러로 변환
    pub catch_panics: bool,

    /// 이 시간(ms)을 넘긴 핸들러는 warn 로그
    pub slow_handler_threshold_ms: Option<u64>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            catch_panics: true,
            slow_handler_threshold_ms: None,
        }
    }
}

impl EventBusConfig {
    /// 디버그 모드 설정
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// panic 변환 여부 설정
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// 느린 핸들러 임계값 설정
    pub fn with_slow_handler_threshold_ms(mut self, threshold_ms: u64) -> Self {
        self.slow_handler_threshold_ms = Some(threshold_ms);
        self
    }
}

// ============================================================================
// LoggingConfig
// ============================================================================

/// 로깅 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 기본 필터 (`RUST_LOG`가 있으면 그쪽이 우선)
    pub level: String,

    /// 로그에 target(모듈 경로) 표시
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

// ============================================================================
// Settings - 통합 설정
// ============================================================================

/// 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub event_bus: EventBusConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }
}
