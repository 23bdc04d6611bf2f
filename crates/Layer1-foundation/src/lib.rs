//! # rub-foundation
//!
//! Foundation layer for rub-event:
//! - Error: 공통 에러 타입
//! - Config: 통합 설정 (EventBusConfig, LoggingConfig) + 레이어별 로더
//! - Logging: tracing subscriber 초기화
//!
//! ## 사용법
//!
//! ```ignore
//! use rub_foundation::{config::ConfigLoader, logging};
//!
//! let settings = ConfigLoader::new(&std::env::current_dir()?).load_all()?;
//! logging::init(&settings.logging)?;
//!
//! // settings.event_bus 는 rub_event::EventBus::with_config 로 전달
//! ```

pub mod config;
pub mod error;
pub mod logging;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{ConfigLoader, EventBusConfig, LoggingConfig, Settings};
