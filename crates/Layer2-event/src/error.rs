//! Event 에러 타입
//!
//! - `InvalidRegistration`: 등록 시점에 동기적으로 발생 (fire 시점으로 미루지 않음)
//! - `HandlerInvocation`: dispatch 중 핸들러 실패 (fail-fast)

use crate::handler::HandlerPriority;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, EventError>;

/// 핸들러가 반환하는 결과
pub type HandlerResult = anyhow::Result<()>;

/// 등록이 거부된 이유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationIssue {
    /// Monitor 우선순위인데 이벤트가 Monitorable이 아님
    NotMonitorable,

    /// 바인딩의 이벤트 타입이 라우터의 타입과 다름
    TypeMismatch { expected: &'static str },
}

impl std::fmt::Display for RegistrationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotMonitorable => write!(f, "event is not monitorable"),
            Self::TypeMismatch { expected } => write!(f, "router expects {}", expected),
        }
    }
}

/// Event 시스템 에러
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid registration: {priority} handler for {event_type} ({reason})")]
    InvalidRegistration {
        event_type: &'static str,
        priority: HandlerPriority,
        reason: RegistrationIssue,
    },

    #[error("Handler '{handler}' failed on {event_type} at {priority} priority: {source}")]
    HandlerInvocation {
        event_type: &'static str,
        priority: HandlerPriority,
        handler: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EventError {
    /// 등록 에러인지 확인
    pub fn is_invalid_registration(&self) -> bool {
        matches!(self, Self::InvalidRegistration { .. })
    }

    /// 핸들러 실패인지 확인
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::HandlerInvocation { .. })
    }

    /// 관련된 우선순위
    pub fn priority(&self) -> HandlerPriority {
        match self {
            Self::InvalidRegistration { priority, .. } | Self::HandlerInvocation { priority, .. } => {
                *priority
            }
        }
    }
}
