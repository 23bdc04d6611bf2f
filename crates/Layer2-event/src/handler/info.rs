//! HandlerInfo - 핸들러 디스크립터
//!
//! (이벤트 타입, 우선순위) 쌍. Monitor 우선순위는 Monitorable 이벤트에만 허용되며
//! 위반은 등록 시점에 한 번 검사되어 거부됩니다 (조용히 다른 단계로 바꾸지 않음).

use super::HandlerPriority;
use crate::error::{EventError, RegistrationIssue, Result};
use crate::event::{Event, EventType};

/// 핸들러 디스크립터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerInfo {
    event_type: EventType,
    priority: HandlerPriority,
}

impl HandlerInfo {
    /// 타입 파라미터로 생성 + 검증
    pub fn new<E: Event>(priority: HandlerPriority) -> Result<Self> {
        Self::of(EventType::of::<E>(), priority)
    }

    /// 런타임 타입으로 생성 + 검증
    pub fn of(event_type: EventType, priority: HandlerPriority) -> Result<Self> {
        let info = Self {
            event_type,
            priority,
        };
        info.validate()?;
        Ok(info)
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn priority(&self) -> HandlerPriority {
        self.priority
    }

    /// Monitor 단계인데 이벤트가 Monitorable이 아닌 경우 `true`
    pub fn violates_monitor_rule(&self) -> bool {
        self.priority.is_monitor() && !self.event_type.is_monitorable()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.violates_monitor_rule() {
            return Err(self.rejected(RegistrationIssue::NotMonitorable));
        }
        Ok(())
    }

    pub(crate) fn rejected(&self, reason: RegistrationIssue) -> EventError {
        EventError::InvalidRegistration {
            event_type: self.event_type.name(),
            priority: self.priority,
            reason,
        }
    }
}

impl std::fmt::Display for HandlerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.event_type, self.priority)
    }
}
