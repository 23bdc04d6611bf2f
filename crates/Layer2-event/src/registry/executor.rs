//! EventExecutor - 이벤트 타입별 우선순위 라우터
//!
//! 네 단계(Early, Normal, Late, Monitor)의 핸들러 집합을 가지며, 고정된 순서로 실행합니다.
//!
//! - Early / Normal / Late: 같은 원본 `&mut E`를 공유 (취소 플래그 등 변경이 다음 핸들러에 보임)
//! - Monitor: 핸들러마다 `E::snapshot()`으로 만든 새 복사본을 받음. 변경은 버려짐
//!
//! 같은 단계 안의 실행 순서는 정의하지 않습니다 (현재는 등록 순서지만 의존하면 안 됨).
//!
//! ## 실패 정책: fail-fast
//!
//! 핸들러가 실패하면 즉시 `HandlerInvocation`으로 감싸 반환하고, 같은 단계의 나머지와
//! 이후 단계는 이번 fire에서 실행하지 않습니다. 나머지 핸들러는 등록된 채로 남아
//! 다음 fire에서 다시 실행됩니다.

use crate::error::{EventError, RegistrationIssue, Result};
use crate::event::{Event, EventType, Snapshot};
use crate::handler::{Handler, HandlerInfo, HandlerKey, HandlerPriority};
use parking_lot::RwLock;
use rub_foundation::EventBusConfig;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

type Tier<E> = Arc<Vec<Handler<E>>>;

/// 우선순위 라우터
pub struct EventExecutor<E> {
    event_type: EventType,
    /// 단계별 핸들러 (copy-on-write, dispatch는 Arc만 복제)
    tiers: RwLock<[Tier<E>; 4]>,
}

impl<E: Event> EventExecutor<E> {
    pub fn new() -> Self {
        Self {
            event_type: EventType::of::<E>(),
            tiers: RwLock::new(std::array::from_fn(|_| Arc::new(Vec::new()))),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    // ========================================================================
    // 등록 / 해제
    // ========================================================================

    /// 핸들러 등록
    ///
    /// 새로 추가되면 `true`, 같은 identity가 이미 있으면 `false` (중복 등록은 무시).
    pub fn register(&self, info: HandlerInfo, handler: Handler<E>) -> Result<bool> {
        info.validate()?;
        if info.event_type() != self.event_type {
            return Err(info.rejected(RegistrationIssue::TypeMismatch {
                expected: self.event_type.name(),
            }));
        }

        let mut tiers = self.tiers.write();
        let tier = &mut tiers[info.priority().index()];

        if tier.iter().any(|h| h.key() == handler.key()) {
            trace!(
                event_type = %self.event_type,
                priority = %info.priority(),
                handler = handler.label(),
                "Handler already registered"
            );
            return Ok(false);
        }

        debug!(
            event_type = %self.event_type,
            priority = %info.priority(),
            handler = handler.label(),
            key = %handler.key(),
            "Registering event handler"
        );
        Arc::make_mut(tier).push(handler);

        Ok(true)
    }

    /// 핸들러 해제
    pub fn unregister(&self, priority: HandlerPriority, key: HandlerKey) -> bool {
        let mut tiers = self.tiers.write();
        let tier = &mut tiers[priority.index()];

        let Some(pos) = tier.iter().position(|h| h.key() == key) else {
            return false;
        };
        let removed = Arc::make_mut(tier).remove(pos);

        debug!(
            event_type = %self.event_type,
            priority = %priority,
            handler = removed.label(),
            "Unregistered event handler"
        );
        true
    }

    /// 전체 핸들러 수
    pub fn handler_count(&self) -> usize {
        self.tiers.read().iter().map(|tier| tier.len()).sum()
    }

    /// 단계별 핸들러 수
    pub fn tier_len(&self, priority: HandlerPriority) -> usize {
        self.tiers.read()[priority.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// 모든 단계를 순서대로 실행
    pub fn fire(&self, event: &mut E, config: &EventBusConfig) -> Result<()> {
        // 락은 스냅샷 동안만 유지 (핸들러가 버스에 재진입 가능)
        let tiers = self.tiers.read().clone();

        if config.debug_mode {
            trace!(
                event = %event.debug_name(),
                handlers = tiers.iter().map(|t| t.len()).sum::<usize>(),
                "Dispatching event"
            );
        }

        for priority in HandlerPriority::ALL {
            let handlers = &tiers[priority.index()];
            if handlers.is_empty() {
                continue;
            }

            let snapshot = if priority.is_monitor() { E::snapshot() } else { None };
            for handler in handlers.iter() {
                self.invoke(handler, priority, event, snapshot, config)?;
            }
        }

        Ok(())
    }

    /// 핸들러 한 건 실행
    ///
    /// `snapshot`이 있으면 복사본을 만들어 넘깁니다. 복사 중 panic도 이 핸들러의 실패로 처리됩니다.
    fn invoke(
        &self,
        handler: &Handler<E>,
        priority: HandlerPriority,
        event: &mut E,
        snapshot: Option<Snapshot<E>>,
        config: &EventBusConfig,
    ) -> Result<()> {
        let started = Instant::now();

        let mut run = || match snapshot {
            Some(snapshot) => handler.call(&mut snapshot(event)),
            None => handler.call(event),
        };
        let outcome = if config.catch_panics {
            panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "handler panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })
        } else {
            run()
        };

        let elapsed = started.elapsed();
        if let Some(threshold_ms) = config.slow_handler_threshold_ms {
            if elapsed > Duration::from_millis(threshold_ms) {
                warn!(
                    event_type = %self.event_type,
                    priority = %priority,
                    handler = handler.label(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    threshold_ms,
                    "Slow event handler"
                );
            }
        }

        if config.debug_mode {
            trace!(
                event_type = %self.event_type,
                priority = %priority,
                handler = handler.label(),
                elapsed_us = elapsed.as_micros() as u64,
                ok = outcome.is_ok(),
                "Handler invoked"
            );
        }

        outcome.map_err(|source| {
            error!(
                event_type = %self.event_type,
                priority = %priority,
                handler = handler.label(),
                error = %source,
                "Event handler failed, aborting dispatch"
            );
            EventError::HandlerInvocation {
                event_type: self.event_type.name(),
                priority,
                handler: handler.label().to_string(),
                source,
            }
        })
    }
}

impl<E: Event> Default for EventExecutor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventExecutor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tiers = self.tiers.read();
        f.debug_struct("EventExecutor")
            .field("event_type", &self.event_type)
            .field("early", &tiers[0].len())
            .field("normal", &tiers[1].len())
            .field("late", &tiers[2].len())
            .field("monitor", &tiers[3].len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// ErasedExecutor - 레지스트리 저장용
// ============================================================================

/// 타입이 지워진 라우터
pub(crate) trait ErasedExecutor: Send + Sync {
    fn event_type(&self) -> EventType;

    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// `event`의 구체 타입이 이 라우터의 타입과 같을 때만 실행
    fn fire_any(&self, event: &mut dyn Any, config: &EventBusConfig) -> Result<()>;

    fn handler_count(&self) -> usize;

    fn unregister(&self, priority: HandlerPriority, key: HandlerKey) -> bool;
}

impl<E: Event> ErasedExecutor for EventExecutor<E> {
    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn fire_any(&self, event: &mut dyn Any, config: &EventBusConfig) -> Result<()> {
        match event.downcast_mut::<E>() {
            Some(event) => self.fire(event, config),
            None => Ok(()),
        }
    }

    fn handler_count(&self) -> usize {
        EventExecutor::handler_count(self)
    }

    fn unregister(&self, priority: HandlerPriority, key: HandlerKey) -> bool {
        EventExecutor::unregister(self, priority, key)
    }
}
