//! # rub-event
//!
//! 타입 기반 라우팅 + 우선순위 단계를 가진 인프로세스 이벤트 디스패치:
//! - Event: 이벤트 trait, capability(Cancelable, Monitorable), `impl_event!`
//! - Handler: 우선순위, 디스크립터, identity를 가진 콜백, 바인딩 테이블
//! - Registry: 이벤트 타입별 라우터(EventExecutor)와 버스(EventBus)
//!
//! ## 실행 순서
//!
//! `Early → Normal → Late → Monitor`
//!
//! 앞의 세 단계는 같은 이벤트를 공유하고, Monitor 단계는 이벤트 복사본만 받습니다.
//! 취소는 협조적입니다. 취소된 이벤트도 모든 단계를 거치며, 핸들러가 직접 확인합니다.
//!
//! ## 사용법
//!
//! ```ignore
//! use rub_event::{impl_event, Cancelable, EventBus, HandlerBindings, Timestamp};
//!
//! impl_event!(Ping, timestamp = created_at, cancelable, monitorable);
//!
//! let bus = EventBus::new();
//! let mut bindings = HandlerBindings::new("ping-rules");
//! bindings
//!     .early(|ping: &mut Ping| ping.cancel())
//!     .normal(|ping: &mut Ping| {
//!         if ping.is_canceled() {
//!             return;
//!         }
//!         // ...
//!     })
//!     .monitor(|ping: &Ping| tracing::info!(canceled = ping.is_canceled(), "ping"));
//! bus.register_bindings(bindings)?;
//!
//! bus.fire(&mut Ping::new())?;
//! ```

pub mod able;
pub mod error;
pub mod event;
pub mod handler;
pub mod registry;

// ============================================================================
// Event
// ============================================================================
pub use able::{Cancelable, Monitorable};
pub use event::{short_type_name, AnyEvent, Event, EventType, Snapshot, Timestamp};

// ============================================================================
// Handler
// ============================================================================
pub use handler::{
    Handler, HandlerBindings, HandlerInfo, HandlerKey, HandlerList, HandlerPriority,
    IntoHandlerResult,
};

// ============================================================================
// Registry
// ============================================================================
pub use registry::{EventBus, EventExecutor, RegisteredHandler, Registration};

// ============================================================================
// Error
// ============================================================================
pub use error::{EventError, HandlerResult, RegistrationIssue, Result};
