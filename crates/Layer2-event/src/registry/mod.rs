//! Registry - 이벤트 타입별 라우터와 버스
//!
//! - `executor.rs` - EventExecutor (단계별 실행, fail-fast)
//! - `bus.rs` - EventBus (TypeId → 라우터, 원자적 등록)

mod bus;
mod executor;

pub use bus::{EventBus, RegisteredHandler, Registration};
pub(crate) use executor::ErasedExecutor;
pub use executor::EventExecutor;
