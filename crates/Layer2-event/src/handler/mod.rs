//! Handler - 디스크립터 / 우선순위 / 콜백 / 바인딩
//!
//! - `priority.rs` - HandlerPriority (Early → Normal → Late → Monitor)
//! - `info.rs` - HandlerInfo (등록 시점 검증)
//! - `handler.rs` - Handler (identity를 가진 콜백)
//! - `list.rs` - HandlerList, HandlerBindings (명시적 바인딩 테이블)

#[allow(clippy::module_inception)]
mod handler;
mod info;
mod list;
mod priority;

pub use handler::{Handler, HandlerKey, IntoHandlerResult};
pub use info::HandlerInfo;
pub use list::{HandlerBindings, HandlerList};
pub use priority::HandlerPriority;
