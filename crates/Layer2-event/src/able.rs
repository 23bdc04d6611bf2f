//! Capability contracts - 이벤트가 선택적으로 지원하는 두 가지 기능
//!
//! - [`Cancelable`]: 협력적(cooperative) 취소 플래그
//! - [`Monitorable`]: Monitor 우선순위 핸들러용 독립 복사본
//!
//! 둘은 서로 독립적이며, 이벤트는 둘 다 / 하나만 / 아무것도 지원하지 않을 수 있습니다.
//! 지원 여부는 [`Event`](crate::Event) 구현에서 노출합니다 ([`impl_event!`](crate::impl_event) 참고).

use crate::event::Event;

/// 취소 가능한 이벤트
///
/// 플래그는 `false`에서 시작합니다. 디스패치 엔진은 플래그를 강제하지 않으며,
/// 각 핸들러가 확인하고 자기 효과를 건너뛸지 결정합니다.
pub trait Cancelable {
    /// 취소 상태 설정
    fn set_canceled(&mut self, state: bool);

    /// 취소 여부
    fn is_canceled(&self) -> bool;

    /// `set_canceled(true)`
    fn cancel(&mut self) {
        self.set_canceled(true);
    }

    /// `set_canceled(false)`
    fn uncancel(&mut self) {
        self.set_canceled(false);
    }
}

/// 모니터링 가능한 이벤트
///
/// `copy()`는 원본과 가변 상태를 공유하지 않는 새 인스턴스를 반환해야 합니다.
/// 복사본은 Monitor 단계가 소유하고 단계가 끝나면 버려집니다.
pub trait Monitorable: Event + Sized {
    fn copy(&self) -> Self;
}
