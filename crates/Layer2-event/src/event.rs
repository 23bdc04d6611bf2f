//! Event - 모든 이벤트의 기본 trait
//!
//! 이벤트의 라우팅 키는 **구체 타입 그 자체** (`TypeId`) 입니다.
//! 상위/하위 타입으로의 fan-out은 없습니다. `Ping`에 등록된 핸들러는
//! `Ping` 값만 받고, `Ping`을 감싼 다른 타입은 받지 않습니다.

use crate::able::Cancelable;
use chrono::{DateTime, TimeDelta, Utc};
use std::any::{type_name, Any, TypeId};
use std::hash::{Hash, Hasher};

/// 이벤트 생성 시각
pub type Timestamp = DateTime<Utc>;

/// Monitor 단계용 복사 함수
pub type Snapshot<E> = fn(&E) -> E;

// ============================================================================
// Event
// ============================================================================

/// 이벤트 trait
///
/// 직접 구현해도 되지만 보통은 [`impl_event!`](crate::impl_event)로 capability와 함께 구현합니다.
///
/// ```ignore
/// #[derive(Debug, Clone)]
/// struct Ping {
///     created_at: Timestamp,
///     canceled: bool,
/// }
///
/// impl Cancelable for Ping { /* ... */ }
/// impl Monitorable for Ping {
///     fn copy(&self) -> Self { self.clone() }
/// }
///
/// impl_event!(Ping, timestamp = created_at, cancelable, monitorable);
/// ```
pub trait Event: Send + 'static {
    /// 생성 시각 (불변, 나이 계산에 사용)
    fn timestamp(&self) -> Timestamp;

    /// Cancelable capability
    fn as_cancelable(&self) -> Option<&dyn Cancelable> {
        None
    }

    /// Cancelable capability (가변)
    fn as_cancelable_mut(&mut self) -> Option<&mut dyn Cancelable> {
        None
    }

    /// Monitorable capability (타입 단위, 등록 시점에 확인)
    fn snapshot() -> Option<Snapshot<Self>>
    where
        Self: Sized,
    {
        None
    }

    /// `timestamp()`의 별칭
    fn created_at(&self) -> Timestamp {
        self.timestamp()
    }

    /// 생성 후 경과 시간
    fn age(&self) -> TimeDelta {
        Utc::now() - self.timestamp()
    }

    /// 생성 후 경과 시간 (ms)
    fn age_ms(&self) -> i64 {
        self.age().num_milliseconds()
    }

    fn is_cancelable(&self) -> bool {
        self.as_cancelable().is_some()
    }

    fn is_monitorable() -> bool
    where
        Self: Sized,
    {
        Self::snapshot().is_some()
    }

    /// 로그용 식별 문자열 (`TypeName@0x...`)
    fn debug_name(&self) -> String {
        format!("{}@{:p}", short_type_name(type_name::<Self>()), self)
    }
}

/// `a::b::Foo<c::D>` → `Foo<c::D>`
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    let start = base.rfind("::").map(|idx| idx + 2).unwrap_or(0);
    &full[start..]
}

// ============================================================================
// EventType - 런타임 타입 식별자
// ============================================================================

/// 이벤트 타입 식별자
///
/// 비교/해시는 `TypeId`만 사용합니다.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
    monitorable: bool,
}

impl EventType {
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
            monitorable: E::is_monitorable(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 전체 경로 포함 타입 이름
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 모듈 경로를 뺀 타입 이름
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }

    pub fn is_monitorable(&self) -> bool {
        self.monitorable
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventType")
            .field("name", &self.name)
            .field("monitorable", &self.monitorable)
            .finish()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

// ============================================================================
// AnyEvent - 타입이 지워진 이벤트
// ============================================================================

/// 타입이 지워진 이벤트 (`EventBus::fire_dyn`용)
///
/// 모든 [`Event`]에 대해 자동 구현됩니다.
pub trait AnyEvent: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn event_name(&self) -> &'static str;
}

impl<E: Event> AnyEvent for E {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn event_name(&self) -> &'static str {
        type_name::<E>()
    }
}

// ============================================================================
// impl_event! - Event + capability 연결
// ============================================================================

/// [`Event`] 구현 매크로
///
/// capability 플래그(`cancelable`, `monitorable`)는 해당 trait 구현으로 연결되므로
/// trait 구현 없이 플래그만 적으면 컴파일 에러가 납니다.
///
/// ```ignore
/// impl_event!(Tick, timestamp = at);
/// impl_event!(Ping, timestamp = created_at, cancelable, monitorable);
/// ```
#[macro_export]
macro_rules! impl_event {
    (@capability cancelable) => {
        fn as_cancelable(&self) -> ::core::option::Option<&dyn $crate::Cancelable> {
            ::core::option::Option::Some(self as &dyn $crate::Cancelable)
        }

        fn as_cancelable_mut(&mut self) -> ::core::option::Option<&mut dyn $crate::Cancelable> {
            ::core::option::Option::Some(self as &mut dyn $crate::Cancelable)
        }
    };
    (@capability monitorable) => {
        fn snapshot() -> ::core::option::Option<$crate::Snapshot<Self>> {
            ::core::option::Option::Some(<Self as $crate::Monitorable>::copy)
        }
    };
    ($ty:ty, timestamp = $field:ident $(, $capability:ident)* $(,)?) => {
        impl $crate::Event for $ty {
            fn timestamp(&self) -> $crate::Timestamp {
                self.$field
            }

            $( $crate::impl_event!(@capability $capability); )*
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::able::Monitorable;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping {
        created_at: Timestamp,
        canceled: bool,
    }

    impl Cancelable for Ping {
        fn set_canceled(&mut self, state: bool) {
            self.canceled = state;
        }

        fn is_canceled(&self) -> bool {
            self.canceled
        }
    }

    impl Monitorable for Ping {
        fn copy(&self) -> Self {
            self.clone()
        }
    }

    crate::impl_event!(Ping, timestamp = created_at, cancelable, monitorable);

    struct Tick {
        at: Timestamp,
    }

    crate::impl_event!(Tick, timestamp = at);

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Foo"), "Foo");
        assert_eq!(short_type_name("Foo"), "Foo");
        assert_eq!(short_type_name("a::Wrap<b::Inner>"), "Wrap<b::Inner>");
    }

    #[test]
    fn test_capabilities() {
        let mut ping = Ping {
            created_at: Utc::now(),
            canceled: false,
        };
        assert!(ping.is_cancelable());
        assert!(Ping::is_monitorable());

        ping.as_cancelable_mut().unwrap().cancel();
        assert!(ping.canceled);

        let tick = Tick { at: Utc::now() };
        assert!(!tick.is_cancelable());
        assert!(!Tick::is_monitorable());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let ping = Ping {
            created_at: Utc::now(),
            canceled: true,
        };
        let copy = (Ping::snapshot().unwrap())(&ping);

        assert_eq!(copy, ping);
        assert_ne!(&copy as *const Ping, &ping as *const Ping);
    }

    #[test]
    fn test_age_and_created_at() {
        let at = Utc::now() - TimeDelta::milliseconds(1500);
        let tick = Tick { at };

        assert_eq!(tick.created_at(), at);
        assert!(tick.age_ms() >= 1500);
    }

    #[test]
    fn test_debug_name() {
        let tick = Tick { at: Utc::now() };
        assert!(tick.debug_name().starts_with("Tick@0x"));
    }

    #[test]
    fn test_event_type_identity() {
        let ping = EventType::of::<Ping>();
        let tick = EventType::of::<Tick>();

        assert_eq!(ping, EventType::of::<Ping>());
        assert_ne!(ping, tick);
        assert!(ping.is_monitorable());
        assert!(!tick.is_monitorable());
        assert_eq!(ping.to_string(), "Ping");
    }

    #[test]
    fn test_any_event_keeps_runtime_type() {
        let mut tick = Tick { at: Utc::now() };
        let erased: &mut dyn AnyEvent = &mut tick;

        assert_eq!(erased.as_any().type_id(), TypeId::of::<Tick>());
        assert!(erased.as_any_mut().downcast_mut::<Tick>().is_some());
        assert!(erased.event_name().ends_with("Tick"));
    }
}
