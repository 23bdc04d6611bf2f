//! HandlerList / HandlerBindings - 명시적 바인딩 테이블
//!
//! 컨테이너([`HandlerList`])가 자신의 핸들러를 (이벤트 타입, 우선순위, 콜백) 목록으로
//! [`HandlerBindings`]에 적어 넣고, [`EventBus::register`](crate::EventBus::register)가
//! 이를 검증 후 등록합니다.
//!
//! ```ignore
//! struct AuditLog { lines: Mutex<Vec<String>> }
//!
//! impl HandlerList for AuditLog {
//!     fn bind(self: Arc<Self>, bindings: &mut HandlerBindings) {
//!         let log = Arc::clone(&self);
//!         bindings.early(|ping: &mut Ping| ping.cancel());
//!         bindings.monitor(move |ping: &Ping| log.lines.lock().push(ping.debug_name()));
//!     }
//! }
//!
//! bus.register(Arc::new(AuditLog::default()))?;
//! ```

use super::{Handler, HandlerInfo, HandlerKey, HandlerPriority, IntoHandlerResult};
use crate::able::Monitorable;
use crate::error::{RegistrationIssue, Result};
use crate::event::{Event, EventType};
use crate::registry::{ErasedExecutor, EventExecutor};
use std::any::type_name;
use std::sync::Arc;

// ============================================================================
// HandlerList
// ============================================================================

/// 핸들러 컨테이너
///
/// `bind`는 `Arc<Self>`를 받으므로 핸들러가 컨테이너를 캡처할 수 있습니다.
pub trait HandlerList: Send + Sync + 'static {
    /// 컨테이너 이름 (로그용)
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// 핸들러 바인딩 작성
    fn bind(self: Arc<Self>, bindings: &mut HandlerBindings);
}

// ============================================================================
// HandlerBindings
// ============================================================================

/// 바인딩 빌더
///
/// 여기서는 검증하지 않습니다. 검증은 등록 시점에 한 번 수행됩니다.
pub struct HandlerBindings {
    source: String,
    bindings: Vec<Box<dyn ErasedBinding>>,
}

impl HandlerBindings {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            bindings: Vec::new(),
        }
    }

    /// 준비된 핸들러 추가 (identity 유지)
    pub fn handler<E: Event>(&mut self, priority: HandlerPriority, handler: Handler<E>) -> &mut Self {
        self.bindings.push(Box::new(TypedBinding {
            event_type: EventType::of::<E>(),
            priority,
            handler,
        }));
        self
    }

    /// 클로저 추가
    pub fn on<E, F, R>(&mut self, priority: HandlerPriority, callback: F) -> &mut Self
    where
        E: Event,
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.handler(priority, Handler::new(callback))
    }

    pub fn early<E, F, R>(&mut self, callback: F) -> &mut Self
    where
        E: Event,
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.on(HandlerPriority::Early, callback)
    }

    pub fn normal<E, F, R>(&mut self, callback: F) -> &mut Self
    where
        E: Event,
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.on(HandlerPriority::Normal, callback)
    }

    pub fn late<E, F, R>(&mut self, callback: F) -> &mut Self
    where
        E: Event,
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.on(HandlerPriority::Late, callback)
    }

    /// 관찰 전용 핸들러 (Monitorable 이벤트만, 컴파일 시점에 보장)
    pub fn monitor<E, F, R>(&mut self, callback: F) -> &mut Self
    where
        E: Monitorable,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.handler(HandlerPriority::Monitor, Handler::observer(callback))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Box<dyn ErasedBinding>>) {
        (self.source, self.bindings)
    }
}

impl std::fmt::Debug for HandlerBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBindings")
            .field("source", &self.source)
            .field("len", &self.bindings.len())
            .finish()
    }
}

// ============================================================================
// ErasedBinding - 타입이 지워진 바인딩
// ============================================================================

pub(crate) trait ErasedBinding: Send + Sync {
    /// 디스크립터 생성 + 검증
    fn descriptor(&self) -> Result<HandlerInfo>;

    fn event_type(&self) -> EventType;

    fn key(&self) -> HandlerKey;

    fn label(&self) -> &str;

    /// 이 바인딩 타입의 빈 라우터
    fn new_executor(&self) -> Arc<dyn ErasedExecutor>;

    /// 라우터 타입 확인 (아무것도 변경하지 않음)
    fn check(&self, info: &HandlerInfo, executor: &dyn ErasedExecutor) -> Result<()>;

    /// 라우터에 설치. 새로 추가되면 `true`
    fn install(&self, info: HandlerInfo, executor: &dyn ErasedExecutor) -> Result<bool>;
}

struct TypedBinding<E> {
    event_type: EventType,
    priority: HandlerPriority,
    handler: Handler<E>,
}

impl<E: Event> TypedBinding<E> {
    fn typed<'a>(
        &self,
        info: &HandlerInfo,
        executor: &'a dyn ErasedExecutor,
    ) -> Result<&'a EventExecutor<E>> {
        executor
            .as_any()
            .downcast_ref::<EventExecutor<E>>()
            .ok_or_else(|| {
                info.rejected(RegistrationIssue::TypeMismatch {
                    expected: executor.event_type().name(),
                })
            })
    }
}

impl<E: Event> ErasedBinding for TypedBinding<E> {
    fn descriptor(&self) -> Result<HandlerInfo> {
        HandlerInfo::of(self.event_type, self.priority)
    }

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn key(&self) -> HandlerKey {
        self.handler.key()
    }

    fn label(&self) -> &str {
        self.handler.label()
    }

    fn new_executor(&self) -> Arc<dyn ErasedExecutor> {
        Arc::new(EventExecutor::<E>::new())
    }

    fn check(&self, info: &HandlerInfo, executor: &dyn ErasedExecutor) -> Result<()> {
        self.typed(info, executor).map(|_| ())
    }

    fn install(&self, info: HandlerInfo, executor: &dyn ErasedExecutor) -> Result<bool> {
        self.typed(&info, executor)?
            .register(info, self.handler.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Timestamp;
    use chrono::Utc;

    #[derive(Clone)]
    struct Ping {
        at: Timestamp,
    }

    impl Monitorable for Ping {
        fn copy(&self) -> Self {
            self.clone()
        }
    }

    crate::impl_event!(Ping, timestamp = at, monitorable);

    struct Pong {
        at: Timestamp,
    }

    crate::impl_event!(Pong, timestamp = at);

    #[test]
    fn test_builder_collects_bindings() {
        let mut bindings = HandlerBindings::new("test");
        bindings
            .early(|_: &mut Ping| {})
            .normal(|_: &mut Ping| {})
            .late(|_: &mut Pong| {})
            .monitor(|_: &Ping| {});

        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings.source(), "test");

        let (_, parts) = bindings.into_parts();
        let priorities: Vec<_> = parts
            .iter()
            .map(|b| b.descriptor().unwrap().priority())
            .collect();
        assert_eq!(
            priorities,
            vec![
                HandlerPriority::Early,
                HandlerPriority::Normal,
                HandlerPriority::Late,
                HandlerPriority::Monitor
            ]
        );
    }

    #[test]
    fn test_descriptor_is_validated_lazily() {
        let mut bindings = HandlerBindings::new("lazy");
        // 빌더는 받아들이고, descriptor 단계에서 거부
        bindings.on(HandlerPriority::Monitor, |_: &mut Pong| {});

        let (_, parts) = bindings.into_parts();
        assert!(parts[0].descriptor().unwrap_err().is_invalid_registration());
    }

    #[test]
    fn test_check_detects_foreign_router() {
        let mut bindings = HandlerBindings::new("mismatch");
        bindings.normal(|_: &mut Ping| {});
        let (_, parts) = bindings.into_parts();

        let info = parts[0].descriptor().unwrap();
        let foreign: Arc<dyn ErasedExecutor> = Arc::new(EventExecutor::<Pong>::new());
        let err = parts[0].check(&info, foreign.as_ref()).unwrap_err();
        assert!(err.is_invalid_registration());

        let own = parts[0].new_executor();
        assert!(parts[0].check(&info, own.as_ref()).is_ok());
        assert!(parts[0].install(info, own.as_ref()).unwrap());
        assert_eq!(own.handler_count(), 1);
    }

    #[test]
    fn test_handler_identity_survives_binding() {
        let handler = Handler::named("shared", |p: &mut Ping| p.at = Utc::now());
        let mut bindings = HandlerBindings::new("identity");
        bindings
            .handler(HandlerPriority::Early, handler.clone())
            .handler(HandlerPriority::Early, handler.clone());

        let (_, parts) = bindings.into_parts();
        assert_eq!(parts[0].key(), handler.key());
        assert_eq!(parts[1].key(), handler.key());
        assert_eq!(parts[0].label(), "shared");
        assert_eq!(parts[0].event_type(), EventType::of::<Ping>());
    }
}
