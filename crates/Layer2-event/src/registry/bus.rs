//! EventBus - 이벤트 타입 → 라우터 레지스트리
//!
//! 이벤트 타입(`TypeId`)마다 [`EventExecutor`] 하나를 가지며, 라우터는 첫 등록 시 생성됩니다.
//! 등록과 발행은 모두 동기 호출이고, 핸들러는 호출한 스레드에서 실행됩니다.
//!
//! ## 락 순서
//!
//! 항상 레지스트리 → 라우터 순서로 잡습니다. `fire`는 라우터 `Arc`만 복제한 뒤
//! 레지스트리 락을 놓고 실행하므로, 핸들러 안에서 다시 등록/발행해도 교착되지 않습니다.

use super::executor::{ErasedExecutor, EventExecutor};
use crate::error::{EventError, Result};
use crate::event::{AnyEvent, Event, EventType};
use crate::handler::{
    Handler, HandlerBindings, HandlerInfo, HandlerKey, HandlerList, HandlerPriority,
};
use parking_lot::RwLock;
use rub_foundation::{EventBusConfig, Settings};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

// ============================================================================
// Registration
// ============================================================================

/// 등록된 핸들러 한 건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredHandler {
    pub info: HandlerInfo,
    pub key: HandlerKey,
    pub label: String,
    /// `false`면 같은 identity가 이미 등록되어 있었음
    pub newly_added: bool,
}

/// 등록 결과
///
/// [`EventBus::unregister`]로 같은 핸들러들을 다시 해제할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    source: String,
    entries: Vec<RegisteredHandler>,
}

impl Registration {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entries(&self) -> &[RegisteredHandler] {
        &self.entries
    }

    /// 바인딩 수 (중복 포함)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 실제로 새로 추가된 핸들러 수
    pub fn added(&self) -> usize {
        self.entries.iter().filter(|e| e.newly_added).count()
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스
///
/// ## 사용법
///
/// ```ignore
/// use rub_event::{EventBus, HandlerBindings, HandlerList};
///
/// let bus = EventBus::new();
///
/// // 컨테이너 등록 (검증 실패 시 아무것도 등록되지 않음)
/// let registration = bus.register(Arc::new(AuditLog::default()))?;
///
/// // 발행: Early → Normal → Late → Monitor
/// let mut ping = Ping::new();
/// bus.fire(&mut ping)?;
///
/// // 해제
/// bus.unregister(&registration);
/// ```
pub struct EventBus {
    /// 설정
    config: EventBusConfig,

    /// 이벤트 타입별 라우터
    executors: RwLock<HashMap<TypeId, Arc<dyn ErasedExecutor>>>,

    /// 라우터가 있었던 발행 수
    fired_count: AtomicU64,
}

impl EventBus {
    /// 기본 설정으로 생성
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// 커스텀 설정으로 생성
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            config,
            executors: RwLock::new(HashMap::new()),
            fired_count: AtomicU64::new(0),
        }
    }

    /// 로드된 설정에서 생성
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_config(settings.event_bus.clone())
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 핸들러 컨테이너 등록
    pub fn register<L: HandlerList>(&self, list: Arc<L>) -> Result<Registration> {
        let mut bindings = HandlerBindings::new(list.name());
        list.bind(&mut bindings);
        self.register_bindings(bindings)
    }

    /// 바인딩 테이블 등록
    ///
    /// 원자적입니다. 하나라도 검증에 실패하면 에러를 반환하고 아무것도 등록하지 않습니다.
    pub fn register_bindings(&self, bindings: HandlerBindings) -> Result<Registration> {
        let (source, bindings) = bindings.into_parts();

        // 1. 디스크립터 검증 (락 없이)
        let descriptors = bindings
            .iter()
            .map(|binding| binding.descriptor())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| rejected(&source, e))?;

        let mut executors = self.executors.write();

        // 2. 라우터 확인 (새 라우터는 아직 레지스트리에 넣지 않음)
        let mut created: HashMap<TypeId, Arc<dyn ErasedExecutor>> = HashMap::new();
        let mut targets = Vec::with_capacity(bindings.len());

        for (binding, info) in bindings.iter().zip(&descriptors) {
            let id = binding.event_type().id();
            let executor = match executors.get(&id).or_else(|| created.get(&id)).cloned() {
                Some(executor) => executor,
                None => {
                    let executor = binding.new_executor();
                    created.insert(id, Arc::clone(&executor));
                    executor
                }
            };

            binding
                .check(info, executor.as_ref())
                .map_err(|e| rejected(&source, e))?;
            targets.push(executor);
        }

        // 3. 커밋
        for (id, executor) in created {
            debug!(event_type = %executor.event_type(), "Created event router");
            executors.insert(id, executor);
        }

        let mut entries = Vec::with_capacity(bindings.len());
        for ((binding, info), executor) in bindings.iter().zip(descriptors).zip(targets) {
            let newly_added = binding.install(info, executor.as_ref())?;
            entries.push(RegisteredHandler {
                info,
                key: binding.key(),
                label: binding.label().to_string(),
                newly_added,
            });
        }
        drop(executors);

        let registration = Registration { source, entries };
        info!(
            source = registration.source(),
            bindings = registration.len(),
            added = registration.added(),
            "Registered event handlers"
        );

        Ok(registration)
    }

    /// 핸들러 하나 등록
    pub fn register_handler<E: Event>(
        &self,
        priority: HandlerPriority,
        handler: Handler<E>,
    ) -> Result<Registration> {
        let mut bindings = HandlerBindings::new(handler.label().to_string());
        bindings.handler(priority, handler);
        self.register_bindings(bindings)
    }

    /// 등록 해제. 실제로 제거된 핸들러 수 반환
    ///
    /// 이 등록에서 새로 추가된 핸들러만 제거합니다 (`newly_added == false`인 항목은 다른 등록 소유).
    /// 핸들러가 모두 빠진 라우터도 레지스트리에 남겨둡니다.
    pub fn unregister(&self, registration: &Registration) -> usize {
        let executors = self.executors.read();

        let removed = registration
            .entries
            .iter()
            .filter(|entry| entry.newly_added)
            .filter(|entry| {
                executors
                    .get(&entry.info.event_type().id())
                    .is_some_and(|executor| executor.unregister(entry.info.priority(), entry.key))
            })
            .count();

        debug!(
            source = registration.source(),
            removed, "Unregistered event handlers"
        );
        removed
    }

    // ========================================================================
    // 발행
    // ========================================================================

    /// 이벤트 발행
    ///
    /// 이 타입에 등록된 핸들러가 없으면 아무것도 하지 않고 `Ok`.
    pub fn fire<E: Event>(&self, event: &mut E) -> Result<()> {
        self.dispatch(TypeId::of::<E>(), event)
    }

    /// 타입이 지워진 이벤트 발행 (런타임 타입으로 라우팅)
    pub fn fire_dyn(&self, event: &mut dyn AnyEvent) -> Result<()> {
        let any = event.as_any_mut();
        self.dispatch(Any::type_id(&*any), any)
    }

    fn dispatch(&self, id: TypeId, event: &mut dyn Any) -> Result<()> {
        let Some(executor) = self.executors.read().get(&id).cloned() else {
            if self.config.debug_mode {
                trace!(?id, "No router for event, skipping");
            }
            return Ok(());
        };

        let fired = self.fired_count.fetch_add(1, Ordering::SeqCst);
        if self.config.debug_mode {
            trace!(
                event_type = %executor.event_type(),
                "Firing event #{}", fired + 1
            );
        }

        executor.fire_any(event, &self.config)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// 이 타입에 핸들러가 하나라도 있는지
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.handler_count_for::<E>() > 0
    }

    /// 전체 핸들러 수
    pub fn handler_count(&self) -> usize {
        self.executors
            .read()
            .values()
            .map(|executor| executor.handler_count())
            .sum()
    }

    /// 특정 타입의 핸들러 수
    pub fn handler_count_for<E: Event>(&self) -> usize {
        self.executors
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, |executor| executor.handler_count())
    }

    /// 라우터가 만들어진 이벤트 타입 수
    pub fn event_type_count(&self) -> usize {
        self.executors.read().len()
    }

    /// 라우터가 만들어진 이벤트 타입 목록 (이름순)
    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<_> = self
            .executors
            .read()
            .values()
            .map(|executor| executor.event_type())
            .collect();
        types.sort_by_key(|t| t.name());
        types
    }

    /// 특정 타입의 라우터 (없으면 `None`)
    pub fn executor<E: Event>(&self) -> Option<Arc<EventExecutor<E>>> {
        let executor = self.executors.read().get(&TypeId::of::<E>()).cloned()?;
        executor.into_any_arc().downcast::<EventExecutor<E>>().ok()
    }

    /// 라우터가 있었던 발행 수
    pub fn fired_count(&self) -> u64 {
        self.fired_count.load(Ordering::SeqCst)
    }
}

fn rejected(source: &str, error: EventError) -> EventError {
    warn!(source, error = %error, "Rejected handler registration");
    error
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("event_types", &self.event_type_count())
            .field("handlers", &self.handler_count())
            .field("fired", &self.fired_count())
            .finish()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::able::{Cancelable, Monitorable};
    use crate::event::Timestamp;
    use chrono::Utc;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone)]
    struct Ping {
        created_at: Timestamp,
        canceled: bool,
    }

    impl Ping {
        fn new() -> Self {
            Self {
                created_at: Utc::now(),
                canceled: false,
            }
        }
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

    #[derive(Default)]
    struct Counter {
        early: AtomicUsize,
        monitor: AtomicUsize,
    }

    impl HandlerList for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn bind(self: Arc<Self>, bindings: &mut HandlerBindings) {
            let early = Arc::clone(&self);
            let monitor = Arc::clone(&self);
            bindings
                .early(move |_: &mut Ping| {
                    early.early.fetch_add(1, Ordering::SeqCst);
                })
                .monitor(move |_: &Ping| {
                    monitor.monitor.fetch_add(1, Ordering::SeqCst);
                });
        }
    }

    #[test]
    fn test_event_bus_basic() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter::default());

        let registration = bus.register(Arc::clone(&counter)).unwrap();
        assert_eq!(registration.source(), "counter");
        assert_eq!(registration.len(), 2);
        assert_eq!(registration.added(), 2);
        assert_eq!(bus.handler_count(), 2);
        assert!(bus.has_handlers::<Ping>());
        assert!(!bus.has_handlers::<Tick>());

        bus.fire(&mut Ping::new()).unwrap();
        assert_eq!(counter.early.load(Ordering::SeqCst), 1);
        assert_eq!(counter.monitor.load(Ordering::SeqCst), 1);
        assert_eq!(bus.fired_count(), 1);

        assert_eq!(bus.unregister(&registration), 2);
        assert_eq!(bus.handler_count(), 0);
        // 라우터는 남아 있음
        assert_eq!(bus.event_type_count(), 1);
    }

    #[test]
    fn test_fire_without_router_is_noop() {
        let bus = EventBus::new();
        let mut tick = Tick { at: Utc::now() };

        assert!(bus.fire(&mut tick).is_ok());
        assert_eq!(bus.fired_count(), 0);
        assert_eq!(bus.event_type_count(), 0);
    }

    #[test]
    fn test_atomic_batch_rejection() {
        let bus = EventBus::new();

        let mut bindings = HandlerBindings::new("mixed");
        bindings
            .early(|_: &mut Ping| {})
            .on(HandlerPriority::Monitor, |_: &mut Tick| {});

        let err = bus.register_bindings(bindings).unwrap_err();
        assert!(err.is_invalid_registration());
        assert_eq!(bus.handler_count(), 0);
        assert_eq!(bus.event_type_count(), 0);
    }

    #[test]
    fn test_register_handler_twice() {
        let bus = EventBus::new();
        let handler = Handler::named("ping", |p: &mut Ping| p.cancel());

        let first = bus
            .register_handler(HandlerPriority::Normal, handler.clone())
            .unwrap();
        let second = bus
            .register_handler(HandlerPriority::Normal, handler)
            .unwrap();

        assert_eq!(first.added(), 1);
        assert_eq!(second.added(), 0);
        assert_eq!(first.entries()[0].key, second.entries()[0].key);
        assert_eq!(first.source(), "ping");
        assert_eq!(bus.handler_count_for::<Ping>(), 1);
    }

    #[test]
    fn test_executor_lookup() {
        let bus = EventBus::new();
        assert!(bus.executor::<Ping>().is_none());

        bus.register_handler(HandlerPriority::Late, Handler::new(|_: &mut Ping| {}))
            .unwrap();

        let executor = bus.executor::<Ping>().unwrap();
        assert_eq!(executor.tier_len(HandlerPriority::Late), 1);
        assert!(bus.executor::<Tick>().is_none());
        assert_eq!(bus.event_types(), vec![EventType::of::<Ping>()]);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.event_bus.debug_mode = true;

        let bus = EventBus::from_settings(&settings);
        assert!(bus.config().debug_mode);
        assert!(bus.config().catch_panics);
    }
}
