//! Handler - 이벤트 콜백
//!
//! 핸들러는 identity([`HandlerKey`])를 가지며, 라우터의 각 단계는 이 identity 기준의 집합입니다.
//! 같은 핸들러를 두 번 등록해도 한 번만 호출됩니다.
//!
//! - 클로저: 생성 시 발급되는 일련번호가 identity. `Handler`를 clone 하면 identity도 같음
//! - `fn` 아이템: 아이템 타입(`TypeId`)이 identity. 매번 새로 감싸도 같은 핸들러
//!
//! 함수 주소는 identity로 쓰지 않습니다. 본문이 같은 두 함수는 최적화 시 한 주소로 합쳐질 수 있습니다.

use crate::error::HandlerResult;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// IntoHandlerResult
// ============================================================================

/// 핸들러 반환 타입 변환 (`()` 또는 `Result<(), impl Into<anyhow::Error>>`)
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<Err> IntoHandlerResult for Result<(), Err>
where
    Err: Into<anyhow::Error>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// HandlerKey
// ============================================================================

/// 핸들러 identity
///
/// 한 번 발급된 키는 핸들러가 해제된 뒤에도 다른 핸들러에 재사용되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    /// 생성 시 발급된 일련번호
    Instance(u64),
    /// 크기가 0인 함수 아이템 / 캡처 없는 클로저의 타입
    Item(TypeId),
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl HandlerKey {
    fn next_instance() -> Self {
        Self::Instance(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(id) => write!(f, "handler-{}", id),
            Self::Item(type_id) => write!(f, "handler-{:?}", type_id),
        }
    }
}

// ============================================================================
// Handler
// ============================================================================

type Callback<E> = dyn Fn(&mut E) -> HandlerResult + Send + Sync;

/// 이벤트 핸들러
pub struct Handler<E> {
    key: HandlerKey,
    label: Arc<str>,
    callback: Arc<Callback<E>>,
}

impl<E: 'static> Handler<E> {
    /// 클로저로 생성 (라벨은 클로저 타입 이름)
    pub fn new<F, R>(callback: F) -> Self
    where
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self::named(type_name::<F>(), callback)
    }

    /// 라벨 지정하여 생성
    pub fn named<F, R>(label: impl Into<Arc<str>>, callback: F) -> Self
    where
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self::with_key(HandlerKey::next_instance(), label, callback)
    }

    /// `fn` 아이템으로 생성 (identity = 아이템 타입)
    ///
    /// `fn` 포인터처럼 크기가 있는 값은 아이템을 구분할 수 없으므로 새 일련번호를 받습니다.
    pub fn from_fn<F, R>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut E) -> R + Copy + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        let key = if std::mem::size_of::<F>() == 0 {
            HandlerKey::Item(TypeId::of::<F>())
        } else {
            HandlerKey::next_instance()
        };
        Self::with_key(key, label, f)
    }

    fn with_key<F, R>(key: HandlerKey, label: impl Into<Arc<str>>, callback: F) -> Self
    where
        F: Fn(&mut E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self {
            key,
            label: label.into(),
            callback: Arc::new(move |event: &mut E| callback(event).into_handler_result()),
        }
    }

    /// 읽기 전용 핸들러 (Monitor 단계용)
    pub fn observer<F, R>(callback: F) -> Self
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self::named(type_name::<F>(), move |event: &mut E| callback(event))
    }

    pub fn key(&self) -> HandlerKey {
        self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 라벨 변경 (identity는 유지)
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    pub(crate) fn call(&self, event: &mut E) -> HandlerResult {
        (self.callback)(event)
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: Arc::clone(&self.label),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("key", &self.key)
            .field("label", &self.label)
            .finish()
    }
}
