//! 事件订阅注册表
//!
//! ```text
//! RealtimeClient (dispatch task)
//!       │ RealtimeEvent
//!       ▼
//! Registry
//!   └── handlers: EventName → [(subscriber, token, handler)]
//!         ▲
//!         │ Subscriber::on(event, handler) -> Subscription
//! ```
//!
//! 每个逻辑订阅者对同一事件最多一个回调; 重复订阅会就地替换。
//! `Subscription` 被 drop 或 `dispose()` 时移除回调, 但只移除自己注册的那个
//! (token 不匹配时什么也不做)。

use parking_lot::Mutex;
use shared::message::{EventName, RealtimeEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Handler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

struct Entry {
    subscriber: u64,
    token: u64,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    handlers: Mutex<HashMap<EventName, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl Inner {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn remove(&self, event: EventName, token: u64) -> bool {
        let mut handlers = self.handlers.lock();
        let Some(entries) = handlers.get_mut(&event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.token != token);
        let removed = entries.len() != before;
        if entries.is_empty() {
            handlers.remove(&event);
        }
        removed
    }
}

/// Event name → handler table shared by a realtime client
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("registrations", &self.registration_count())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// New logical subscriber
    pub fn subscriber(&self) -> Subscriber {
        Subscriber {
            id: self.inner.next_id(),
            registry: self.clone(),
        }
    }

    /// Total live registrations across all events
    pub fn registration_count(&self) -> usize {
        self.inner.handlers.lock().values().map(Vec::len).sum()
    }

    pub fn handler_count(&self, event: EventName) -> usize {
        self.inner
            .handlers
            .lock()
            .get(&event)
            .map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's name
    ///
    /// Handlers run outside the lock, so a handler may subscribe or dispose.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &RealtimeEvent) -> usize {
        let handlers: Vec<Handler> = {
            let guard = self.inner.handlers.lock();
            match guard.get(&event.name()) {
                Some(entries) => entries.iter().map(|e| e.handler.clone()).collect(),
                None => return 0,
            }
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

/// A logical subscriber (one handler per event)
#[derive(Debug, Clone)]
pub struct Subscriber {
    id: u64,
    registry: Registry,
}

impl Subscriber {
    /// Register `handler` for `event`, replacing this subscriber's previous one
    pub fn on<F>(&self, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let token = self.registry.inner.next_id();
        let entry = Entry {
            subscriber: self.id,
            token,
            handler: Arc::new(handler),
        };

        {
            let mut handlers = self.registry.inner.handlers.lock();
            let entries = handlers.entry(event).or_default();
            match entries.iter_mut().find(|e| e.subscriber == self.id) {
                Some(existing) => {
                    tracing::debug!(%event, subscriber = self.id, "Replacing handler");
                    *existing = entry;
                }
                None => entries.push(entry),
            }
        }

        Subscription {
            event,
            token,
            registry: Some(self.registry.clone()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Disposer for a single registration
///
/// Dropping it removes the registration.
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    event: EventName,
    token: u64,
    registry: Option<Registry>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("token", &self.token)
            .field("active", &self.registry.is_some())
            .finish()
    }
}

impl Subscription {
    pub fn event(&self) -> EventName {
        self.event
    }

    /// Remove the registration; `false` if it was already replaced
    pub fn dispose(mut self) -> bool {
        self.release()
    }

    /// Keep the handler registered for the registry's lifetime
    pub fn forget(mut self) {
        self.registry = None;
    }

    fn release(&mut self) -> bool {
        match self.registry.take() {
            Some(registry) => registry.inner.remove(self.event, self.token),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&RealtimeEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_: &RealtimeEvent| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_dispatch_by_name() {
        let registry = Registry::new();
        let (count, handler) = counter();
        let _sub = registry.subscriber().on(EventName::ShopUpdated, handler);

        assert_eq!(registry.dispatch(&RealtimeEvent::ShopUpdated), 1);
        assert_eq!(registry.dispatch(&RealtimeEvent::EmployeesUpdated), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resubscribe_replaces() {
        let registry = Registry::new();
        let subscriber = registry.subscriber();
        let (first, h1) = counter();
        let (second, h2) = counter();

        let stale = subscriber.on(EventName::Connect, h1);
        let _fresh = subscriber.on(EventName::Connect, h2);
        assert_eq!(registry.handler_count(EventName::Connect), 1);

        registry.dispatch(&RealtimeEvent::Connect);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        // 旧的 disposer 不能移除新的回调
        assert!(!stale.dispose());
        assert_eq!(registry.handler_count(EventName::Connect), 1);
    }

    #[test]
    fn test_dispose_and_drop() {
        let registry = Registry::new();
        let a = registry.subscriber();
        let b = registry.subscriber();

        let sub_a = a.on(EventName::NewOrder, |_| {});
        let sub_b = b.on(EventName::NewOrder, |_| {});
        {
            let _scoped = b.on(EventName::ShopUpdated, |_| {});
            assert_eq!(registry.registration_count(), 3);
        }
        assert_eq!(registry.registration_count(), 2);

        assert!(sub_a.dispose());
        drop(sub_b);
        assert_eq!(registry.registration_count(), 0);
    }

    #[test]
    fn test_forget_keeps_handler() {
        let registry = Registry::new();
        registry
            .subscriber()
            .on(EventName::AdminEmpUpdate, |_| {})
            .forget();
        assert_eq!(registry.handler_count(EventName::AdminEmpUpdate), 1);
    }

    #[test]
    fn test_handler_may_dispose_during_dispatch() {
        let registry = Registry::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_in_handler = slot.clone();

        let sub = registry.subscriber().on(EventName::Disconnect, move |_| {
            slot_in_handler.lock().take();
        });
        *slot.lock() = Some(sub);

        let event = RealtimeEvent::Disconnect {
            reason: "transport close".into(),
        };
        assert_eq!(registry.dispatch(&event), 1);
        assert_eq!(registry.registration_count(), 0);
    }
}
