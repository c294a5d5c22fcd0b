//! Synchronous publish/subscribe channel for platform lifecycle events.
//!
//! # Responsibility
//! - Announce platform set changes, readiness transitions and adapter
//!   availability to the rest of the process.
//! - Keep one faulty subscriber from starving the others.
//!
//! # Invariants
//! - `post` delivers on the caller's thread, in subscription order, and
//!   returns only after every handler ran.
//! - Handlers run without the subscriber lock held, so a handler may
//!   subscribe, unsubscribe or post.
//! - Handler errors and panics are logged and counted, never propagated.

use log::{debug, error};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::error::Error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle notifications carried by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The registered platform set changed; capability answers may differ.
    PlatformsChanged,
    /// World data is available and capability resolution is stable.
    PlatformReady { platform: String },
    /// The platform is about to stop serving; posted before unregistration.
    PlatformUnready { platform: String },
    /// A version-matched adapter was installed.
    AdapterLoaded { adapter: String },
    /// The active adapter was removed or failed to load.
    AdapterInvalidated,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PlatformsChanged => EventKind::PlatformsChanged,
            Self::PlatformReady { .. } => EventKind::PlatformReady,
            Self::PlatformUnready { .. } => EventKind::PlatformUnready,
            Self::AdapterLoaded { .. } => EventKind::AdapterLoaded,
            Self::AdapterInvalidated => EventKind::AdapterInvalidated,
        }
    }
}

/// Tag selecting which events a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PlatformsChanged,
    PlatformReady,
    PlatformUnready,
    AdapterLoaded,
    AdapterInvalidated,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlatformsChanged => "platforms_changed",
            Self::PlatformReady => "platform_ready",
            Self::PlatformUnready => "platform_unready",
            Self::AdapterLoaded => "adapter_loaded",
            Self::AdapterInvalidated => "adapter_invalidated",
        }
    }
}

/// Handle returned by `subscribe`.
pub type SubscriptionId = Uuid;

/// Result a handler reports back to the bus.
pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// Outcome of one `post`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

/// Typed subscriber lists, one per event kind.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<BTreeMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` to the end of the `kind` subscriber list.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes one subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        for handlers in subscribers.values_mut() {
            if let Some(index) = handlers.iter().position(|(existing, _)| *existing == id) {
                handlers.remove(index);
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every current subscriber of its kind.
    pub fn post(&self, event: &Event) -> DeliveryReport {
        let kind = event.kind();
        let handlers: Vec<(SubscriptionId, Handler)> = match self.subscribers.read().get(&kind) {
            Some(handlers) => handlers.clone(),
            None => Vec::new(),
        };

        let mut report = DeliveryReport::default();
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    error!(
                        "event=event_handler_failed module=event status=error kind={} subscription={} error={}",
                        kind.as_str(),
                        id,
                        err
                    );
                }
                Err(_) => {
                    report.failed += 1;
                    error!(
                        "event=event_handler_failed module=event status=error kind={} subscription={} error=panic",
                        kind.as_str(),
                        id
                    );
                }
            }
        }

        debug!(
            "event=event_posted module=event status=ok kind={} delivered={} failed={}",
            kind.as_str(),
            report.delivered,
            report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryReport, Event, EventBus, EventKind};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn post_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let report = bus.post(&Event::PlatformsChanged);
        assert_eq!(report, DeliveryReport::default());
    }

    #[test]
    fn delivers_in_subscription_order_exactly_once() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for index in 0..3 {
            let seen = Arc::clone(&seen);
            bus.subscribe(EventKind::PlatformReady, move |_| {
                seen.lock().push(index);
                Ok(())
            });
        }

        let report = bus.post(&Event::PlatformReady {
            platform: "host".to_string(),
        });
        assert_eq!(report.delivered, 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_kind_is_delivered() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.subscribe(EventKind::PlatformUnready, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.post(&Event::PlatformsChanged);
        bus.post(&Event::AdapterInvalidated);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        bus.post(&Event::PlatformUnready {
            platform: "host".to_string(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_and_panicking_handlers_do_not_block_others() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        bus.subscribe(EventKind::PlatformsChanged, |_| Err("broken listener".into()));
        bus.subscribe(EventKind::PlatformsChanged, |_| panic!("listener panicked"));
        let counter = Arc::clone(&calls);
        bus.subscribe(EventKind::PlatformsChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = bus.post(&Event::PlatformsChanged);
        assert_eq!(report, DeliveryReport { delivered: 1, failed: 2 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let bus = EventBus::new();
        let first = bus.subscribe(EventKind::AdapterLoaded, |_| Ok(()));
        bus.subscribe(EventKind::AdapterLoaded, |_| Ok(()));
        assert_eq!(bus.subscriber_count(EventKind::AdapterLoaded), 2);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.subscriber_count(EventKind::AdapterLoaded), 1);
    }

    #[test]
    fn handler_may_subscribe_during_dispatch() {
        let bus = Arc::new(EventBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(EventKind::PlatformsChanged, move |_| {
            inner.subscribe(EventKind::PlatformsChanged, |_| Ok(()));
            Ok(())
        });

        let report = bus.post(&Event::PlatformsChanged);
        assert_eq!(report.delivered, 1);
        assert_eq!(bus.subscriber_count(EventKind::PlatformsChanged), 2);
    }
}
