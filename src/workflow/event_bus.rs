// src/workflow/event_bus.rs
//! Named in-process event channels.
//!
//! Gateways emit backend events here by name (`update-state`, ...). Subscribers get a
//! [`Subscription`] handle; dropping or unsubscribing it removes the handler.

use bevy::log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::WorkflowError;

/// Channel carrying `{ "state": ... }` progress payloads.
pub const UPDATE_STATE_EVENT: &str = "update-state";

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

type UnsubscribeFn = Box<dyn FnOnce() -> Result<(), WorkflowError> + Send>;

/// Cancellable listener handle. `unsubscribe` is idempotent; dropping the handle unsubscribes.
pub struct Subscription {
    unsubscribe: Mutex<Option<UnsubscribeFn>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() -> Result<(), WorkflowError> + Send + 'static) -> Self {
        Self {
            unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }

    pub fn unsubscribe(&self) -> Result<(), WorkflowError> {
        let pending = self
            .unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(unsubscribe) => unsubscribe(),
            None => Ok(()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(e) = self.unsubscribe() {
            warn!("Unsubscribe on drop failed: {}", e);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    channels: HashMap<String, Vec<(u64, EventHandler)>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(
        &self,
        name: &str,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state
                .channels
                .entry(name.to_string())
                .or_default()
                .push((id, Arc::new(handler)));
            id
        };
        debug!("EventBus: subscriber {} added to '{}'", id, name);

        // Weak so a forgotten handle does not keep the bus alive.
        let bus = Arc::downgrade(&self.inner);
        let channel = name.to_string();
        Subscription::new(move || {
            if let Some(bus) = bus.upgrade() {
                let mut state = bus.lock().unwrap_or_else(PoisonError::into_inner);
                let now_empty = match state.channels.get_mut(&channel) {
                    Some(handlers) => {
                        handlers.retain(|(handler_id, _)| *handler_id != id);
                        handlers.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    state.channels.remove(&channel);
                }
                debug!("EventBus: subscriber {} removed from '{}'", id, channel);
            }
            Ok(())
        })
    }

    /// Deliver `payload` to every current subscriber of `name`, in subscription order.
    /// Returns how many handlers ran.
    pub fn emit(&self, name: &str, payload: &Value) -> usize {
        // Handlers run outside the lock so they may subscribe or unsubscribe themselves.
        let handlers: Vec<EventHandler> = self
            .lock()
            .channels
            .get(name)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            debug!("EventBus: no subscribers for '{}'", name);
        }
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.lock().channels.get(name).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder(bus: &EventBus, name: &str) -> (Subscription, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = bus.subscribe(name, move |payload| sink.lock().unwrap().push(payload.clone()));
        (sub, seen)
    }

    #[test]
    fn delivers_in_order_to_the_named_channel_only() {
        let bus = EventBus::new();
        let (_progress, progress_seen) = recorder(&bus, UPDATE_STATE_EVENT);
        let (_other, other_seen) = recorder(&bus, "something-else");

        bus.emit(UPDATE_STATE_EVENT, &json!({"state": "parsing"}));
        bus.emit(UPDATE_STATE_EVENT, &json!({"state": "writing"}));

        let seen = progress_seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["state"], "parsing");
        assert_eq!(seen[1]["state"], "writing");
        assert!(other_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let (sub, seen) = recorder(&bus, UPDATE_STATE_EVENT);
        assert_eq!(bus.subscriber_count(UPDATE_STATE_EVENT), 1);

        assert!(sub.unsubscribe().is_ok());
        assert!(sub.unsubscribe().is_ok());
        assert!(!sub.is_active());
        assert_eq!(bus.subscriber_count(UPDATE_STATE_EVENT), 0);

        assert_eq!(bus.emit(UPDATE_STATE_EVENT, &json!({"state": "late"})), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let bus = EventBus::new();
        {
            let (_sub, _seen) = recorder(&bus, UPDATE_STATE_EVENT);
            assert_eq!(bus.subscriber_count(UPDATE_STATE_EVENT), 1);
        }
        assert_eq!(bus.subscriber_count(UPDATE_STATE_EVENT), 0);
    }

    #[test]
    fn unsubscribe_after_bus_is_gone_is_harmless() {
        let bus = EventBus::new();
        let (sub, _seen) = recorder(&bus, UPDATE_STATE_EVENT);
        drop(bus);
        assert!(sub.unsubscribe().is_ok());
    }

    #[test]
    fn failing_unsubscribe_is_reported_once() {
        let sub = Subscription::new(|| Err(WorkflowError::Unexpected("listener gone".into())));
        assert!(sub.unsubscribe().is_err());
        assert!(sub.unsubscribe().is_ok());
    }
}
