use crate::common::CONNECTION_EVENT;
use crate::errors::{ErrorKind, ReldocError, ReldocResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Publishes and subscribes to events in the reldoc system.
///
/// This struct manages an event bus that allows components to register
/// listeners and receive notifications about connection lifecycle events.
///
/// # Responsibilities
///
/// * **Event Publishing**: Broadcasts events to all registered listeners
/// * **Listener Registration**: Registers event handlers to receive notifications
/// * **Listener Deregistration**: Removes previously registered event handlers
/// * **Performance Optimization**: Fast path for no-listener scenarios
#[derive(Clone)]
pub struct ReldocEventBus<E, L> {
    inner: Arc<ReldocEventBusInner<E, L>>,
}

impl<E, L> Default for ReldocEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> ReldocEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        let inner = ReldocEventBusInner::new();
        ReldocEventBus {
            inner: Arc::new(inner),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: L) -> ReldocResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> ReldocResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: E) -> ReldocResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) -> ReldocResult<()> {
        self.inner.close()
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

/// Inner implementation of the event bus.
struct ReldocEventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> ReldocEventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        let event_bus = EventBus::new();
        ReldocEventBusInner {
            event_bus,
            phantom_data: PhantomData,
        }
    }

    pub fn register(&self, listener: L) -> ReldocResult<Option<SubscriberRef>> {
        let subscriber = self
            .event_bus
            .subscribe(CONNECTION_EVENT, Box::new(listener));
        match subscriber {
            Ok(subscriber) => Ok(Some(SubscriberRef::new(subscriber))),
            Err(e) => Err(Self::reldoc_error(e)),
        }
    }

    #[inline]
    pub fn deregister(&self, subscriber: SubscriberRef) -> ReldocResult<()> {
        match self
            .event_bus
            .unsubscribe(CONNECTION_EVENT, &subscriber.inner)
        {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::reldoc_error(e)),
        }
    }

    #[inline]
    pub fn publish(&self, event: E) -> ReldocResult<()> {
        // Fast path: check if there are listeners before creating event
        let handler_count = match self.event_bus.get_handler_count(CONNECTION_EVENT) {
            Ok(count) => count,
            Err(e) => {
                // If event type not found, no listeners - early return
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    return Ok(());
                }
                return Err(Self::reldoc_error(e));
            }
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        match self.event_bus.publish(CONNECTION_EVENT, &basu_event) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::reldoc_error(e)),
        }
    }

    #[inline]
    pub fn close(&self) -> ReldocResult<()> {
        match self.event_bus.clear() {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::reldoc_error(e)),
        }
    }

    #[inline]
    pub fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(CONNECTION_EVENT) {
            Ok(count) => count > 0,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    false
                } else {
                    log::warn!("Failed to check listeners: {}, defaulting to false", e);
                    false
                }
            }
        }
    }

    #[inline]
    pub fn reldoc_error(e: BasuError) -> ReldocError {
        match e {
            BasuError::EventTypeNotFOUND => ReldocError::new(
                "Event bus error: the requested event type is not registered",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => ReldocError::new(
                "Event bus error: internal mutex poisoned - the event bus may be in an inconsistent state",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Unknown error in event handler".to_string());
                ReldocError::new(
                    &format!("Event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct MockListener;

    impl Handle<Event<&str>> for MockListener {
        fn handle(&self, _event: &Event<Event<&str>>) -> Result<(), BasuError> {
            Ok(())
        }
    }

    #[test]
    fn test_event_bus_new() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        assert!(Arc::strong_count(&event_bus.inner) > 0);
    }

    #[test]
    fn test_event_bus_register() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        let subscriber = event_bus.register(MockListener);
        assert!(subscriber.is_ok());
    }

    #[test]
    fn test_event_bus_deregister() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        let subscriber = event_bus.register(MockListener).unwrap().unwrap();
        assert!(event_bus.deregister(subscriber).is_ok());
    }

    #[test]
    fn test_event_bus_publish_without_listeners() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        // no listeners registered - publish takes the fast path
        assert!(event_bus.publish(Event::new("hello")).is_ok());
    }

    #[test]
    fn test_event_bus_has_listeners() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        assert!(!event_bus.has_listeners());
        let _subscriber = event_bus.register(MockListener).unwrap();
        assert!(event_bus.has_listeners());
    }

    #[test]
    fn test_event_bus_close() {
        let event_bus: ReldocEventBus<Event<&str>, MockListener> = ReldocEventBus::new();
        let _subscriber = event_bus.register(MockListener).unwrap();
        assert!(event_bus.close().is_ok());
    }
}
