//! Synchronous observer lists for component wiring.
//!
//! Components that need to announce changes (cursor moved, behavior added)
//! hold a `Subscribers<E>` and emit into it. Delivery is synchronous on the
//! emitting thread, in subscription order. There is no unsubscribe;
//! subscriber lists live for the session, like the components that own
//! them.

/// An ordered list of event callbacks.
pub struct Subscribers<E> {
    callbacks: Vec<Box<dyn FnMut(&E) + Send>>,
}

impl<E> Subscribers<E> {
    /// Create an empty subscriber list.
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register a callback. Callbacks run in subscription order.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Deliver an event to every subscriber, in subscription order.
    pub fn emit(&mut self, event: &E) {
        for callback in &mut self.callbacks {
            callback(event);
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}
