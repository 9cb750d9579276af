//! Reactive cell: a shared single value with change subscriptions
//!
//! A [`ReactiveCell`] is written by one actor and read by others. Every
//! `set`/`update` notifies the registered subscribers with the old and new
//! values. Subscribers are invoked after the value lock is released, so a
//! subscriber may freely read or write the cell it observes.
//!
//! Writers are serialized for the whole swap-and-notify sequence: with several
//! writing threads, subscribers still observe changes in the order the swaps
//! happened.

use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::sync::Arc;

/// Callback fired with `(old, new)` after every change
pub type Subscriber<T> = Arc<dyn Fn(&T, &T) -> Result<(), SubscriberError> + Send + Sync>;

/// Error returned by a subscriber, surfaced to the caller of `set`/`update`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subscriber rejected change: {reason}")]
pub struct SubscriberError {
    /// Why the subscriber failed
    pub reason: String,
}

impl SubscriberError {
    /// Creates a subscriber error with the given reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Thread-safe single-value container with get/set/update and subscriptions.
///
/// Each cell has its own lock; operations on different cells never contend.
pub struct ReactiveCell<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<Subscriber<T>>>,
    // Reentrant so a subscriber may write the cell that notified it
    writer: ReentrantMutex<()>,
}

impl<T: Clone> ReactiveCell<T> {
    /// Creates a cell holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            subscribers: Mutex::new(Vec::new()),
            writer: ReentrantMutex::new(()),
        }
    }

    /// Returns a copy of the current value
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Reads the current value through a closure without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock())
    }

    /// Swaps in `value` and returns the previous one.
    ///
    /// The swap is kept even when a subscriber fails; the first failure is
    /// returned and the remaining subscribers are skipped.
    pub fn set(&self, value: T) -> Result<T, SubscriberError> {
        let _writer = self.writer.lock();
        let (old, new) = {
            let mut guard = self.value.lock();
            let old = std::mem::replace(&mut *guard, value);
            (old, guard.clone())
        };
        self.notify(&old, &new)?;
        Ok(old)
    }

    /// Atomically replaces the value with `f(current)` and returns the previous one
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<T, SubscriberError> {
        let _writer = self.writer.lock();
        let (old, new) = {
            let mut guard = self.value.lock();
            let new = f(&guard);
            let old = std::mem::replace(&mut *guard, new.clone());
            (old, new)
        };
        self.notify(&old, &new)?;
        Ok(old)
    }

    /// Registers a callback fired on every later `set`/`update`
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&T, &T) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribers.lock().push(Arc::new(subscriber));
    }

    fn notify(&self, old: &T, new: &T) -> Result<(), SubscriberError> {
        let subscribers = self.subscribers.lock().clone();
        for subscriber in subscribers {
            subscriber(old, new)?;
        }
        Ok(())
    }
}

impl<T: Clone + Default> Default for ReactiveCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("value", &*self.value.lock())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
