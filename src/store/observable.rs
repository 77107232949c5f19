//! Observable state container
//!
//! `Store<T>` owns one value and notifies synchronous listeners after each
//! mutation. Async consumers can follow the same value through a
//! `tokio::sync::watch` receiver.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener<T>)>>,
}

impl<T> Listeners<T> {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Listener<T>)>> {
        // A listener that panicked leaves the list itself intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, id: u64) {
        self.entries().retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Shared handle to an observable value. Clones point at the same state.
pub struct Store<T> {
    state: Arc<watch::Sender<T>>,
    listeners: Arc<Listeners<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
            listeners: Arc::new(Listeners {
                next_id: AtomicU64::new(1),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.state.borrow().clone()
    }

    /// Borrowing read. Do not call back into the store from `f`.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Mutate in place, then notify listeners
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.state.send_modify(f);
        self.notify();
    }

    /// Replace the value wholesale, then notify listeners
    pub fn set(&self, value: T) {
        self.state.send_replace(value);
        self.notify();
    }

    /// Register a listener called with the new value after every mutation.
    ///
    /// Listeners run synchronously on the mutating task, in registration
    /// order, and receive a snapshot so they may call back into the store.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.entries().push((id, Arc::new(listener)));

        let weak: Weak<Listeners<T>> = Arc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.remove(id);
                }
            })),
        }
    }

    pub fn watch(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.entries().len()
    }

    fn notify(&self) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .entries()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        if listeners.is_empty() {
            return;
        }

        let snapshot = self.get();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Listener registration; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }

    /// Keep the listener registered for the lifetime of the store
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        value: u32,
    }

    #[test]
    fn test_update_notifies_in_order() {
        let store = Store::new(Counter::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = {
            let seen = Arc::clone(&seen);
            store.subscribe(move |c: &Counter| seen.lock().unwrap().push(("a", c.value)))
        };
        let s2 = {
            let seen = Arc::clone(&seen);
            store.subscribe(move |c: &Counter| seen.lock().unwrap().push(("b", c.value)))
        };

        store.update(|c| c.value += 1);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 1), ("b", 1)]);

        drop(s1);
        drop(s2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = Store::new(Counter::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = {
            let calls = Arc::clone(&calls);
            store.subscribe(move |_: &Counter| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        store.set(Counter { value: 5 });
        drop(sub);
        store.set(Counter { value: 6 });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
        assert_eq!(store.get().value, 6);
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Store::new(Counter::default());
        let inner = store.clone();
        let mirrored = Arc::new(AtomicUsize::new(0));

        let m = Arc::clone(&mirrored);
        store
            .subscribe(move |_: &Counter| {
                m.store(inner.get().value as usize, Ordering::SeqCst);
            })
            .detach();

        store.update(|c| c.value = 9);
        assert_eq!(mirrored.load(Ordering::SeqCst), 9);
        assert_eq!(store.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_watch_sees_updates() {
        let store = Store::new(Counter::default());
        let mut rx = store.watch();

        store.update(|c| c.value = 3);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().value, 3);
    }
}
