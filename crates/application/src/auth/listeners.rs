//! Token change subscriptions.
//!
//! Listeners are called synchronously in registration order with
//! `(new_token, old_token)`. A panicking listener is contained and logged;
//! the remaining listeners still run.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use portcullis_domain::SessionToken;
use tracing::error;

type Callback = Arc<dyn Fn(Option<&SessionToken>, Option<&SessionToken>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Ordered list of token-change subscribers.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` after every existing listener.
    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&SessionToken>, Option<&SessionToken>) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Arc::new(callback)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True when nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Invokes every listener in order. Returns how many panicked.
    ///
    /// The list is snapshotted first, so listeners may subscribe or
    /// unsubscribe from inside their callback.
    pub fn notify(&self, new: Option<&SessionToken>, old: Option<&SessionToken>) -> usize {
        let snapshot: Vec<(u64, Callback)> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        let mut panicked = 0;
        for (id, callback) in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(new, old))) {
                panicked += 1;
                error!(
                    listener = id,
                    panic = %panic_message(payload.as_ref()),
                    "token listener panicked"
                );
            }
        }
        panicked
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Handle returned by [`ListenerRegistry::add`].
///
/// Dropping the handle does not unsubscribe; call
/// [`Subscription::unsubscribe`] when the observer goes away.
#[derive(Debug, Clone)]
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the listener. Safe to call more than once; returns whether
    /// this call removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(id, _)| *id != self.id);
        registry.entries.len() != before
    }
}
