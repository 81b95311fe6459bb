//! The store capability set and the in-memory reference store.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;
#[cfg(feature = "no_std")]
use alloc::collections::VecDeque;
#[cfg(feature = "no_std")]
use alloc::vec::Vec;
#[cfg(not(feature = "no_std"))]
use std::collections::VecDeque;

use core::fmt;

use portable_atomic_util::{Arc, Weak};
use spin::Mutex;
use tracing::{debug, trace};

bitflags::bitflags! {
    /// Operations a store value actually serves.
    ///
    /// A value is bindable only if it advertises every flag in
    /// [`Capabilities::STORE`]. [`Capabilities::SYNC_ONCE`] marks a
    /// persistence-backed store whose [`StoreApi::sync_once`] must run before
    /// a component subscribes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const GET_STATE = 0b0000_0001;
        const SET_STATE = 0b0000_0010;
        const ON_UPDATE = 0b0000_0100;
        const REVISION  = 0b0000_1000;
        const SYNC_ONCE = 0b0001_0000;
        /// The set every bindable store must advertise.
        const STORE = Self::GET_STATE.bits()
            | Self::SET_STATE.bits()
            | Self::ON_UPDATE.bits()
            | Self::REVISION.bits();
    }
}

/// Marker that changes on every committed store update.
///
/// Revisions are only compared for equality: a differing revision means
/// "something changed since I last looked", nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Revision(u64);

impl Revision {
    /// Revision of a freshly created store.
    pub const INITIAL: Self = Revision(0);

    pub(crate) fn next(self) -> Self {
        Revision(self.0.wrapping_add(1))
    }
}

impl From<u64> for Revision {
    fn from(raw: u64) -> Self {
        Revision(raw)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A state write: either a replacement value or a function of the previous state.
pub enum Update<T> {
    Replace(T),
    With(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Update<T> {
    /// Create an update computed from the previous state.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        Update::With(Box::new(f))
    }

    /// Produce the next state from `prev`.
    pub fn apply(self, prev: &T) -> T {
        match self {
            Update::Replace(next) => next,
            Update::With(f) => f(prev),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(next: T) -> Self {
        Update::Replace(next)
    }
}

impl<T> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Replace(_) => f.write_str("Update::Replace(..)"),
            Update::With(_) => f.write_str("Update::With(..)"),
        }
    }
}

/// Callback invoked with `(next, prev)` after every committed update.
pub struct Listener<T>(Box<dyn Fn(&T, &T) + Send + Sync>);

impl<T> Listener<T> {
    /// Wrap `f`, which receives `(next, prev)`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// Invoke the callback.
    ///
    /// # Arguments
    ///
    /// * `next` - State after the update
    /// * `prev` - State before the update
    pub fn notify(&self, next: &T, prev: &T) {
        (self.0)(next, prev);
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener(..)")
    }
}

/// Handle returned by [`StoreApi::on_update`].
///
/// [`unsubscribe`](Self::unsubscribe) removes the listener and may be called
/// any number of times. Dropping a still-active subscription unsubscribes too.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` the first time it is unsubscribed.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Whether the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Remove the listener. Later calls do nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// The capability set a component binds to.
///
/// Implement this to make your own state container bindable with
/// [`Binding`](crate::Binding). [`Store`] and
/// [`PersistentStore`](crate::PersistentStore) are the bundled implementations.
///
/// Implementations must:
/// - change [`revision`](Self::revision) on every committed update, and only then;
/// - call every registered listener synchronously, in subscription order,
///   before [`set_state`](Self::set_state) returns;
/// - deliver the notification for a write made from inside a listener only
///   after the current notification has reached every listener, so each
///   listener sees updates in commit order.
#[cfg_attr(test, mockall::automock)]
pub trait StoreApi<T: 'static> {
    /// Current state snapshot.
    fn get_state(&self) -> T;

    /// Commit a write and notify listeners with `(next, prev)`.
    fn set_state(&self, update: Update<T>);

    /// Register `listener` for every subsequent update.
    fn on_update(&self, listener: Listener<T>) -> Subscription;

    /// Marker of the most recent committed update.
    fn revision(&self) -> Revision;

    /// Operations this value really serves.
    fn capabilities(&self) -> Capabilities {
        Capabilities::STORE
    }

    /// Reconcile with an external persisted value. Only meaningful when
    /// [`Capabilities::SYNC_ONCE`] is advertised.
    fn sync_once(&self) {}
}

struct Snapshot<T> {
    state: T,
    revision: Revision,
}

struct ListenerSet<T> {
    next_id: u64,
    entries: Vec<(u64, Arc<Listener<T>>)>,
}

impl<T> ListenerSet<T> {
    fn insert(&mut self, listener: Listener<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Arc::new(listener)));
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    fn snapshot(&self) -> Vec<Arc<Listener<T>>> {
        self.entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

struct Notification<T> {
    next: T,
    prev: T,
    revision: Revision,
}

/// Committed updates waiting for delivery, oldest first.
struct Pending<T> {
    delivering: bool,
    queue: VecDeque<Notification<T>>,
}

/// Marks a store as delivering. Clears the mark if a listener unwinds.
struct Delivery<'a, T> {
    pending: &'a Mutex<Pending<T>>,
    finished: bool,
}

impl<T> Delivery<'_, T> {
    fn next(&mut self) -> Option<Notification<T>> {
        let mut pending = self.pending.lock();
        let notification = pending.queue.pop_front();
        if notification.is_none() {
            pending.delivering = false;
            self.finished = true;
        }
        notification
    }
}

impl<T> Drop for Delivery<'_, T> {
    fn drop(&mut self) {
        if !self.finished {
            self.pending.lock().delivering = false;
        }
    }
}

/// In-memory store with a counter revision and synchronous notification.
///
/// Every [`set_state`](StoreApi::set_state) counts as a change: the revision
/// is bumped and listeners are notified even if the new value equals the old.
/// Listeners run after the internal locks are released, so they may read the
/// store, write to it or drop their own subscription.
///
/// Writes are serialized: an [`Update::With`] function sees the state left by
/// the previous write, so concurrent increments are never lost. The function
/// runs while the store holds its writer lock and must not write to the same
/// store.
///
/// A write made while notifications are being delivered is queued behind
/// them. Listeners therefore observe updates in commit order, and the
/// nested write's listeners run before the outer `set_state` returns. A write
/// from another thread during delivery is handed to the delivering call.
///
/// ```rust
/// use oxide_bind::{Listener, Store, StoreApi, Update};
///
/// let store = Store::new(1);
/// let subscription = store.on_update(Listener::new(|next: &i32, prev: &i32| {
///     assert_eq!(*next, *prev * 10);
/// }));
///
/// store.set_state(Update::with(|n: &i32| n * 10));
/// assert_eq!(store.get_state(), 10);
/// drop(subscription);
/// ```
pub struct Store<T> {
    snapshot: Mutex<Snapshot<T>>,
    writer: Mutex<()>,
    pending: Mutex<Pending<T>>,
    listeners: Arc<Mutex<ListenerSet<T>>>,
}

impl<T: Clone + Send + 'static> Store<T> {
    /// Create a store holding `initial` at [`Revision::INITIAL`].
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: Mutex::new(Snapshot {
                state: initial,
                revision: Revision::INITIAL,
            }),
            writer: Mutex::new(()),
            pending: Mutex::new(Pending {
                delivering: false,
                queue: VecDeque::new(),
            }),
            listeners: Arc::new(Mutex::new(ListenerSet {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }

    /// Commit `update`, run `before_notify` on the new state, then notify.
    ///
    /// `before_notify` runs under the writer lock, so its side effects happen
    /// in commit order.
    pub(crate) fn commit<F>(&self, update: Update<T>, before_notify: F)
    where
        F: FnOnce(&T),
    {
        {
            let _writer = self.writer.lock();
            let current = self.get_state();
            let next = update.apply(&current);

            let (prev, revision) = {
                let mut snapshot = self.snapshot.lock();
                let prev = core::mem::replace(&mut snapshot.state, next.clone());
                snapshot.revision = snapshot.revision.next();
                (prev, snapshot.revision)
            };

            before_notify(&next);

            self.pending.lock().queue.push_back(Notification {
                next,
                prev,
                revision,
            });
        }

        self.deliver();
    }

    /// Drain queued notifications unless another call is already doing so.
    fn deliver(&self) {
        {
            let mut pending = self.pending.lock();
            if pending.delivering {
                trace!(queued = pending.queue.len(), "notification queued");
                return;
            }
            pending.delivering = true;
        }

        let mut delivery = Delivery {
            pending: &self.pending,
            finished: false,
        };
        while let Some(Notification {
            next,
            prev,
            revision,
        }) = delivery.next()
        {
            let listeners = self.listeners.lock().snapshot();
            trace!(%revision, listeners = listeners.len(), "store updated");
            for listener in listeners {
                listener.notify(&next, &prev);
            }
        }
    }
}

impl<T: Clone + Send + 'static> StoreApi<T> for Store<T> {
    fn get_state(&self) -> T {
        self.snapshot.lock().state.clone()
    }

    fn set_state(&self, update: Update<T>) {
        self.commit(update, |_| {});
    }

    fn on_update(&self, listener: Listener<T>) -> Subscription {
        let id = self.listeners.lock().insert(listener);
        debug!(listener = id, "listener registered");

        let listeners: Weak<Mutex<ListenerSet<T>>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                if listeners.lock().remove(id) {
                    debug!(listener = id, "listener removed");
                }
            }
        })
    }

    fn revision(&self) -> Revision {
        self.snapshot.lock().revision
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.lock();
        f.debug_struct("Store")
            .field("state", &snapshot.state)
            .field("revision", &snapshot.revision)
            .field("listeners", &self.listeners.lock().entries.len())
            .finish()
    }
}
