//! Persistence-backed store variant.

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;
use tracing::debug;

use crate::{Capabilities, Listener, Revision, Store, StoreApi, Subscription, Update};

/// Backend holding the externally persisted copy of a store's state.
pub trait StateStorage<T> {
    /// The persisted value, if any.
    fn read(&self) -> Option<T>;

    /// Persist `state`. Called once per committed write, in commit order.
    fn write(&self, state: &T);
}

/// In-memory [`StateStorage`]. Clones share the same slot, which makes it
/// usable as a stand-in for storage shared between store instances.
pub struct MemoryStorage<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for MemoryStorage<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStorage<T> {
    /// Empty storage.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage that already holds `value`.
    pub fn with_value(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(value))),
        }
    }
}

impl<T: Clone> MemoryStorage<T> {
    /// Currently persisted value.
    pub fn get(&self) -> Option<T> {
        self.slot.lock().clone()
    }
}

impl<T: Clone> StateStorage<T> for MemoryStorage<T> {
    fn read(&self) -> Option<T> {
        self.get()
    }

    fn write(&self, state: &T) {
        *self.slot.lock() = Some(state.clone());
    }
}

/// A [`Store`] that writes every update through to a [`StateStorage`] and
/// adopts the persisted value on its first [`sync_once`](StoreApi::sync_once).
///
/// The persisted value is applied through the normal update path, so it bumps
/// the revision and notifies listeners like any other write. A component that
/// rendered before the sync therefore catches up when it subscribes.
///
/// ```rust
/// use oxide_bind::{MemoryStorage, PersistentStore, StoreApi, Update};
///
/// let storage = MemoryStorage::with_value(7);
/// let store = PersistentStore::new(0, storage.clone());
/// assert_eq!(store.get_state(), 0);
///
/// store.sync_once();
/// assert_eq!(store.get_state(), 7);
///
/// store.set_state(Update::Replace(8));
/// assert_eq!(storage.get(), Some(8));
/// ```
pub struct PersistentStore<T, B> {
    store: Store<T>,
    storage: B,
    synced: Mutex<bool>,
}

impl<T, B> PersistentStore<T, B>
where
    T: Clone + Send + 'static,
    B: StateStorage<T>,
{
    /// Create an unsynced store.
    ///
    /// # Arguments
    ///
    /// * `initial` - State served until [`sync_once`](StoreApi::sync_once) adopts a persisted value
    /// * `storage` - Backend that receives every committed write
    pub fn new(initial: T, storage: B) -> Self {
        Self {
            store: Store::new(initial),
            storage,
            synced: Mutex::new(false),
        }
    }

    /// The storage backend.
    pub fn storage(&self) -> &B {
        &self.storage
    }

    /// Whether [`sync_once`](StoreApi::sync_once) has run.
    pub fn is_synced(&self) -> bool {
        *self.synced.lock()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.store.listener_count()
    }
}

impl<T, B> StoreApi<T> for PersistentStore<T, B>
where
    T: Clone + Send + 'static,
    B: StateStorage<T>,
{
    fn get_state(&self) -> T {
        self.store.get_state()
    }

    fn set_state(&self, update: Update<T>) {
        self.store.commit(update, |next| self.storage.write(next));
    }

    fn on_update(&self, listener: Listener<T>) -> Subscription {
        self.store.on_update(listener)
    }

    fn revision(&self) -> Revision {
        self.store.revision()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::STORE | Capabilities::SYNC_ONCE
    }

    fn sync_once(&self) {
        {
            let mut synced = self.synced.lock();
            if *synced {
                return;
            }
            *synced = true;
        }

        match self.storage.read() {
            Some(persisted) => {
                debug!("adopting persisted state");
                self.store.commit(Update::Replace(persisted), |_| {});
            }
            None => debug!("no persisted state to adopt"),
        }
    }
}

impl<T: fmt::Debug, B> fmt::Debug for PersistentStore<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentStore")
            .field("store", &self.store)
            .field("synced", &*self.synced.lock())
            .finish()
    }
}
