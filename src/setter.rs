//! Stable state setter handed to bound components.

use core::fmt;
use core::marker::PhantomData;

use portable_atomic_util::Arc;

use crate::{StoreApi, Update};

/// Writes to the store a component is bound to.
///
/// A setter's identity is the identity of its store: two setters compare
/// equal exactly when they write to the same store instance. A
/// [`Binding`](crate::Binding) hands out the same setter on every render for
/// as long as the store stays the same, so it is safe to use as a dependency.
pub struct Setter<T, S> {
    store: Arc<S>,
    _state: PhantomData<fn(T)>,
}

impl<T, S> Setter<T, S>
where
    T: 'static,
    S: StoreApi<T>,
{
    pub(crate) fn new(store: Arc<S>) -> Self {
        Self {
            store,
            _state: PhantomData,
        }
    }

    /// Replace the state.
    pub fn set(&self, next: T) {
        self.store.set_state(Update::Replace(next));
    }

    /// Compute the next state from the previous one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        self.store.set_state(Update::with(f));
    }

    /// Commit an already-built [`Update`].
    pub fn apply(&self, update: Update<T>) {
        self.store.set_state(update);
    }
}

impl<T, S> Setter<T, S> {
    /// Whether this setter writes to `store`.
    pub fn is_bound_to(&self, store: &Arc<S>) -> bool {
        Arc::ptr_eq(&self.store, store)
    }
}

impl<T, S> Clone for Setter<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _state: PhantomData,
        }
    }
}

impl<T, S> PartialEq for Setter<T, S> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }
}

impl<T, S> Eq for Setter<T, S> {}

impl<T, S> fmt::Debug for Setter<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Setter({:p})", Arc::as_ptr(&self.store))
    }
}
