//! Binding of one component instance to one store across its mounted lifetime.

use core::fmt;

use portable_atomic_util::Arc;
use spin::Mutex;
use tracing::{debug, trace};

use crate::{
    BindError, Capabilities, Listener, Revision, RerenderToken, Scheduler, Setter, ShouldUpdate,
    StoreApi, Subscription,
};

/// What an epoch depends on: the store instance and the re-render policy.
struct DependencyKey<T, S> {
    store: Arc<S>,
    should_update: ShouldUpdate<T>,
}

impl<T, S> Clone for DependencyKey<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            should_update: self.should_update.clone(),
        }
    }
}

impl<T, S> PartialEq for DependencyKey<T, S> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) && self.should_update == other.should_update
    }
}

/// Revision baseline, tagged with the dependencies it was captured for.
struct Observed<T, S> {
    key: DependencyKey<T, S>,
    revision: Revision,
}

/// Commit-phase state. `key` is `None` between epochs.
struct Epoch<T, S> {
    key: Option<DependencyKey<T, S>>,
    subscription: Option<Subscription>,
    catch_up_done: bool,
}

impl<T, S> Epoch<T, S> {
    fn idle() -> Self {
        Self {
            key: None,
            subscription: None,
            catch_up_done: false,
        }
    }
}

/// Connects one component instance to a store.
///
/// The host framework drives a `Binding` through two phases:
///
/// 1. [`render`](Self::render) on every render: reads the state snapshot and
///    hands out the setter. Free of side effects beyond reading the store.
/// 2. [`commit`](Self::commit) once per actual commit: subscribes to the store
///    when the dependencies (store identity, policy identity) changed since the
///    last commit, tearing the previous subscription down first.
///
/// Re-renders are requested through the [`Scheduler`] with a fresh
/// [`RerenderToken`] whenever the policy accepts a store update, and once per
/// epoch if the store moved on between the render and the subscription
/// (the catch-up). That catch-up is unconditional: the missed transition's
/// `(next, prev)` pair is gone, so a predicate-filtered binding may render
/// once more than strictly needed.
///
/// Hosts that double-invoke effects for diagnostics call
/// `commit`, [`teardown`](Self::teardown), `commit`. The second setup sees an
/// up-to-date baseline and does not request another render.
///
/// # Type Parameters
///
/// * `T` - The store's state type
/// * `S` - The store type (implements [`StoreApi`])
/// * `R` - The host's re-render primitive (implements [`Scheduler`])
pub struct Binding<T, S, R> {
    scheduler: R,
    token: Arc<Mutex<RerenderToken>>,
    rendered: Option<DependencyKey<T, S>>,
    setter: Option<Setter<T, S>>,
    observed: Option<Observed<T, S>>,
    epoch: Epoch<T, S>,
}

impl<T, S, R> Binding<T, S, R>
where
    T: Send + 'static,
    S: StoreApi<T>,
    R: Scheduler + Clone + Send + Sync + 'static,
{
    /// Create an unmounted binding that requests renders through `scheduler`.
    pub fn new(scheduler: R) -> Self {
        Self {
            scheduler,
            token: Arc::new(Mutex::new(RerenderToken::default())),
            rendered: None,
            setter: None,
            observed: None,
            epoch: Epoch::idle(),
        }
    }

    /// Render phase: read the current state and get the setter.
    ///
    /// Fails with [`BindError::InvalidArgument`] if `store` does not advertise
    /// the full [`Capabilities::STORE`] set. The check runs on every call, so
    /// misuse surfaces on the first render.
    pub fn render(
        &mut self,
        store: &Arc<S>,
        should_update: impl Into<ShouldUpdate<T>>,
    ) -> Result<(T, Setter<T, S>), BindError> {
        let missing = Capabilities::STORE.difference(store.capabilities());
        if !missing.is_empty() {
            return Err(BindError::InvalidArgument { missing });
        }

        let state = store.get_state();
        trace!("read render snapshot");

        let setter = match &self.setter {
            Some(setter) if setter.is_bound_to(store) => setter.clone(),
            _ => {
                let setter = Setter::new(Arc::clone(store));
                self.setter = Some(setter.clone());
                setter
            }
        };

        let key = DependencyKey {
            store: Arc::clone(store),
            should_update: should_update.into(),
        };

        // First render for these dependencies: capture the baseline.
        if !matches!(&self.observed, Some(observed) if observed.key == key) {
            let revision = store.revision();
            trace!(%revision, "captured render baseline");
            self.observed = Some(Observed {
                key: key.clone(),
                revision,
            });
        }

        self.rendered = Some(key);
        Ok((state, setter))
    }

    /// Commit phase: (re)subscribe if the rendered dependencies changed.
    ///
    /// Does nothing before the first successful [`render`](Self::render) or
    /// when the active epoch already matches the rendered dependencies.
    pub fn commit(&mut self) {
        let Some(key) = self.rendered.clone() else {
            return;
        };
        if self.epoch.key.as_ref() == Some(&key) {
            return;
        }

        self.teardown();
        self.setup(key);
    }

    /// Effect cleanup: unsubscribe and end the current epoch.
    ///
    /// The store's current revision becomes the baseline for an epoch with the
    /// same dependencies, so re-subscribing right away does not catch up on
    /// changes this epoch already saw. Calling it without an active epoch is a
    /// no-op.
    pub fn teardown(&mut self) {
        let Some(key) = self.epoch.key.take() else {
            return;
        };

        if let Some(mut subscription) = self.epoch.subscription.take() {
            subscription.unsubscribe();
            debug!("unsubscribed from store");
        }
        self.epoch.catch_up_done = false;

        // A render for different dependencies already owns the baseline.
        let owns_baseline = self
            .observed
            .as_ref()
            .map_or(true, |observed| observed.key == key);
        if owns_baseline {
            let revision = key.store.revision();
            self.observed = Some(Observed { key, revision });
        }
    }

    /// Tear down and release the store.
    pub fn unmount(mut self) {
        self.teardown();
    }

    /// Whether the next [`commit`](Self::commit) will start a new epoch.
    pub fn needs_commit(&self) -> bool {
        match &self.rendered {
            Some(key) => self.epoch.key.as_ref() != Some(key),
            None => false,
        }
    }

    /// Whether the current epoch holds a store subscription.
    pub fn is_subscribed(&self) -> bool {
        self.epoch.subscription.is_some()
    }

    /// Whether the current epoch already ran its catch-up check.
    pub fn catch_up_done(&self) -> bool {
        self.epoch.catch_up_done
    }

    /// Baseline revision the next catch-up check compares against.
    pub fn observed_revision(&self) -> Option<Revision> {
        self.observed.as_ref().map(|observed| observed.revision)
    }

    /// Token of the most recent re-render request.
    pub fn token(&self) -> RerenderToken {
        *self.token.lock()
    }

    fn setup(&mut self, key: DependencyKey<T, S>) {
        let store = Arc::clone(&key.store);

        if store.capabilities().contains(Capabilities::SYNC_ONCE) {
            debug!("syncing persisted store before subscribing");
            store.sync_once();
        }

        if !key.should_update.subscribes() {
            debug!("update policy is Never, not subscribing");
            self.epoch.key = Some(key);
            return;
        }

        let listener = self.listener(key.should_update.clone());
        self.epoch.subscription = Some(store.on_update(listener));
        debug!("subscribed to store");

        if !self.epoch.catch_up_done {
            let current = store.revision();
            let observed = self
                .observed
                .as_ref()
                .filter(|observed| observed.key == key)
                .map(|observed| observed.revision);

            if let Some(observed) = observed.filter(|observed| *observed != current) {
                debug!(%observed, revision = %current, "store changed before subscription, catching up");
                request_render(&self.token, &self.scheduler);
            }
            self.epoch.catch_up_done = true;
        }

        self.epoch.key = Some(key);
    }

    fn listener(&self, should_update: ShouldUpdate<T>) -> Listener<T> {
        let token = Arc::clone(&self.token);
        let scheduler = self.scheduler.clone();

        Listener::new(move |next: &T, prev: &T| {
            if should_update.accepts(next, prev) {
                trace!("update accepted, requesting render");
                request_render(&token, &scheduler);
            } else {
                trace!("update filtered out");
            }
        })
    }
}

fn request_render<R: Scheduler>(token: &Mutex<RerenderToken>, scheduler: &R) {
    let next = {
        let mut token = token.lock();
        *token = token.next();
        *token
    };
    scheduler.request_render(next);
}

impl<T, S, R> fmt::Debug for Binding<T, S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("token", &*self.token.lock())
            .field("subscribed", &self.epoch.subscription.is_some())
            .field("catch_up_done", &self.epoch.catch_up_done)
            .field(
                "observed_revision",
                &self.observed.as_ref().map(|observed| observed.revision),
            )
            .finish()
    }
}
