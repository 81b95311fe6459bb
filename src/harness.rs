//! Deterministic host for driving a [`Binding`] in tests.

#[cfg(feature = "no_std")]
use alloc::vec::Vec;

use portable_atomic_util::Arc;

use crate::{
    render_channel, BindError, Binding, RenderQueue, RenderSignal, Setter, ShouldUpdate, StoreApi,
};

/// Test component bound to a store, with manual control over the lifecycle.
///
/// Only available with the `testing` feature or during tests.
///
/// `TestComponent` plays the host framework: [`render`](Self::render) and
/// [`commit`](Self::commit) run the two phases separately, so tests can land
/// writes between them. Re-render requests queue up on a
/// [`render_channel`] until [`process_rerenders`](Self::process_rerenders)
/// drains them, coalescing every pending request into one render + commit,
/// as batching hosts do.
///
/// ```rust
/// use oxide_bind::{Arc, Store, TestComponent};
///
/// let store = Arc::new(Store::new(0));
/// let mut counter = TestComponent::new(Arc::clone(&store), true);
///
/// counter.render().unwrap();
/// counter.setter().unwrap().set(1); // lands before the subscription
/// counter.commit();
///
/// assert_eq!(counter.process_rerenders().unwrap(), 1);
/// counter.with_renders(|renders| assert_eq!(renders, &[0, 1]));
/// ```
pub struct TestComponent<T, S> {
    store: Arc<S>,
    should_update: ShouldUpdate<T>,
    binding: Binding<T, S, RenderSignal>,
    queue: RenderQueue,
    renders: Vec<T>,
    setter: Option<Setter<T, S>>,
    strict_effects: bool,
    requests: usize,
}

impl<T, S> TestComponent<T, S>
where
    T: Clone + Send + 'static,
    S: StoreApi<T>,
{
    /// Create an unmounted component for `store` with the given policy.
    pub fn new(store: Arc<S>, should_update: impl Into<ShouldUpdate<T>>) -> Self {
        let (signal, queue) = render_channel();
        Self {
            store,
            should_update: should_update.into(),
            binding: Binding::new(signal),
            queue,
            renders: Vec::new(),
            setter: None,
            strict_effects: false,
            requests: 0,
        }
    }

    /// Run every effect setup as setup, cleanup, setup, like hosts do in
    /// their diagnostic modes.
    pub fn with_strict_effects(mut self) -> Self {
        self.strict_effects = true;
        self
    }

    /// Render phase. Records the state the component rendered with.
    pub fn render(&mut self) -> Result<T, BindError> {
        let (state, setter) = self.binding.render(&self.store, self.should_update.clone())?;
        self.setter = Some(setter);
        self.renders.push(state.clone());
        Ok(state)
    }

    /// Commit phase.
    pub fn commit(&mut self) {
        if self.strict_effects && self.binding.needs_commit() {
            self.binding.commit();
            self.binding.teardown();
        }
        self.binding.commit();
    }

    /// Render and commit.
    pub fn mount(&mut self) -> Result<(), BindError> {
        self.render()?;
        self.commit();
        Ok(())
    }

    /// Render and commit once for every batch of pending re-render requests,
    /// until none are left. Returns the number of re-renders performed.
    pub fn process_rerenders(&mut self) -> Result<usize, BindError> {
        let mut rerenders = 0;
        loop {
            let pending = self.queue.drain();
            if pending.is_empty() {
                return Ok(rerenders);
            }
            self.requests += pending.len();
            self.render()?;
            self.commit();
            rerenders += 1;
        }
    }

    /// Change the policy used by subsequent renders.
    pub fn set_should_update(&mut self, should_update: impl Into<ShouldUpdate<T>>) {
        self.should_update = should_update.into();
    }

    /// Setter handed out by the most recent render.
    pub fn setter(&self) -> Option<&Setter<T, S>> {
        self.setter.as_ref()
    }

    /// Number of renders so far.
    pub fn count(&self) -> usize {
        self.renders.len()
    }

    /// State the component rendered with most recently.
    pub fn last_render(&self) -> Option<&T> {
        self.renders.last()
    }

    /// Access every rendered state, oldest first.
    pub fn with_renders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[T]) -> R,
    {
        f(&self.renders)
    }

    /// Re-render requests received so far, including ones still queued.
    pub fn rerender_requests(&self) -> usize {
        self.requests + self.queue.len()
    }

    /// The underlying binding, for inspecting its epoch state.
    pub fn binding(&self) -> &Binding<T, S, RenderSignal> {
        &self.binding
    }

    /// Unmount, releasing the subscription.
    pub fn unmount(self) {
        self.binding.unmount();
    }
}
