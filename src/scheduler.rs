//! The host framework's re-render primitive.

use flume::{Receiver, Sender};

#[cfg(feature = "no_std")]
use alloc::vec::Vec;

/// Opaque value handed to the host with every re-render request.
///
/// Only its inequality across requests matters: a binding never requests two
/// renders with the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RerenderToken(u64);

impl RerenderToken {
    pub(crate) fn next(self) -> Self {
        RerenderToken(self.0.wrapping_add(1))
    }
}

/// A scheduler abstraction for asking the host framework to render again.
///
/// This is the only way a [`Binding`](crate::Binding) reaches back into the
/// host. Implement it on top of whatever your UI framework uses to schedule
/// renders (state setters, dirty flags, event loops, etc.).
///
/// Function pointers and closures automatically implement this trait via the
/// blanket implementation.
pub trait Scheduler {
    /// Request a new render of the component.
    ///
    /// Called synchronously from inside store notifications and from the
    /// commit phase. Implementations should only record the request.
    fn request_render(&self, token: RerenderToken);
}

/// Implement Scheduler for any callable type that matches the signature.
impl<F> Scheduler for F
where
    F: Fn(RerenderToken),
{
    fn request_render(&self, token: RerenderToken) {
        self(token)
    }
}

/// Channel-backed [`Scheduler`] for hosts that drain render requests from a
/// loop.
///
/// `RenderSignal` wraps a lock-free channel sender, making it cheap to clone
/// and safe to use from inside store notifications. The paired
/// [`RenderQueue`] is drained by the host.
///
/// # Example
///
/// ```rust
/// use oxide_bind::{render_channel, Scheduler};
///
/// let (signal, queue) = render_channel();
/// assert!(queue.is_empty());
///
/// // Normally called by a Binding.
/// signal.request_render(Default::default());
/// assert_eq!(queue.drain().len(), 1);
/// ```
pub struct RenderSignal(Sender<RerenderToken>);

impl Clone for RenderSignal {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl Scheduler for RenderSignal {
    fn request_render(&self, token: RerenderToken) {
        self.0.send(token).ok();
    }
}

/// Receiving end of a [`render_channel`].
pub struct RenderQueue(Receiver<RerenderToken>);

impl RenderQueue {
    /// Take every pending request, oldest first.
    ///
    /// Hosts typically coalesce the result into a single render.
    pub fn drain(&self) -> Vec<RerenderToken> {
        self.0.drain().collect()
    }

    /// Take the oldest pending request without waiting.
    pub fn try_next(&self) -> Option<RerenderToken> {
        self.0.try_recv().ok()
    }

    /// Wait for the next request. Resolves to `None` once every
    /// [`RenderSignal`] has been dropped.
    pub async fn next(&self) -> Option<RerenderToken> {
        self.0.recv_async().await.ok()
    }

    /// Number of requests waiting in the queue.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no request is waiting.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Create a connected [`RenderSignal`] / [`RenderQueue`] pair.
pub fn render_channel() -> (RenderSignal, RenderQueue) {
    let (sender, receiver) = flume::unbounded();
    (RenderSignal(sender), RenderQueue(receiver))
}
