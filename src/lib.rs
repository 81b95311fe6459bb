#![cfg_attr(feature = "no_std", no_std)]

//! Tear-free binding of shared mutable stores to reactive components, with
//! `no_std` support.
//!
//! A reactive host renders a component (pure, may run many times) and then
//! commits it (runs once, may register effects). A store write that lands
//! between the two would leave the component on screen with stale state and
//! nothing to wake it up. [`Binding`] closes that window: it remembers the
//! store's [`Revision`] at render time and, once subscribed at commit time,
//! requests exactly one catch-up render if the store moved on in between.
//!
//! ## Example
//!
//! ```rust
//! use core::sync::atomic::{AtomicUsize, Ordering};
//! use oxide_bind::{Arc, Binding, RerenderToken, Store};
//!
//! let store = Arc::new(Store::new(0));
//! let requests = Arc::new(AtomicUsize::new(0));
//!
//! // The host's re-render primitive; any `Fn(RerenderToken)` will do.
//! let counter = Arc::clone(&requests);
//! let mut binding = Binding::new(move |_token: RerenderToken| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! // Render phase: read the snapshot and get the setter.
//! let (count, set_count) = binding.render(&store, true)?;
//! assert_eq!(count, 0);
//!
//! // A write lands before the commit phase subscribes...
//! set_count.update(|n: &i32| n + 1);
//!
//! // ...and the commit phase catches up with it.
//! binding.commit();
//! assert_eq!(requests.load(Ordering::SeqCst), 1);
//!
//! // From here on every accepted update requests a render.
//! set_count.set(5);
//! assert_eq!(requests.load(Ordering::SeqCst), 2);
//!
//! binding.unmount();
//! # Ok::<(), oxide_bind::BindError>(())
//! ```
//!
//! Components that only write can opt out of subscribing altogether with
//! `binding.render(&store, false)`, and components interested in part of the
//! state can pass a [`ShouldUpdate::when`] predicate.

#[cfg(feature = "no_std")]
extern crate alloc;

// Module declarations
mod binding;
mod error;
mod persistent;
mod scheduler;
mod setter;
mod should_update;
mod store;

#[cfg(any(test, feature = "testing"))]
mod harness;

// Public re-exports
pub use binding::Binding;
pub use error::BindError;
pub use persistent::{MemoryStorage, PersistentStore, StateStorage};
pub use portable_atomic_util::Arc;
pub use scheduler::{render_channel, RenderQueue, RenderSignal, RerenderToken, Scheduler};
pub use setter::Setter;
pub use should_update::{Predicate, ShouldUpdate};
pub use store::{Capabilities, Listener, Revision, Store, StoreApi, Subscription, Update};

// Test utilities (only available with 'testing' feature or during tests)
#[cfg(any(test, feature = "testing"))]
pub use harness::TestComponent;
