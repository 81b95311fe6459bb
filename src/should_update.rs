//! Re-render policies.

#[cfg(feature = "no_std")]
use alloc::boxed::Box;

use core::fmt;

use portable_atomic_util::Arc;

struct PredicateFn<T>(Box<dyn Fn(&T, &T) -> bool + Send + Sync>);

/// A `(next, prev) -> bool` transition filter with identity semantics.
///
/// Two predicates are equal only if one is a clone of the other. A binding
/// treats a predicate with a new identity as a new dependency and
/// re-subscribes, so create a predicate once and reuse it across renders.
pub struct Predicate<T>(Arc<PredicateFn<T>>);

impl<T> Predicate<T> {
    /// Wrap `f`, which receives `(next, prev)`. Every call creates a new identity.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(PredicateFn(Box::new(f))))
    }

    /// Whether the transition `prev -> next` is relevant.
    pub fn test(&self, next: &T, prev: &T) -> bool {
        (self.0 .0)(next, prev)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for Predicate<T> {}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({:p})", Arc::as_ptr(&self.0))
    }
}

/// When a bound component should re-render in response to store updates.
///
/// `true` and `false` convert into [`Always`](Self::Always) and
/// [`Never`](Self::Never).
///
/// ```rust
/// use oxide_bind::ShouldUpdate;
///
/// #[derive(Clone)]
/// struct Form { counter: u32, draft: String }
///
/// let on_counter = ShouldUpdate::when(|next: &Form, prev: &Form| next.counter != prev.counter);
/// let a = Form { counter: 1, draft: String::new() };
/// let b = Form { counter: 1, draft: String::from("typing") };
/// assert!(!on_counter.accepts(&b, &a));
/// ```
pub enum ShouldUpdate<T> {
    /// Subscribe and re-render on every update.
    Always,
    /// Never subscribe. For components that only need the setter.
    Never,
    /// Subscribe, but re-render only for transitions the predicate accepts.
    When(Predicate<T>),
}

impl<T> ShouldUpdate<T> {
    /// Policy backed by a fresh [`Predicate`] around `f`.
    ///
    /// # Arguments
    ///
    /// * `f` - Called with `(next, prev)`; returning `true` requests a render
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        ShouldUpdate::When(Predicate::new(f))
    }

    /// Whether this policy registers a listener at all.
    pub fn subscribes(&self) -> bool {
        !matches!(self, ShouldUpdate::Never)
    }

    /// Whether the transition `prev -> next` warrants a re-render.
    pub fn accepts(&self, next: &T, prev: &T) -> bool {
        match self {
            ShouldUpdate::Always => true,
            ShouldUpdate::Never => false,
            ShouldUpdate::When(predicate) => predicate.test(next, prev),
        }
    }
}

impl<T> Default for ShouldUpdate<T> {
    fn default() -> Self {
        ShouldUpdate::Always
    }
}

impl<T> Clone for ShouldUpdate<T> {
    fn clone(&self) -> Self {
        match self {
            ShouldUpdate::Always => ShouldUpdate::Always,
            ShouldUpdate::Never => ShouldUpdate::Never,
            ShouldUpdate::When(predicate) => ShouldUpdate::When(predicate.clone()),
        }
    }
}

impl<T> PartialEq for ShouldUpdate<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ShouldUpdate::Always, ShouldUpdate::Always) => true,
            (ShouldUpdate::Never, ShouldUpdate::Never) => true,
            (ShouldUpdate::When(a), ShouldUpdate::When(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Eq for ShouldUpdate<T> {}

impl<T> fmt::Debug for ShouldUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShouldUpdate::Always => f.write_str("Always"),
            ShouldUpdate::Never => f.write_str("Never"),
            ShouldUpdate::When(predicate) => f.debug_tuple("When").field(predicate).finish(),
        }
    }
}

impl<T> From<bool> for ShouldUpdate<T> {
    fn from(subscribe: bool) -> Self {
        if subscribe {
            ShouldUpdate::Always
        } else {
            ShouldUpdate::Never
        }
    }
}

impl<T> From<Predicate<T>> for ShouldUpdate<T> {
    fn from(predicate: Predicate<T>) -> Self {
        ShouldUpdate::When(predicate)
    }
}

impl<T> From<&Predicate<T>> for ShouldUpdate<T> {
    fn from(predicate: &Predicate<T>) -> Self {
        ShouldUpdate::When(predicate.clone())
    }
}
