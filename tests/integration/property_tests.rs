//! Property tests over arbitrary write sequences.
//!
//! 1. Selectivity: a mounted binding requests exactly one render per
//!    transition its policy accepts.
//! 2. Freshness: whatever lands between render and commit, one pass of
//!    re-renders leaves the component on the store's latest state.
//! 3. Opt-out: a `false` policy never requests a render.

use oxide_bind::{Arc, Predicate, ShouldUpdate, Store, StoreApi, TestComponent, Update};
use proptest::prelude::*;

fn writes() -> impl Strategy<Value = Vec<i8>> {
    proptest::collection::vec(any::<i8>(), 0..=40)
}

proptest! {
    #[test]
    fn requests_match_accepted_transitions(start in any::<i8>(), values in writes(), threshold in 0i16..=64) {
        let store = Arc::new(Store::new(start));
        let policy = Predicate::new(move |next: &i8, prev: &i8| {
            (i16::from(*next) - i16::from(*prev)).abs() > threshold
        });
        let mut component = TestComponent::new(Arc::clone(&store), &policy);
        component.mount().unwrap();

        let mut expected = 0;
        let mut prev = start;
        for value in values {
            if policy.test(&value, &prev) {
                expected += 1;
            }
            store.set_state(Update::Replace(value));
            prev = value;
        }

        prop_assert_eq!(component.rerender_requests(), expected);
    }

    #[test]
    fn always_requests_one_render_per_write(values in writes()) {
        let store = Arc::new(Store::new(0i8));
        let mut component = TestComponent::new(Arc::clone(&store), true);
        component.mount().unwrap();

        for value in &values {
            store.set_state(Update::Replace(*value));
        }

        prop_assert_eq!(component.rerender_requests(), values.len());
    }

    #[test]
    fn component_converges_on_latest_state(
        before_commit in writes(),
        after_commit in writes(),
        strict in any::<bool>()
    ) {
        let store = Arc::new(Store::new(0i8));
        let mut component = TestComponent::new(Arc::clone(&store), true);
        if strict {
            component = component.with_strict_effects();
        }

        component.render().unwrap();
        for value in &before_commit {
            store.set_state(Update::Replace(*value));
        }
        component.commit();
        let catch_up = component.process_rerenders().unwrap();
        prop_assert_eq!(catch_up, usize::from(!before_commit.is_empty()));
        prop_assert_eq!(component.last_render(), Some(&store.get_state()));

        for value in &after_commit {
            store.set_state(Update::Replace(*value));
        }
        component.process_rerenders().unwrap();
        prop_assert_eq!(component.last_render(), Some(&store.get_state()));
    }

    #[test]
    fn opted_out_components_never_request_renders(values in writes()) {
        let store = Arc::new(Store::new(0i8));
        let mut component = TestComponent::new(Arc::clone(&store), ShouldUpdate::Never);

        component.render().unwrap();
        for value in &values {
            store.set_state(Update::Replace(*value));
        }
        component.commit();

        prop_assert_eq!(component.rerender_requests(), 0);
        prop_assert_eq!(store.listener_count(), 0);
    }
}
