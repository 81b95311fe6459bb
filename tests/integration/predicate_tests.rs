use oxide_bind::{Arc, Predicate, ShouldUpdate, Store, StoreApi, TestComponent, Update};

use super::{counter_changed, Panel};

fn mounted_panel(counter: u32) -> (Arc<Store<Panel>>, TestComponent<Panel, Store<Panel>>) {
    let store = Arc::new(Store::new(Panel::new(counter)));
    let mut component =
        TestComponent::new(Arc::clone(&store), ShouldUpdate::when(counter_changed));
    component.mount().unwrap();
    (store, component)
}

#[test]
fn given_a_counter_predicate_when_unrelated_field_changes_should_not_rerender() {
    let (store, mut component) = mounted_panel(5);

    store.set_state(Update::with(|panel: &Panel| Panel {
        label: String::from("other"),
        ..panel.clone()
    }));

    assert_eq!(component.process_rerenders().unwrap(), 0);
    assert_eq!(component.count(), 1);
}

#[test]
fn given_a_counter_predicate_when_counter_changes_should_rerender_once() {
    let (store, mut component) = mounted_panel(5);

    store.set_state(Update::with(|panel: &Panel| Panel {
        counter: 6,
        ..panel.clone()
    }));

    assert_eq!(component.rerender_requests(), 1);
    assert_eq!(component.process_rerenders().unwrap(), 1);
    assert_eq!(component.last_render().map(|panel| panel.counter), Some(6));
}

#[test]
fn given_the_predicate_receives_next_then_prev() {
    let store = Arc::new(Store::new(1));
    let increasing = Predicate::new(|next: &i32, prev: &i32| next > prev);
    let mut component = TestComponent::new(Arc::clone(&store), &increasing);
    component.mount().unwrap();

    store.set_state(Update::Replace(0));
    assert_eq!(component.rerender_requests(), 0);

    store.set_state(Update::Replace(3));
    assert_eq!(component.rerender_requests(), 1);
}

#[test]
fn given_always_when_value_is_rewritten_unchanged_should_still_rerender() {
    let store = Arc::new(Store::new(7));
    let mut component = TestComponent::new(Arc::clone(&store), true);
    component.mount().unwrap();

    store.set_state(Update::Replace(7));

    assert_eq!(component.rerender_requests(), 1);
}

#[test]
fn given_a_reused_predicate_when_rerendered_should_keep_the_subscription() {
    let store = Arc::new(Store::new(0));
    let any_change = Predicate::new(|next: &i32, prev: &i32| next != prev);
    let mut component = TestComponent::new(Arc::clone(&store), &any_change);
    component.mount().unwrap();

    store.set_state(Update::Replace(1));
    component.process_rerenders().unwrap();

    assert!(!component.binding().needs_commit());
    assert_eq!(store.listener_count(), 1);
}

#[test]
fn given_a_predicate_that_panics_should_propagate_to_the_writer() {
    let store = Arc::new(Store::new(0));
    let mut component = TestComponent::new(
        Arc::clone(&store),
        ShouldUpdate::when(|_: &i32, _: &i32| panic!("predicate failed")),
    );
    component.mount().unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        store.set_state(Update::Replace(1));
    }));

    assert!(result.is_err());
}
