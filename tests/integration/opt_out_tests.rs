use oxide_bind::{Arc, Binding, RerenderToken, Store, StoreApi, TestComponent, Update};

use super::write_only_store;

#[test]
fn given_opt_out_when_store_written_should_never_rerender() {
    let store = Arc::new(Store::new(0));
    let mut component = TestComponent::new(Arc::clone(&store), false);
    component.mount().unwrap();

    store.set_state(Update::Replace(1));
    store.set_state(Update::Replace(2));

    assert_eq!(component.process_rerenders().unwrap(), 0);
    assert_eq!(component.rerender_requests(), 0);
    assert_eq!(store.listener_count(), 0);
    assert!(!component.binding().is_subscribed());

    component.unmount();
}

#[test]
fn given_opt_out_when_written_before_commit_should_not_catch_up() {
    let store = Arc::new(Store::new(0));
    let mut component = TestComponent::new(Arc::clone(&store), false);

    component.render().unwrap();
    store.set_state(Update::Replace(1));
    component.commit();

    assert_eq!(component.rerender_requests(), 0);
}

#[test]
fn given_opt_out_should_never_subscribe_or_unsubscribe() {
    let store = Arc::new(write_only_store());
    let mut binding =
        Binding::new(|_: RerenderToken| panic!("opted-out binding requested a render"));

    let (state, setter) = binding.render(&store, false).unwrap();
    binding.commit();
    setter.set(state + 1);
    binding.unmount();
}

#[test]
fn given_opt_out_the_setter_still_writes() {
    let store = Arc::new(Store::new(0));
    let mut writer = TestComponent::new(Arc::clone(&store), false);
    let mut reader = TestComponent::new(Arc::clone(&store), true);
    writer.mount().unwrap();
    reader.mount().unwrap();

    writer.setter().unwrap().update(|value: &i32| value + 41);
    writer.setter().unwrap().update(|value: &i32| value + 1);

    assert_eq!(reader.process_rerenders().unwrap(), 1);
    assert_eq!(reader.last_render(), Some(&42));
    assert_eq!(writer.count(), 1);
}
