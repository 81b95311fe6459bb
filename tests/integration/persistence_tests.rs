use oxide_bind::{Arc, MemoryStorage, PersistentStore, StoreApi, TestComponent, Update};

#[test]
fn given_a_persisted_value_when_mounted_should_rerender_with_it() {
    let storage = MemoryStorage::with_value(42);
    let store = Arc::new(PersistentStore::new(0, storage));
    let mut component = TestComponent::new(Arc::clone(&store), true);

    component.mount().unwrap();
    assert!(store.is_synced());

    assert_eq!(component.process_rerenders().unwrap(), 1);
    component.with_renders(|renders| {
        assert_eq!(renders, &[0, 42]);
    });
}

#[test]
fn given_a_write_only_component_should_still_sync_the_store() {
    let storage = MemoryStorage::with_value(3);
    let store = Arc::new(PersistentStore::new(0, storage.clone()));
    let mut component = TestComponent::new(Arc::clone(&store), false);

    component.mount().unwrap();
    assert_eq!(store.get_state(), 3);
    assert_eq!(component.process_rerenders().unwrap(), 0);

    component.setter().unwrap().update(|value: &i32| value * 2);
    assert_eq!(storage.get(), Some(6));
}

#[test]
fn given_two_components_on_one_store_should_sync_only_once() {
    let storage = MemoryStorage::with_value(1);
    let store = Arc::new(PersistentStore::new(0, storage.clone()));
    let mut first = TestComponent::new(Arc::clone(&store), true);
    let mut second = TestComponent::new(Arc::clone(&store), true);

    first.mount().unwrap();
    store.set_state(Update::Replace(10));
    second.mount().unwrap();

    assert_eq!(store.get_state(), 10);
    assert_eq!(second.last_render(), Some(&10));
    assert_eq!(second.process_rerenders().unwrap(), 0);
    assert_eq!(store.listener_count(), 2);
}

#[test]
fn given_nothing_persisted_when_mounted_should_not_rerender() {
    let store = Arc::new(PersistentStore::new(5, MemoryStorage::new()));
    let mut component = TestComponent::new(Arc::clone(&store), true).with_strict_effects();

    component.mount().unwrap();

    assert_eq!(component.rerender_requests(), 0);
    assert_eq!(component.last_render(), Some(&5));
}
