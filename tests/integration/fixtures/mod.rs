use mockall::mock;
use oxide_bind::{Capabilities, Listener, Revision, StoreApi, Subscription, Update};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Panel {
    pub(crate) counter: u32,
    pub(crate) label: String,
}

impl Panel {
    pub(crate) fn new(counter: u32) -> Self {
        Self {
            counter,
            label: String::from("panel"),
        }
    }
}

pub(crate) fn counter_changed(next: &Panel, prev: &Panel) -> bool {
    next.counter != prev.counter
}

mock! {
    pub Store {}

    impl StoreApi<i32> for Store {
        fn get_state(&self) -> i32;
        fn set_state(&self, update: Update<i32>);
        fn on_update(&self, listener: Listener<i32>) -> Subscription;
        fn revision(&self) -> Revision;
        fn capabilities(&self) -> Capabilities;
        fn sync_once(&self);
    }
}

/// A store that serves reads and writes but must never be subscribed to.
pub(crate) fn write_only_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_capabilities().return_const(Capabilities::STORE);
    store.expect_get_state().return_const(0);
    store.expect_revision().return_const(Revision::INITIAL);
    store.expect_set_state().times(1).return_const(());
    store.expect_on_update().never();
    store.expect_sync_once().never();
    store
}
