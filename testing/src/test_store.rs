//! Recording host store for tests
//!
//! [`TestStore`] folds every dispatched action through a [`Reducer`] behind a
//! `std::sync::Mutex` and keeps the full action log, so tests can assert both
//! the resulting state and the exact dispatch order.

#![allow(clippy::module_name_repetitions)]

use entity_lifecycle_core::{
    AppendPolicy, AsNotification, EntityCollection, EntityReducer, Notification, NotificationKind,
    Reducer,
};
use std::sync::{Mutex, PoisonError};

/// Host store that records every action it folds
///
/// # Example
///
/// ```
/// use entity_lifecycle_core::{EntityReducer, Notification};
/// use entity_lifecycle_testing::TestStore;
/// use serde_json::Value;
///
/// let store = TestStore::<EntityReducer<Value, String>>::entities();
/// store.dispatch(Notification::request("orders"));
///
/// assert!(store.state().get("orders").is_some_and(|s| s.is_fetching));
/// assert_eq!(store.actions().len(), 1);
/// ```
pub struct TestStore<R: Reducer> {
    reducer: R,
    state: Mutex<R::State>,
    actions: Mutex<Vec<R::Action>>,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone,
    R::Action: Clone,
{
    /// Create a store with `reducer` and an initial state
    #[must_use]
    pub const fn new(reducer: R, initial_state: R::State) -> Self {
        Self {
            reducer,
            state: Mutex::new(initial_state),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Record `action` and fold it into the state
    ///
    /// The log and the fold happen under the state lock, so the log order is
    /// the fold order even with concurrent dispatchers.
    pub fn dispatch(&self, action: R::Action) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action.clone());

        let current = state.clone();
        *state = self.reducer.reduce(current, &action);
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> R::State {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every action dispatched so far, in dispatch order
    #[must_use]
    pub fn actions(&self) -> Vec<R::Action> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dispatch function borrowing this store
    pub fn dispatcher(&self) -> impl Fn(R::Action) + Sync + '_
    where
        Self: Sync,
    {
        move |action| self.dispatch(action)
    }

    /// State reader borrowing this store
    pub fn state_reader(&self) -> impl Fn() -> R::State + Sync + '_
    where
        Self: Sync,
    {
        move || self.state()
    }
}

impl<T, E, A, P> TestStore<EntityReducer<T, E, A, P>>
where
    P: AppendPolicy<T>,
    T: Clone,
    E: Clone,
    A: AsNotification<T, E> + Clone,
{
    /// Store over an empty [`EntityCollection`]
    #[must_use]
    pub fn entities() -> Self {
        Self::new(EntityReducer::new(), EntityCollection::new())
    }

    /// Life-cycle notifications among the dispatched actions, in order
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification<T, E>> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(<A as AsNotification<T, E>>::as_notification)
            .cloned()
            .collect()
    }

    /// Kinds of the dispatched notifications, in order
    #[must_use]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications()
            .iter()
            .map(Notification::kind)
            .collect()
    }
}

impl<R> std::fmt::Debug for TestStore<R>
where
    R: Reducer,
    R::State: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actions = self
            .actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("TestStore")
            .field("state", &*self.state.lock().unwrap_or_else(PoisonError::into_inner))
            .field("actions", &actions)
            .finish_non_exhaustive()
    }
}
