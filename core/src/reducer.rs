//! State reducer
//!
//! [`fold`] applies one notification to an [`EntityCollection`]. It is pure:
//! the collection is taken by value and the folded collection returned, so a
//! caller holding an earlier clone never observes the change.
//!
//! | Notification | Effect on the entity |
//! |--------------|----------------------|
//! | `Request` | `is_fetching = true`, `error` cleared |
//! | `Success` | `data` overwritten or appended, `error` cleared, `last_updated` set |
//! | `Failure` | `data` cleared, `error` set, `last_updated` set |
//! | `Reset`   | default state with `last_updated` set |
//! | `Delete`  | key removed |

use crate::notification::{AsNotification, Notification};
use crate::state::{Appendable, EntityCollection, EntityState};
use std::marker::PhantomData;

/// The Reducer trait - pure state transition
///
/// # Type Parameters
///
/// - `State`: The state this reducer folds into
/// - `Action`: The action type the host store dispatches
///
/// Host stores are generic over this trait; [`EntityReducer`] is the
/// implementation for entity collections.
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// Fold `action` into `state`, returning the new state
    fn reduce(&self, state: Self::State, action: &Self::Action) -> Self::State;
}

/// How an append-mode `Success` combines incoming data with existing data
///
/// [`Concatenate`] is the policy behind [`fold`]. Data types with no sequence
/// form (a typed record, say) fold through [`Replace`] with [`fold_with`] or an
/// [`EntityReducer`] parameterized on it; overwrite folds behave the same under
/// every policy.
pub trait AppendPolicy<T> {
    /// Data stored after an append-mode `Success` carrying `incoming`
    fn combine(existing: Option<T>, incoming: T) -> T;
}

/// Append through [`Appendable`]: existing entries first, then incoming
#[derive(Debug, Clone, Copy, Default)]
pub struct Concatenate;

impl<T: Appendable> AppendPolicy<T> for Concatenate {
    fn combine(existing: Option<T>, incoming: T) -> T {
        T::append(existing, incoming)
    }
}

/// Keep the incoming data even in append mode
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl<T> AppendPolicy<T> for Replace {
    fn combine(_existing: Option<T>, incoming: T) -> T {
        incoming
    }
}

/// Fold one action into an entity collection
///
/// An absent collection is treated as empty. Actions that do not carry a
/// life-cycle notification leave the collection exactly as it was. Append-mode
/// `Success` data is concatenated through [`Appendable`].
#[must_use]
pub fn fold<T, E, A>(collection: Option<EntityCollection<T, E>>, action: &A) -> EntityCollection<T, E>
where
    T: Appendable + Clone,
    E: Clone,
    A: AsNotification<T, E> + ?Sized,
{
    fold_with::<Concatenate, T, E, A>(collection, action)
}

/// [`fold`] with an explicit [`AppendPolicy`]
///
/// ```
/// use entity_lifecycle_core::{EntityCollection, Notification, Replace, Utc, fold_with};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Order {
///     id: u64,
/// }
///
/// let success = Notification::<Order, String>::success("order", Order { id: 1 }, Utc::now(), false);
/// let collection: EntityCollection<Order, String> = fold_with::<Replace, _, _, _>(None, &success);
///
/// assert_eq!(collection.get("order").and_then(|s| s.data.clone()), Some(Order { id: 1 }));
/// ```
#[must_use]
pub fn fold_with<P, T, E, A>(collection: Option<EntityCollection<T, E>>, action: &A) -> EntityCollection<T, E>
where
    P: AppendPolicy<T>,
    T: Clone,
    E: Clone,
    A: AsNotification<T, E> + ?Sized,
{
    let mut collection = collection.unwrap_or_default();

    let Some(notification) = action.as_notification() else {
        return collection;
    };

    match notification {
        Notification::Delete { entity } => {
            collection.remove(entity);
        },
        _ => {
            let slot = collection.slot(notification.entity());
            *slot = fold_entity_with::<P, T, E>(std::mem::take(slot), notification);
        },
    }

    collection
}

/// Fold one notification into the state of a single entity
///
/// `Delete` has no per-entity meaning and returns `state` unchanged; it is
/// handled by [`fold`] at the collection level.
#[must_use]
pub fn fold_entity<T, E>(state: EntityState<T, E>, notification: &Notification<T, E>) -> EntityState<T, E>
where
    T: Appendable + Clone,
    E: Clone,
{
    fold_entity_with::<Concatenate, T, E>(state, notification)
}

/// [`fold_entity`] with an explicit [`AppendPolicy`]
#[must_use]
pub fn fold_entity_with<P, T, E>(state: EntityState<T, E>, notification: &Notification<T, E>) -> EntityState<T, E>
where
    P: AppendPolicy<T>,
    T: Clone,
    E: Clone,
{
    match notification {
        Notification::Request { .. } => EntityState {
            is_fetching: true,
            error: None,
            ..state
        },
        Notification::Success {
            data,
            last_updated,
            append,
            ..
        } => EntityState {
            data: merge_data::<P, T>(state.data, data.clone(), *append),
            is_fetching: false,
            last_updated: Some(*last_updated),
            error: None,
        },
        Notification::Failure {
            error,
            last_updated,
            ..
        } => EntityState {
            data: None,
            is_fetching: false,
            last_updated: Some(*last_updated),
            error: Some(error.clone()),
        },
        Notification::Reset { last_updated, .. } => EntityState {
            last_updated: Some(*last_updated),
            ..EntityState::default()
        },
        Notification::Delete { .. } => state,
    }
}

/// Data after a `Success`: `incoming` verbatim, or appended onto `existing`
#[must_use]
pub fn derive_new_data<T: Appendable>(existing: Option<T>, incoming: T, append: bool) -> Option<T> {
    merge_data::<Concatenate, T>(existing, incoming, append)
}

fn merge_data<P: AppendPolicy<T>, T>(existing: Option<T>, incoming: T, append: bool) -> Option<T> {
    if append {
        Some(P::combine(existing, incoming))
    } else {
        Some(incoming)
    }
}

/// [`Reducer`] over an [`EntityCollection`]
///
/// Generic over the host action type `A`, which defaults to
/// [`Notification`] for stores that dispatch nothing else, and over the
/// [`AppendPolicy`] `P`, which defaults to [`Concatenate`].
pub struct EntityReducer<T, E, A = Notification<T, E>, P = Concatenate> {
    _phantom: PhantomData<fn() -> (T, E, A, P)>,
}

impl<T, E, A, P> EntityReducer<T, E, A, P> {
    /// Create a new entity reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T, E, A, P> Default for EntityReducer<T, E, A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E, A, P> Clone for EntityReducer<T, E, A, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E, A, P> Copy for EntityReducer<T, E, A, P> {}

impl<T, E, A, P> std::fmt::Debug for EntityReducer<T, E, A, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EntityReducer")
    }
}

impl<T, E, A, P> Reducer for EntityReducer<T, E, A, P>
where
    P: AppendPolicy<T>,
    T: Clone,
    E: Clone,
    A: AsNotification<T, E>,
{
    type State = EntityCollection<T, E>;
    type Action = A;

    fn reduce(&self, state: Self::State, action: &Self::Action) -> Self::State {
        fold_with::<P, T, E, A>(Some(state), action)
    }
}
