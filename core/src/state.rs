//! Entity state model
//!
//! [`EntityState`] is the per-entity record the reducer maintains, and
//! [`EntityCollection`] maps entity names to those records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::FpCategory;

/// State of one tracked entity
///
/// `is_fetching` is true exactly while a `Request` was folded and no
/// `Success`/`Failure` has been folded after it. A `Failure` fold always sets
/// `error` and clears `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState<T, E> {
    /// Last successfully fetched data
    pub data: Option<T>,

    /// A fetch is in flight
    pub is_fetching: bool,

    /// Time of the most recent `Success`, `Failure` or `Reset`
    pub last_updated: Option<DateTime<Utc>>,

    /// Last error, if the entity is in an error state
    pub error: Option<E>,
}

impl<T, E> EntityState<T, E> {
    /// Whether the entity currently holds data
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Whether the entity is in an error state
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

// Manual impl: the default state needs no `T: Default` or `E: Default`
impl<T, E> Default for EntityState<T, E> {
    fn default() -> Self {
        Self {
            data: None,
            is_fetching: false,
            last_updated: None,
            error: None,
        }
    }
}

/// Mapping from entity name to [`EntityState`]
///
/// Entries appear the first time a `Request`, `Success`, `Failure` or `Reset`
/// is folded for a name, and disappear only through `Delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCollection<T, E> {
    entities: HashMap<String, EntityState<T, E>>,
}

impl<T, E> EntityCollection<T, E> {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    /// State of `entity`, or `None` if it was never seen or was deleted
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<&EntityState<T, E>> {
        self.entities.get(entity)
    }

    /// Whether `entity` is present
    #[must_use]
    pub fn contains(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of tracked entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over `(name, state)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityState<T, E>)> {
        self.entities
            .iter()
            .map(|(name, state)| (name.as_str(), state))
    }

    /// Names of all tracked entities, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Mutable slot for `entity`, created with the default state when absent
    pub(crate) fn slot(&mut self, entity: &str) -> &mut EntityState<T, E> {
        self.entities.entry(entity.to_owned()).or_default()
    }

    /// Remove `entity` entirely
    pub(crate) fn remove(&mut self, entity: &str) -> Option<EntityState<T, E>> {
        self.entities.remove(entity)
    }
}

impl<T, E> Default for EntityCollection<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> FromIterator<(String, EntityState<T, E>)> for EntityCollection<T, E> {
    fn from_iter<I: IntoIterator<Item = (String, EntityState<T, E>)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

/// Data that supports append-mode `Success` folds
///
/// `append` concatenates `incoming` after `existing`. Existing entries always
/// come first; nothing is de-duplicated or reordered.
pub trait Appendable: Sized {
    /// Concatenate `incoming` onto `existing` (absent `existing` means empty)
    #[must_use]
    fn append(existing: Option<Self>, incoming: Self) -> Self;
}

/// JSON data: non-array values are wrapped into a single-element array
/// before concatenation. Falsy existing data (`null`, `false`, `0`, `""`)
/// counts as empty.
impl Appendable for serde_json::Value {
    fn append(existing: Option<Self>, incoming: Self) -> Self {
        use serde_json::Value;

        let mut merged = match existing {
            None => Vec::new(),
            Some(value) if is_falsy(&value) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        };

        match incoming {
            Value::Array(items) => merged.extend(items),
            other => merged.push(other),
        }

        Value::Array(merged)
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.classify() == FpCategory::Zero),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl<U> Appendable for Vec<U> {
    fn append(existing: Option<Self>, incoming: Self) -> Self {
        let mut merged = existing.unwrap_or_default();
        merged.extend(incoming);
        merged
    }
}
