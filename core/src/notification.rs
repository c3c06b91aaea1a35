//! Notification vocabulary
//!
//! The closed set of life-cycle transitions and the payload each one carries.
//! Notifications are produced by the coordinator (or by caller code through
//! [`reset`] and [`delete`]) and folded by the reducer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five life-cycle notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A fetch was started
    Request,
    /// A fetch resolved with data
    Success,
    /// A fetch rejected with an error
    Failure,
    /// The entity was reset to its default state
    Reset,
    /// The entity was removed from the collection
    Delete,
}

impl NotificationKind {
    /// Stable lowercase name, used for log fields and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Reset => "reset",
            Self::Delete => "delete",
        }
    }

    /// Whether this kind settles a fetch (`Success` or `Failure`)
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single life-cycle transition for one entity
///
/// # Type Parameters
///
/// - `T`: The entity's data type
/// - `E`: The error type the fetch can reject with
///
/// Serialized with an internal `kind` tag:
///
/// ```json
/// { "kind": "success", "entity": "orders", "data": [1, 2], "lastUpdated": "...", "append": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Notification<T, E> {
    /// A fetch for `entity` started
    Request {
        /// Entity name
        entity: String,
    },

    /// A fetch for `entity` resolved
    Success {
        /// Entity name
        entity: String,
        /// Fetched (possibly processor-transformed) data
        data: T,
        /// When the fetch settled
        last_updated: DateTime<Utc>,
        /// Concatenate onto existing data instead of overwriting it
        #[serde(default)]
        append: bool,
    },

    /// A fetch for `entity` rejected
    Failure {
        /// Entity name
        entity: String,
        /// Rejection value (possibly processor-transformed)
        error: E,
        /// When the fetch settled
        last_updated: DateTime<Utc>,
    },

    /// Return `entity` to its default state
    Reset {
        /// Entity name
        entity: String,
        /// Timestamp recorded on the reset state
        last_updated: DateTime<Utc>,
    },

    /// Remove `entity` from the collection
    Delete {
        /// Entity name
        entity: String,
    },
}

impl<T, E> Notification<T, E> {
    /// Build a `Request` notification
    #[must_use]
    pub fn request(entity: impl Into<String>) -> Self {
        Self::Request {
            entity: entity.into(),
        }
    }

    /// Build a `Success` notification
    #[must_use]
    pub fn success(
        entity: impl Into<String>,
        data: T,
        last_updated: DateTime<Utc>,
        append: bool,
    ) -> Self {
        Self::Success {
            entity: entity.into(),
            data,
            last_updated,
            append,
        }
    }

    /// Build a `Failure` notification
    #[must_use]
    pub fn failure(entity: impl Into<String>, error: E, last_updated: DateTime<Utc>) -> Self {
        Self::Failure {
            entity: entity.into(),
            error,
            last_updated,
        }
    }

    /// The entity this notification targets
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Request { entity }
            | Self::Success { entity, .. }
            | Self::Failure { entity, .. }
            | Self::Reset { entity, .. }
            | Self::Delete { entity } => entity,
        }
    }

    /// The kind of this notification
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::Request { .. } => NotificationKind::Request,
            Self::Success { .. } => NotificationKind::Success,
            Self::Failure { .. } => NotificationKind::Failure,
            Self::Reset { .. } => NotificationKind::Reset,
            Self::Delete { .. } => NotificationKind::Delete,
        }
    }
}

/// Build a `Reset` notification for `entity`
///
/// `last_updated` defaults to the current time.
#[must_use]
pub fn reset<T, E>(
    entity: impl Into<String>,
    last_updated: Option<DateTime<Utc>>,
) -> Notification<T, E> {
    Notification::Reset {
        entity: entity.into(),
        last_updated: last_updated.unwrap_or_else(Utc::now),
    }
}

/// Build a `Delete` notification for `entity`
#[must_use]
pub fn delete<T, E>(entity: impl Into<String>) -> Notification<T, E> {
    Notification::Delete {
        entity: entity.into(),
    }
}

/// Views a host action as a life-cycle notification
///
/// Host stores usually dispatch a wider action type than [`Notification`].
/// Implement this for the host's action enum so the reducer can pick out the
/// life-cycle notifications and pass every other action through untouched.
/// Typed data such as `Order` below folds with [`Replace`](crate::Replace).
///
/// # Example
///
/// ```ignore
/// enum AppAction {
///     Orders(Notification<Order, ApiError>),
///     ToggleSidebar,
/// }
///
/// impl AsNotification<Order, ApiError> for AppAction {
///     fn as_notification(&self) -> Option<&Notification<Order, ApiError>> {
///         match self {
///             Self::Orders(notification) => Some(notification),
///             Self::ToggleSidebar => None,
///         }
///     }
/// }
/// ```
pub trait AsNotification<T, E> {
    /// The notification carried by this action, if any
    fn as_notification(&self) -> Option<&Notification<T, E>>;
}

impl<T, E> AsNotification<T, E> for Notification<T, E> {
    fn as_notification(&self) -> Option<&Notification<T, E>> {
        Some(self)
    }
}
