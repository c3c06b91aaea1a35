//! # Entity Lifecycle Core
//!
//! Request / success / failure life cycle for entities whose data is loaded
//! from an asynchronous source, expressed for a unidirectional data flow
//! architecture (dispatch → reducer → store).
//!
//! ## Core Concepts
//!
//! - **Notification**: One life-cycle transition (`Request`, `Success`, `Failure`, `Reset`, `Delete`)
//! - **Entity State**: Per-entity `data`, `is_fetching`, `last_updated` and `error`
//! - **Reducer**: Pure fold `(EntityCollection, Notification) → EntityCollection`
//! - **Coordinator**: Turns a pending future into the notifications a host store dispatches
//! - **Processors**: Optional hooks around the success and failure transitions
//! - **Environment**: Injected clock for `last_updated` timestamps
//!
//! ## Architecture Principles
//!
//! - The host store owns the entity collection; the coordinator only dispatches
//! - Configuration is a value built per invocation, never shared
//! - Exactly one suspension point per fetch, with a success and a failure branch
//! - Programmer errors fail fast, before any notification is dispatched
//!
//! ## Example
//!
//! ```ignore
//! use entity_lifecycle_core::{start, fold, Configuration, EntityCollection};
//!
//! let operation = start(
//!     "orders",
//!     async { client.fetch_orders().await },
//!     Configuration::new().with_append(true),
//! )?;
//!
//! // The host supplies its dispatch and state-read capabilities
//! let orders = operation
//!     .run(&|notification| store.dispatch(notification), &|| store.entities())
//!     .await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// Configuration, processor hooks and the configuration validator
pub mod config;

/// Error types for the life cycle
pub mod error;

/// The life-cycle coordinator (`start` / `StoreOperation`)
pub mod lifecycle;

/// Notification vocabulary shared by the coordinator and the reducer
pub mod notification;

/// State reducer and the `Reducer` trait
pub mod reducer;

/// Entity state model
pub mod state;

/// Environment module - Dependency injection traits
///
/// All time-dependent behavior of the coordinator goes through [`Clock`],
/// so tests can pin `last_updated` to a known instant.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

pub use config::{Configuration, IntoConfiguration, ProcessorStage, Processors, validate};
pub use environment::{Clock, SystemClock};
pub use error::{ConfigError, FetchError, HookError, LifecycleError};
pub use lifecycle::{HookContext, StoreOperation, start};
pub use notification::{AsNotification, Notification, NotificationKind, delete, reset};
pub use reducer::{
    AppendPolicy, Concatenate, EntityReducer, Reducer, Replace, derive_new_data, fold, fold_entity,
    fold_entity_with, fold_with,
};
pub use state::{Appendable, EntityCollection, EntityState};
