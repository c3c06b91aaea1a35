//! # Entity Lifecycle Testing
//!
//! Testing utilities and helpers for the entity life-cycle crates.
//!
//! This crate provides:
//! - A deterministic [`Clock`] for reproducible `last_updated` timestamps
//! - [`TestStore`], a recording host store driven by any [`Reducer`](entity_lifecycle_core::Reducer)
//! - [`ReducerTest`], a Given-When-Then builder for reducer assertions
//! - A tracing initializer for test output
//!
//! ## Example
//!
//! ```
//! use entity_lifecycle_core::{NotificationKind, start};
//! use entity_lifecycle_testing::{TestStore, test_clock};
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = TestStore::<entity_lifecycle_core::EntityReducer<Value, String>>::entities();
//! let dispatch = store.dispatcher();
//! let get_state = store.state_reader();
//!
//! let op = start("orders", async { Ok::<_, String>(json!([1, 2])) }, ())
//!     .unwrap()
//!     .with_clock(Arc::new(test_clock()));
//! op.run(&dispatch, &get_state).await.unwrap();
//!
//! assert_eq!(store.kinds(), vec![NotificationKind::Request, NotificationKind::Success]);
//! # });
//! ```

use chrono::{DateTime, Utc};
use entity_lifecycle_core::environment::Clock;

pub mod test_store;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use entity_lifecycle_testing::mocks::FixedClock;
    /// use entity_lifecycle_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a `fmt` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG` and defaults to `entity_lifecycle_core=debug`. Safe to
    /// call from every test; only the first call installs a subscriber.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("entity_lifecycle_core=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_tracing;
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
pub use test_store::TestStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_init_tracing_is_repeatable() {
        init_tracing();
        init_tracing();
    }
}
