//! Error types for the entity life cycle
//!
//! Two families:
//! - Programmer errors ([`LifecycleError`], [`ConfigError`]) are returned
//!   synchronously from [`start`](crate::lifecycle::start), before any
//!   notification is dispatched.
//! - Runtime errors ([`FetchError`]) are the outcome of the deferred
//!   [`StoreOperation`](crate::lifecycle::StoreOperation) future.

use crate::config::ProcessorStage;
use thiserror::Error;

/// Error a processor hook may fail with
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned synchronously by `start`
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// An argument violated its precondition (e.g. empty entity name)
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Which precondition failed
        reason: String,
    },

    /// The configuration was rejected by the validator
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// Reasons the configuration validator rejects a configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration is not a plain object
    #[error("configuration must be an object")]
    NotAnObject,

    /// Unrecognized top-level key
    #[error("unknown configuration key `{key}` (expected `silent`, `append` or `processors`)")]
    UnknownKey {
        /// The offending key
        key: String,
    },

    /// `silent` or `append` is present but not a boolean
    #[error("configuration key `{key}` must be a boolean")]
    NotBoolean {
        /// The offending key
        key: String,
    },

    /// `processors` is present but not an object
    #[error("`processors` must be an object")]
    ProcessorsNotAnObject,

    /// Unrecognized processor stage name
    #[error("unknown processor stage `{stage}`")]
    UnknownProcessorStage {
        /// The offending stage name
        stage: String,
    },

    /// A recognized processor stage holds something that is not callable
    #[error("processor `{stage}` must be a function")]
    NotCallable {
        /// The stage holding the non-callable value
        stage: ProcessorStage,
    },
}

/// Errors produced by a running `StoreOperation`
///
/// # Type Parameters
///
/// - `E`: The rejection type of the fetched operation
#[derive(Error, Debug)]
pub enum FetchError<E> {
    /// The operation rejected (after `before_failure` processing)
    ///
    /// A `Failure` notification carrying the same error was dispatched.
    #[error("Operation failed: {0}")]
    Operation(E),

    /// A processor hook failed; the remaining life-cycle steps were skipped
    #[error("Processor `{stage}` failed: {source}")]
    Hook {
        /// Stage of the failing hook
        stage: ProcessorStage,
        /// Error returned by the hook
        #[source]
        source: HookError,
    },
}

impl<E> FetchError<E> {
    /// The operation's rejection value, if this is an operation failure
    #[must_use]
    pub const fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Hook { .. } => None,
        }
    }

    /// Consume the error, returning the operation's rejection value if any
    #[must_use]
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(error) => Some(error),
            Self::Hook { .. } => None,
        }
    }

    /// Stage of the failing hook, if a hook failed
    #[must_use]
    pub const fn hook_stage(&self) -> Option<ProcessorStage> {
        match self {
            Self::Operation(_) => None,
            Self::Hook { stage, .. } => Some(*stage),
        }
    }
}
