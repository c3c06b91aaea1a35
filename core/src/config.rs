//! Per-invocation configuration
//!
//! A [`Configuration`] is built fresh for every `start` call and moved into
//! the resulting `StoreOperation`. There is no shared defaults object.
//!
//! # Example
//!
//! ```ignore
//! let config = Configuration::new()
//!     .with_append(true)
//!     .with_before_success(|page: Vec<Order>, _ctx| Ok(page.into_iter().filter(Order::is_open).collect()))
//!     .with_after_failure(|error, ctx| {
//!         ctx.dispatch(reset("order-details", None));
//!         Ok(())
//!     });
//! ```
//!
//! Declarative configuration (flags only) can be validated from JSON:
//!
//! ```ignore
//! let config = Configuration::from_value(&json!({ "silent": true }))?;
//! ```

use crate::error::{ConfigError, HookError};
use crate::lifecycle::HookContext;
use serde_json::{Map, Value};
use std::str::FromStr;

/// The four points in the life cycle where a processor can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorStage {
    /// Before `Success` is dispatched; may replace the data
    BeforeSuccess,
    /// After `Success` is dispatched; observes the data
    AfterSuccess,
    /// Before `Failure` is dispatched; may replace the error
    BeforeFailure,
    /// After `Failure` is dispatched; observes the error
    AfterFailure,
}

impl ProcessorStage {
    /// All stages in life-cycle order
    pub const ALL: [Self; 4] = [
        Self::BeforeSuccess,
        Self::AfterSuccess,
        Self::BeforeFailure,
        Self::AfterFailure,
    ];

    /// Configuration key for this stage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeSuccess => "beforeSuccess",
            Self::AfterSuccess => "afterSuccess",
            Self::BeforeFailure => "beforeFailure",
            Self::AfterFailure => "afterFailure",
        }
    }
}

impl std::fmt::Display for ProcessorStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorStage {
    type Err = ConfigError;

    /// Accepts the configuration key (`beforeSuccess`) or its snake_case form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeSuccess" | "before_success" => Ok(Self::BeforeSuccess),
            "afterSuccess" | "after_success" => Ok(Self::AfterSuccess),
            "beforeFailure" | "before_failure" => Ok(Self::BeforeFailure),
            "afterFailure" | "after_failure" => Ok(Self::AfterFailure),
            other => Err(ConfigError::UnknownProcessorStage {
                stage: other.to_string(),
            }),
        }
    }
}

/// Hook that may replace a value (`before_success`, `before_failure`)
pub type TransformHook<V, T, E> =
    Box<dyn Fn(V, &HookContext<'_, T, E>) -> Result<V, HookError> + Send + Sync>;

/// Hook that observes a value (`after_success`, `after_failure`)
pub type ObserveHook<V, T, E> =
    Box<dyn Fn(&V, &HookContext<'_, T, E>) -> Result<(), HookError> + Send + Sync>;

/// One optional hook per [`ProcessorStage`]
///
/// An absent hook is a no-op for its stage.
pub struct Processors<T, E> {
    /// Replaces the resolved data before `Success` is dispatched
    pub before_success: Option<TransformHook<T, T, E>>,
    /// Runs after `Success` is dispatched
    pub after_success: Option<ObserveHook<T, T, E>>,
    /// Replaces the rejection value before `Failure` is dispatched
    pub before_failure: Option<TransformHook<E, T, E>>,
    /// Runs after `Failure` is dispatched
    pub after_failure: Option<ObserveHook<E, T, E>>,
}

impl<T, E> Processors<T, E> {
    /// No hook at any stage
    #[must_use]
    pub const fn new() -> Self {
        Self {
            before_success: None,
            after_success: None,
            before_failure: None,
            after_failure: None,
        }
    }

    /// Whether a hook is configured for `stage`
    #[must_use]
    pub const fn is_configured(&self, stage: ProcessorStage) -> bool {
        match stage {
            ProcessorStage::BeforeSuccess => self.before_success.is_some(),
            ProcessorStage::AfterSuccess => self.after_success.is_some(),
            ProcessorStage::BeforeFailure => self.before_failure.is_some(),
            ProcessorStage::AfterFailure => self.after_failure.is_some(),
        }
    }

    /// Stages with a configured hook, in life-cycle order
    #[must_use]
    pub fn configured_stages(&self) -> Vec<ProcessorStage> {
        ProcessorStage::ALL
            .into_iter()
            .filter(|stage| self.is_configured(*stage))
            .collect()
    }
}

impl<T, E> Default for Processors<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Processors<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.configured_stages()).finish()
    }
}

/// Configuration for one life-cycle invocation
///
/// Defaults: not silent, overwrite (not append), no processors.
pub struct Configuration<T, E> {
    silent: bool,
    append: bool,
    processors: Processors<T, E>,
}

impl<T, E> Configuration<T, E> {
    /// Create a configuration with default settings
    #[must_use]
    pub const fn new() -> Self {
        Self {
            silent: false,
            append: false,
            processors: Processors::new(),
        }
    }

    /// Validate a declarative configuration and read its flags
    ///
    /// Processors cannot be expressed declaratively; register them with the
    /// `with_*` builders on the returned value.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] reported by [`validate`].
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        validate(value)?;

        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);

        Ok(Self::new()
            .with_silent(flag("silent"))
            .with_append(flag("append")))
    }

    /// Suppress the `Request` notification
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Append `Success` data onto existing data instead of overwriting it
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Set the hook that may replace resolved data before `Success`
    #[must_use]
    pub fn with_before_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(T, &HookContext<'_, T, E>) -> Result<T, HookError> + Send + Sync + 'static,
    {
        self.processors.before_success = Some(Box::new(hook));
        self
    }

    /// Set the hook that runs after `Success`
    #[must_use]
    pub fn with_after_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T, &HookContext<'_, T, E>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.processors.after_success = Some(Box::new(hook));
        self
    }

    /// Set the hook that may replace the rejection value before `Failure`
    #[must_use]
    pub fn with_before_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(E, &HookContext<'_, T, E>) -> Result<E, HookError> + Send + Sync + 'static,
    {
        self.processors.before_failure = Some(Box::new(hook));
        self
    }

    /// Set the hook that runs after `Failure`
    #[must_use]
    pub fn with_after_failure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&E, &HookContext<'_, T, E>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.processors.after_failure = Some(Box::new(hook));
        self
    }

    /// Replace all processors at once
    #[must_use]
    pub fn with_processors(mut self, processors: Processors<T, E>) -> Self {
        self.processors = processors;
        self
    }

    /// Whether the `Request` notification is suppressed
    #[must_use]
    pub const fn silent(&self) -> bool {
        self.silent
    }

    /// Whether `Success` data is appended
    #[must_use]
    pub const fn append(&self) -> bool {
        self.append
    }

    /// The configured processors
    #[must_use]
    pub const fn processors(&self) -> &Processors<T, E> {
        &self.processors
    }
}

impl<T, E> Default for Configuration<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Configuration<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("silent", &self.silent)
            .field("append", &self.append)
            .field("processors", &self.processors)
            .finish()
    }
}

/// Validate a declarative configuration
///
/// `null` is valid and means "all defaults". Otherwise the value must be an
/// object whose only keys are `silent` and `append` (booleans) and
/// `processors` (an object keyed by stage name). A key holding `null` is
/// present: it fails the same check as any other wrong value.
///
/// # Errors
///
/// - [`ConfigError::NotAnObject`]: not an object
/// - [`ConfigError::UnknownKey`]: key other than `silent`, `append`, `processors`
/// - [`ConfigError::NotBoolean`]: `silent`/`append` is not a boolean
/// - [`ConfigError::ProcessorsNotAnObject`]: `processors` is not an object
/// - [`ConfigError::UnknownProcessorStage`]: unknown key inside `processors`
/// - [`ConfigError::NotCallable`]: a stage holds a JSON value, which is never callable
pub fn validate(value: &Value) -> Result<(), ConfigError> {
    let options = match value {
        Value::Null => return Ok(()),
        Value::Object(options) => options,
        _ => return Err(ConfigError::NotAnObject),
    };

    for (key, value) in options {
        match key.as_str() {
            "silent" | "append" => {
                if !value.is_boolean() {
                    return Err(ConfigError::NotBoolean { key: key.clone() });
                }
            },
            "processors" => match value {
                Value::Object(processors) => validate_processors(processors)?,
                _ => return Err(ConfigError::ProcessorsNotAnObject),
            },
            _ => return Err(ConfigError::UnknownKey { key: key.clone() }),
        }
    }

    Ok(())
}

fn validate_processors(processors: &Map<String, Value>) -> Result<(), ConfigError> {
    let stages = processors
        .keys()
        .map(|name| name.parse::<ProcessorStage>())
        .collect::<Result<Vec<_>, _>>()?;

    // A declarative stage value can only be data, never a callable
    match stages.first() {
        Some(&stage) => Err(ConfigError::NotCallable { stage }),
        None => Ok(()),
    }
}

/// Conversion into a validated [`Configuration`]
///
/// Lets `start` accept `()` for defaults, a built `Configuration`, an
/// optional one, or declarative JSON that still has to pass [`validate`].
pub trait IntoConfiguration<T, E> {
    /// Convert, validating where the source is untyped
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source fails validation.
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError>;
}

impl<T, E> IntoConfiguration<T, E> for () {
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError> {
        Ok(Configuration::new())
    }
}

impl<T, E> IntoConfiguration<T, E> for Configuration<T, E> {
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError> {
        Ok(self)
    }
}

impl<T, E> IntoConfiguration<T, E> for Option<Configuration<T, E>> {
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError> {
        Ok(self.unwrap_or_default())
    }
}

impl<T, E> IntoConfiguration<T, E> for &Value {
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError> {
        Configuration::from_value(self)
    }
}

impl<T, E> IntoConfiguration<T, E> for Value {
    fn into_configuration(self) -> Result<Configuration<T, E>, ConfigError> {
        Configuration::from_value(&self)
    }
}
