//! Life-cycle coordinator
//!
//! [`start`] validates its arguments and packages one fetch attempt into a
//! [`StoreOperation`]. Running the operation against a host store's dispatch
//! and state-read functions produces the notification sequence:
//!
//! ```text
//! Request (unless silent)
//!   └─ await operation ─┬─ Ok(data)   → before_success → Success → after_success
//!                       └─ Err(error) → before_failure → Failure → after_failure
//! ```
//!
//! # Example
//!
//! ```ignore
//! let operation = start("orders", api.list_orders(), Configuration::new())?;
//!
//! match operation.run(&|n| store.dispatch(n), &|| store.entities()).await {
//!     Ok(orders) => render(orders),
//!     Err(FetchError::Operation(error)) => show_error(error),
//!     Err(hook_failure) => return Err(hook_failure.into()),
//! }
//! ```

use crate::config::{Configuration, IntoConfiguration, ProcessorStage};
use crate::environment::{Clock, SystemClock};
use crate::error::{FetchError, HookError, LifecycleError};
use crate::notification::Notification;
use crate::state::EntityCollection;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Capabilities handed to processor hooks
///
/// Hooks may dispatch additional notifications (delivered in call order,
/// before the notification that follows the hook) and read the host's
/// current entity collection.
pub struct HookContext<'a, T, E> {
    entity: &'a str,
    dispatch: &'a (dyn Fn(Notification<T, E>) + Sync),
    get_state: &'a (dyn Fn() -> EntityCollection<T, E> + Sync),
}

impl<'a, T, E> HookContext<'a, T, E> {
    /// Build a context from a host's dispatch and state-read functions
    #[must_use]
    pub const fn new(
        entity: &'a str,
        dispatch: &'a (dyn Fn(Notification<T, E>) + Sync),
        get_state: &'a (dyn Fn() -> EntityCollection<T, E> + Sync),
    ) -> Self {
        Self {
            entity,
            dispatch,
            get_state,
        }
    }

    /// Entity the running life cycle belongs to
    #[must_use]
    pub const fn entity(&self) -> &str {
        self.entity
    }

    /// Dispatch a notification through the host store
    pub fn dispatch(&self, notification: Notification<T, E>) {
        (self.dispatch)(notification);
    }

    /// Current entity collection of the host store
    #[must_use]
    pub fn state(&self) -> EntityCollection<T, E> {
        (self.get_state)()
    }
}

impl<T, E> std::fmt::Debug for HookContext<'_, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookContext")
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

/// Deferred life cycle of one fetch attempt
///
/// Created by [`start`]. Nothing is dispatched until [`run`](Self::run) is
/// called with the host's dispatch and state-read functions.
pub struct StoreOperation<T, E> {
    entity: String,
    configuration: Configuration<T, E>,
    operation: BoxFuture<'static, Result<T, E>>,
    clock: Arc<dyn Clock>,
}

/// Begin the life cycle of `entity` for a pending `operation`
///
/// Arguments are checked eagerly; on success the returned [`StoreOperation`]
/// performs the life cycle when run.
///
/// # Arguments
///
/// - `entity`: Name of the entity; must be non-empty
/// - `operation`: Already-constructed future producing the entity's data
/// - `configuration`: `()`, a [`Configuration`], `Option<Configuration>` or declarative JSON
///
/// # Errors
///
/// - [`LifecycleError::InvalidArgument`] if `entity` is empty
/// - [`LifecycleError::InvalidConfiguration`] if the configuration fails validation
pub fn start<T, E, F, C>(
    entity: impl Into<String>,
    operation: F,
    configuration: C,
) -> Result<StoreOperation<T, E>, LifecycleError>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    C: IntoConfiguration<T, E>,
{
    let entity = entity.into();
    if entity.is_empty() {
        return Err(LifecycleError::InvalidArgument {
            reason: "entity name must be a non-empty string".to_string(),
        });
    }

    let configuration = configuration.into_configuration()?;

    Ok(StoreOperation {
        entity,
        configuration,
        operation: operation.boxed(),
        clock: Arc::new(SystemClock),
    })
}

impl<T, E> StoreOperation<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Use `clock` for the `last_updated` timestamps of terminal notifications
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Entity this operation belongs to
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Configuration captured at `start`
    #[must_use]
    pub const fn configuration(&self) -> &Configuration<T, E> {
        &self.configuration
    }

    /// Run the life cycle against a host store
    ///
    /// The `Request` notification (unless silent) is dispatched before this
    /// method returns, so it precedes anything the returned future does. The
    /// future awaits the operation once, then runs the success or failure
    /// branch.
    ///
    /// # Errors
    ///
    /// The future resolves to:
    /// - [`FetchError::Operation`] with the (possibly `before_failure`-replaced)
    ///   rejection value, after `Failure` was dispatched
    /// - [`FetchError::Hook`] if a processor failed; the steps after that
    ///   processor are skipped
    pub fn run<'a, D, G>(
        self,
        dispatch: &'a D,
        get_state: &'a G,
    ) -> impl Future<Output = Result<T, FetchError<E>>> + Send + 'a
    where
        D: Fn(Notification<T, E>) + Sync,
        G: Fn() -> EntityCollection<T, E> + Sync,
    {
        let dispatch: &'a (dyn Fn(Notification<T, E>) + Sync) = dispatch;
        let get_state: &'a (dyn Fn() -> EntityCollection<T, E> + Sync) = get_state;
        let Self {
            entity,
            configuration,
            operation,
            clock,
        } = self;

        tracing::debug!(
            entity = %entity,
            silent = configuration.silent(),
            append = configuration.append(),
            processors = ?configuration.processors(),
            "Starting entity fetch"
        );

        if !configuration.silent() {
            emit(dispatch, Notification::request(entity.clone()));
        }

        async move {
            let outcome = operation.await;
            let ctx = HookContext::new(&entity, dispatch, get_state);

            let settled = match outcome {
                Ok(data) => resolve_success(&ctx, &configuration, clock.as_ref(), data),
                Err(error) => {
                    resolve_failure(&ctx, &configuration, clock.as_ref(), error)
                },
            };

            let outcome_label = match &settled {
                Ok(_) => "success",
                Err(FetchError::Operation(_)) => "failure",
                Err(FetchError::Hook { .. }) => "hook_failure",
            };
            metrics::counter!("entity_lifecycle.operations.settled", "outcome" => outcome_label)
                .increment(1);
            tracing::debug!(entity = %entity, outcome = outcome_label, "Entity fetch settled");

            settled
        }
    }
}

impl<T, E> std::fmt::Debug for StoreOperation<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOperation")
            .field("entity", &self.entity)
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

/// Success branch: `before_success` → `Success` → `after_success`
fn resolve_success<T, E>(
    ctx: &HookContext<'_, T, E>,
    configuration: &Configuration<T, E>,
    clock: &dyn Clock,
    data: T,
) -> Result<T, FetchError<E>>
where
    T: Clone,
{
    let processors = configuration.processors();

    let data = match &processors.before_success {
        Some(hook) => {
            tracing::trace!(entity = ctx.entity(), "Running beforeSuccess processor");
            hook(data, ctx).map_err(|source| hook_failure(ctx, ProcessorStage::BeforeSuccess, source))?
        },
        None => data,
    };

    emit(
        ctx.dispatch,
        Notification::success(ctx.entity(), data.clone(), clock.now(), configuration.append()),
    );

    if let Some(hook) = &processors.after_success {
        tracing::trace!(entity = ctx.entity(), "Running afterSuccess processor");
        hook(&data, ctx).map_err(|source| hook_failure(ctx, ProcessorStage::AfterSuccess, source))?;
    }

    Ok(data)
}

/// Failure branch: `before_failure` → `Failure` → `after_failure`
fn resolve_failure<T, E>(
    ctx: &HookContext<'_, T, E>,
    configuration: &Configuration<T, E>,
    clock: &dyn Clock,
    error: E,
) -> Result<T, FetchError<E>>
where
    E: Clone,
{
    let processors = configuration.processors();

    let error = match &processors.before_failure {
        Some(hook) => {
            tracing::trace!(entity = ctx.entity(), "Running beforeFailure processor");
            hook(error, ctx).map_err(|source| hook_failure(ctx, ProcessorStage::BeforeFailure, source))?
        },
        None => error,
    };

    emit(
        ctx.dispatch,
        Notification::failure(ctx.entity(), error.clone(), clock.now()),
    );

    if let Some(hook) = &processors.after_failure {
        tracing::trace!(entity = ctx.entity(), "Running afterFailure processor");
        hook(&error, ctx).map_err(|source| hook_failure(ctx, ProcessorStage::AfterFailure, source))?;
    }

    Err(FetchError::Operation(error))
}

/// Dispatch a coordinator-produced notification
fn emit<T, E>(dispatch: &(dyn Fn(Notification<T, E>) + Sync), notification: Notification<T, E>) {
    let kind = notification.kind();
    tracing::debug!(entity = notification.entity(), kind = %kind, "Dispatching notification");
    metrics::counter!("entity_lifecycle.notifications.dispatched", "kind" => kind.as_str())
        .increment(1);
    dispatch(notification);
}

fn hook_failure<T, E>(
    ctx: &HookContext<'_, T, E>,
    stage: ProcessorStage,
    source: HookError,
) -> FetchError<E> {
    tracing::debug!(entity = ctx.entity(), stage = %stage, error = %source, "Processor failed");
    FetchError::Hook { stage, source }
}
