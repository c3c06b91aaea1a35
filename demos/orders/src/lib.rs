//! # Orders Demo
//!
//! An orders dashboard whose store tracks remote entities with the entity
//! life cycle.
//!
//! This example showcases:
//! - A host state embedding an [`EntityCollection`] next to unrelated UI state
//! - A host action enum that carries life-cycle notifications
//! - Paged loading with append mode and a `before_success` processor
//! - Silent refreshes configured from declarative JSON
//! - `reset` and `delete` for clearing entities
//!
//! ## Example
//!
//! ```no_run
//! use orders_demo::{AppStore, OrdersApi, load_orders};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), orders_demo::LoadError> {
//! let store = AppStore::new();
//! let api = OrdersApi::new(Duration::from_millis(50));
//!
//! load_orders(&store, &api, 1).await?;
//! load_orders(&store, &api, 2).await?;
//!
//! let entities = store.entities();
//! let orders = entities.get("orders").and_then(|s| s.data.clone());
//! assert_eq!(orders.and_then(|d| d.as_array().map(Vec::len)), Some(6));
//! # Ok(())
//! # }
//! ```

use entity_lifecycle_core::{
    AsNotification, Clock, Configuration, EntityCollection, FetchError, HookContext, HookError,
    LifecycleError, Notification, Reducer, SystemClock, delete, fold, reset, start,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Entity holding the loaded order list
pub const ORDERS: &str = "orders";

/// Orders returned per page
pub const PAGE_SIZE: u32 = 3;

/// Entity collection tracked by the dashboard
pub type Entities = EntityCollection<Value, ApiError>;

/// Errors returned by the orders API
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ApiError {
    /// The backend did not answer
    #[error("service unavailable")]
    Unavailable,

    /// The requested resource does not exist
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up
        resource: String,
    },
}

/// Errors returned by the loading helpers
#[derive(Error, Debug)]
pub enum LoadError {
    /// The life cycle could not be started
    #[error(transparent)]
    Start(#[from] LifecycleError),

    /// The fetch or one of its processors failed
    #[error(transparent)]
    Fetch(#[from] FetchError<ApiError>),
}

/// Dashboard state
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Remote entities and their fetch life cycle
    pub entities: Entities,

    /// UI state unrelated to fetching
    pub sidebar_open: bool,
}

/// Dashboard actions
#[derive(Debug, Clone)]
pub enum AppAction {
    /// Life-cycle notification for a remote entity
    Entity(Notification<Value, ApiError>),

    /// Open or close the sidebar
    ToggleSidebar,
}

impl From<Notification<Value, ApiError>> for AppAction {
    fn from(notification: Notification<Value, ApiError>) -> Self {
        Self::Entity(notification)
    }
}

impl AsNotification<Value, ApiError> for AppAction {
    fn as_notification(&self) -> Option<&Notification<Value, ApiError>> {
        match self {
            Self::Entity(notification) => Some(notification),
            Self::ToggleSidebar => None,
        }
    }
}

/// Dashboard reducer
///
/// Entity notifications go through [`fold`]; everything else is UI state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppReducer;

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;

    fn reduce(&self, state: Self::State, action: &Self::Action) -> Self::State {
        match action {
            AppAction::Entity(_) => AppState {
                entities: fold(Some(state.entities), action),
                ..state
            },
            AppAction::ToggleSidebar => AppState {
                sidebar_open: !state.sidebar_open,
                ..state
            },
        }
    }
}

/// Host store for the dashboard
///
/// Cloning shares the same state. Every action is folded under one lock,
/// which serializes notifications coming from concurrent fetches.
#[derive(Clone)]
pub struct AppStore {
    state: Arc<Mutex<AppState>>,
    reducer: AppReducer,
    clock: Arc<dyn Clock>,
}

impl AppStore {
    /// Create a store with empty state and the system clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AppState::default())),
            reducer: AppReducer,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for the timestamps of every fetch started through this store
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fold `action` into the state
    pub fn dispatch(&self, action: impl Into<AppAction>) {
        let action = action.into();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(notification) = action.as_notification() {
            tracing::trace!(entity = notification.entity(), kind = %notification.kind(), "Applying notification");
        }

        let current = std::mem::take(&mut *state);
        *state = self.reducer.reduce(current, &action);
    }

    /// Snapshot of the whole dashboard state
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the entity collection only
    #[must_use]
    pub fn entities(&self) -> Entities {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entities
            .clone()
    }

    /// Clock handed to every fetch
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Simulated orders backend
#[derive(Debug, Clone, Copy)]
pub struct OrdersApi {
    latency: Duration,
    available: bool,
}

impl OrdersApi {
    /// Backend answering after `latency`
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self {
            latency,
            available: true,
        }
    }

    /// Backend that rejects every call with [`ApiError::Unavailable`]
    #[must_use]
    pub const fn offline(self) -> Self {
        Self {
            available: false,
            ..self
        }
    }

    /// One page of orders (`page` starts at 1)
    ///
    /// Answers `{"page": n, "items": [{"id": .., "total": ..}, ..]}`.
    pub fn list_orders(&self, page: u32) -> impl Future<Output = Result<Value, ApiError>> + Send + 'static {
        let Self { latency, available } = *self;

        async move {
            tokio::time::sleep(latency).await;
            if !available {
                return Err(ApiError::Unavailable);
            }

            let first = page.saturating_sub(1).saturating_mul(PAGE_SIZE).saturating_add(1);
            let items: Vec<Value> = (first..first.saturating_add(PAGE_SIZE))
                .map(|id| json!({"id": id, "total": u64::from(id) * 10}))
                .collect();

            Ok(json!({"page": page, "items": items}))
        }
    }

    /// Customer profile; the demo backend knows no customers
    pub fn customer(&self, id: u32) -> impl Future<Output = Result<Value, ApiError>> + Send + 'static {
        let Self { latency, available } = *self;

        async move {
            tokio::time::sleep(latency).await;
            if available {
                Err(ApiError::NotFound {
                    resource: format!("customer {id}"),
                })
            } else {
                Err(ApiError::Unavailable)
            }
        }
    }
}

/// Entity name of a customer profile
#[must_use]
pub fn customer_entity(id: u32) -> String {
    format!("customer:{id}")
}

/// Keep only the `items` of a page payload
fn page_items(payload: Value, _ctx: &HookContext<'_, Value, ApiError>) -> Result<Value, HookError> {
    payload
        .get("items")
        .cloned()
        .ok_or_else(|| "page payload has no `items`".into())
}

/// Load one page of orders into [`ORDERS`]
///
/// Page 1 replaces the list; later pages are appended. Only the page's
/// `items` are stored.
///
/// # Errors
///
/// Returns [`LoadError::Fetch`] if the backend rejects or the payload has no
/// `items`.
pub async fn load_orders(store: &AppStore, api: &OrdersApi, page: u32) -> Result<Value, LoadError> {
    let configuration = Configuration::new()
        .with_append(page > 1)
        .with_before_success(page_items)
        .with_after_success(|items: &Value, ctx| {
            let total = ctx
                .state()
                .get(ctx.entity())
                .and_then(|s| s.data.as_ref().and_then(Value::as_array).map(Vec::len))
                .unwrap_or_default();
            tracing::info!(
                entity = ctx.entity(),
                received = items.as_array().map_or(0, Vec::len),
                total,
                "Orders page loaded"
            );
            Ok(())
        });

    let operation = start(ORDERS, api.list_orders(page), configuration)?.with_clock(store.clock());

    let dispatch = |notification| store.dispatch(AppAction::Entity(notification));
    let get_state = || store.entities();
    Ok(operation.run(&dispatch, &get_state).await?)
}

/// Reload the first page without flagging the list as fetching
///
/// # Errors
///
/// Returns [`LoadError::Fetch`] if the backend rejects.
pub async fn refresh_orders(store: &AppStore, api: &OrdersApi) -> Result<Value, LoadError> {
    let configuration = Configuration::from_value(&json!({"silent": true}))
        .map_err(LifecycleError::from)?
        .with_before_success(page_items);

    let operation = start(ORDERS, api.list_orders(1), configuration)?.with_clock(store.clock());

    let dispatch = |notification| store.dispatch(AppAction::Entity(notification));
    let get_state = || store.entities();
    Ok(operation.run(&dispatch, &get_state).await?)
}

/// Load a customer profile into [`customer_entity`]
///
/// A missing customer is logged and stored as the entity's error.
///
/// # Errors
///
/// Returns [`LoadError::Fetch`] if the backend rejects.
pub async fn load_customer(store: &AppStore, api: &OrdersApi, id: u32) -> Result<Value, LoadError> {
    let configuration = Configuration::new().with_after_failure(|error: &ApiError, ctx| {
        tracing::warn!(entity = ctx.entity(), %error, "Customer unavailable");
        Ok(())
    });

    let operation =
        start(customer_entity(id), api.customer(id), configuration)?.with_clock(store.clock());

    let dispatch = |notification| store.dispatch(AppAction::Entity(notification));
    let get_state = || store.entities();
    Ok(operation.run(&dispatch, &get_state).await?)
}

/// Return [`ORDERS`] to its initial state, stamped with the store's clock
pub fn clear_orders(store: &AppStore) {
    store.dispatch(reset::<Value, ApiError>(ORDERS, Some(store.clock().now())));
}

/// Stop tracking `entity`
pub fn forget(store: &AppStore, entity: &str) {
    store.dispatch(delete::<Value, ApiError>(entity));
}
