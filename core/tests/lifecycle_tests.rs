//! Integration tests for the entity life cycle against a recording host store
//!
//! Every test drives `start(..).run(..)` through `TestStore`, which folds each
//! notification with `EntityReducer` exactly like a host store would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use entity_lifecycle_core::{
    AsNotification, Clock, ConfigError, Configuration, EntityReducer, EntityState, FetchError,
    LifecycleError, Notification, NotificationKind, ProcessorStage, Replace, delete, reset, start,
};
use entity_lifecycle_testing::{FixedClock, TestStore, init_tracing, test_clock};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::oneshot;

type Store = TestStore<EntityReducer<Value, String>>;

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_orders_success_scenario() {
    init_tracing();
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();
    let clock = test_clock();

    let op = start(
        "orders",
        async { Ok::<_, String>(json!({"id": 1})) },
        Configuration::new().with_append(false),
    )
    .unwrap()
    .with_clock(Arc::new(clock.clone()));

    let data = op.run(&dispatch, &get_state).await.unwrap();

    assert_eq!(data, json!({"id": 1}));
    assert_eq!(
        store.kinds(),
        vec![NotificationKind::Request, NotificationKind::Success]
    );
    assert_eq!(
        store.state().get("orders"),
        Some(&EntityState {
            data: Some(json!({"id": 1})),
            is_fetching: false,
            last_updated: Some(clock.now()),
            error: None,
        })
    );
}

#[tokio::test]
async fn test_orders_failure_scenario() {
    init_tracing();
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let op = start("orders", async { Err::<Value, _>("boom".to_string()) }, ())
        .unwrap()
        .with_clock(Arc::new(test_clock()));

    let err = op.run(&dispatch, &get_state).await.unwrap_err();

    assert_eq!(err.operation_error().map(String::as_str), Some("boom"));
    assert_eq!(
        store.kinds(),
        vec![NotificationKind::Request, NotificationKind::Failure]
    );

    let orders = store.state().get("orders").cloned().unwrap();
    assert_eq!(orders.data, None);
    assert_eq!(orders.error.as_deref(), Some("boom"));
    assert!(!orders.is_fetching);
}

#[tokio::test]
async fn test_before_success_keys_scenario() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let configuration = Configuration::new().with_before_success(|data: Value, _ctx| {
        let keys: Vec<Value> = data
            .as_object()
            .map(|object| object.keys().cloned().map(Value::String).collect())
            .unwrap_or_default();
        Ok(Value::Array(keys))
    });

    let op = start(
        "orders",
        async { Ok::<_, String>(json!({"a": 1, "b": 2})) },
        configuration,
    )
    .unwrap();

    let data = op.run(&dispatch, &get_state).await.unwrap();

    assert_eq!(data, json!(["a", "b"]));
    match store.notifications().last() {
        Some(Notification::Success { data, .. }) => assert_eq!(data, &json!(["a", "b"])),
        other => panic!("expected Success, got {other:?}"),
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_silent_failure_emits_only_failure() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let op = start(
        "orders",
        async { Err::<Value, _>("offline".to_string()) },
        Configuration::new().with_silent(true),
    )
    .unwrap();

    let _ = op.run(&dispatch, &get_state).await;

    assert_eq!(store.kinds(), vec![NotificationKind::Failure]);
}

#[tokio::test]
async fn test_declarative_configuration() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let first = start("feed", async { Ok::<_, String>(json!(["a"])) }, ()).unwrap();
    first.run(&dispatch, &get_state).await.unwrap();

    let config = json!({"silent": true, "append": true, "processors": {}});
    let second = start("feed", async { Ok::<_, String>(json!(["b"])) }, &config).unwrap();
    second.run(&dispatch, &get_state).await.unwrap();

    assert_eq!(
        store.kinds(),
        vec![
            NotificationKind::Request,
            NotificationKind::Success,
            NotificationKind::Success,
        ]
    );
    assert_eq!(
        store.state().get("feed").and_then(|s| s.data.clone()),
        Some(json!(["a", "b"]))
    );
}

#[test]
fn test_invalid_configuration_dispatches_nothing() {
    let store = Store::entities();

    let result = start::<Value, String, _, _>(
        "orders",
        async { Ok(json!(null)) },
        &json!({"processors": {"onRetry": null}}),
    );

    assert!(matches!(
        result,
        Err(LifecycleError::InvalidConfiguration(ConfigError::UnknownProcessorStage { ref stage }))
            if stage == "onRetry"
    ));
    assert!(store.actions().is_empty());
}

// ============================================================================
// Processors
// ============================================================================

#[tokio::test]
async fn test_before_failure_replacement_is_consistent() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let configuration = Configuration::new()
        .with_before_failure(|error: String, _ctx| Ok(format!("orders unavailable: {error}")))
        .with_after_failure(|error: &String, ctx| {
            let folded = ctx.state().get(ctx.entity()).and_then(|s| s.error.clone());
            if folded.as_ref() == Some(error) {
                Ok(())
            } else {
                Err(format!("folded error {folded:?} differs from {error}").into())
            }
        });

    let op = start("orders", async { Err::<Value, _>("503".to_string()) }, configuration).unwrap();
    let err = op.run(&dispatch, &get_state).await.unwrap_err();

    assert_eq!(
        err.into_operation_error().as_deref(),
        Some("orders unavailable: 503")
    );
    assert_eq!(
        store.state().get("orders").and_then(|s| s.error.clone()).as_deref(),
        Some("orders unavailable: 503")
    );
}

#[tokio::test]
async fn test_hook_may_dispatch_for_other_entities() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();
    let now = test_clock().now();

    let configuration = Configuration::new().with_after_success(move |_data: &Value, ctx| {
        ctx.dispatch(reset("order_details", Some(now)));
        ctx.dispatch(delete("stale_cart"));
        Ok(())
    });

    store.dispatch(Notification::success("stale_cart", json!([1]), now, false));

    let op = start("orders", async { Ok::<_, String>(json!([1, 2])) }, configuration).unwrap();
    op.run(&dispatch, &get_state).await.unwrap();

    assert_eq!(
        store.kinds(),
        vec![
            NotificationKind::Success,
            NotificationKind::Request,
            NotificationKind::Success,
            NotificationKind::Reset,
            NotificationKind::Delete,
        ]
    );

    let state = store.state();
    assert_eq!(state.names(), vec!["order_details", "orders"]);
    assert_eq!(
        state.get("order_details").and_then(|s| s.last_updated),
        Some(now)
    );
}

#[tokio::test]
async fn test_failing_after_success_keeps_success() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let configuration =
        Configuration::new().with_after_success(|_data: &Value, _ctx| Err("analytics down".into()));

    let op = start("orders", async { Ok::<_, String>(json!([1])) }, configuration).unwrap();
    let err = op.run(&dispatch, &get_state).await.unwrap_err();

    assert_eq!(err.hook_stage(), Some(ProcessorStage::AfterSuccess));
    assert!(matches!(err, FetchError::Hook { .. }));
    assert_eq!(
        store.kinds(),
        vec![NotificationKind::Request, NotificationKind::Success]
    );
    assert_eq!(
        store.state().get("orders").and_then(|s| s.data.clone()),
        Some(json!([1]))
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_same_entity_last_settle_wins() {
    let store = Store::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();
    let base = test_clock().now();

    let (first_tx, first_rx) = oneshot::channel::<Value>();
    let (second_tx, second_rx) = oneshot::channel::<Value>();

    let first = start("foo", async move { first_rx.await.map_err(|e| e.to_string()) }, ())
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(base + Duration::seconds(2))));
    let second = start("foo", async move { second_rx.await.map_err(|e| e.to_string()) }, ())
        .unwrap()
        .with_clock(Arc::new(FixedClock::new(base + Duration::seconds(1))));

    let first = first.run(&dispatch, &get_state);
    let second = second.run(&dispatch, &get_state);

    // Both requests are out before either operation settles
    assert_eq!(
        store.kinds(),
        vec![NotificationKind::Request, NotificationKind::Request]
    );

    second_tx.send(json!("second")).unwrap();
    second.await.unwrap();
    first_tx.send(json!("first")).unwrap();
    first.await.unwrap();

    let foo = store.state().get("foo").cloned().unwrap();
    assert_eq!(foo.data, Some(json!("first")));
    assert_eq!(foo.last_updated, Some(base + Duration::seconds(2)));
    assert!(!foo.is_fetching);
}

#[tokio::test]
async fn test_concurrent_entities_are_independent() {
    let store = Arc::new(Store::entities());
    let entities = ["orders", "users", "carts", "invoices"];

    let handles: Vec<_> = entities
        .iter()
        .enumerate()
        .map(|(i, entity)| {
            let store = Arc::clone(&store);
            let op = start(
                *entity,
                async move {
                    tokio::task::yield_now().await;
                    if i % 2 == 0 { Ok(json!(i)) } else { Err(format!("{i} failed")) }
                },
                (),
            )
            .unwrap();

            tokio::spawn(async move {
                let dispatch = store.dispatcher();
                let get_state = store.state_reader();
                op.run(&dispatch, &get_state).await
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.await.unwrap();
    }

    let notifications = store.notifications();
    for entity in entities {
        let kinds: Vec<_> = notifications
            .iter()
            .filter(|n| n.entity() == entity)
            .map(Notification::kind)
            .collect();
        assert_eq!(kinds.len(), 2, "{entity}: {kinds:?}");
        assert_eq!(kinds[0], NotificationKind::Request);
        assert!(kinds[1].is_terminal());
    }

    let state = store.state();
    assert_eq!(state.len(), entities.len());
    assert!(state.iter().all(|(_, s)| !s.is_fetching));
    assert_eq!(state.get("orders").and_then(|s| s.data.clone()), Some(json!(0)));
    assert_eq!(
        state.get("users").and_then(|s| s.error.clone()).as_deref(),
        Some("1 failed")
    );
}

// ============================================================================
// Host integration
// ============================================================================

#[derive(Debug, Clone)]
enum AppAction {
    Entity(Notification<Value, String>),
    SidebarToggled,
}

impl AsNotification<Value, String> for AppAction {
    fn as_notification(&self) -> Option<&Notification<Value, String>> {
        match self {
            Self::Entity(notification) => Some(notification),
            Self::SidebarToggled => None,
        }
    }
}

#[tokio::test]
async fn test_host_action_enum() {
    let store = TestStore::<EntityReducer<Value, String, AppAction>>::entities();
    let dispatch = |notification| store.dispatch(AppAction::Entity(notification));
    let get_state = store.state_reader();

    store.dispatch(AppAction::SidebarToggled);

    let op = start(
        "orders",
        async { Ok::<_, String>(json!([1])) },
        Configuration::new(),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock::new(Utc::now())));
    op.run(&dispatch, &get_state).await.unwrap();

    store.dispatch(AppAction::SidebarToggled);

    assert_eq!(store.actions().len(), 4);
    assert_eq!(
        store.kinds(),
        vec![NotificationKind::Request, NotificationKind::Success]
    );
    assert_eq!(
        store.state().get("orders").and_then(|s| s.data.clone()),
        Some(json!([1]))
    );
}

#[derive(Debug, Clone, PartialEq)]
struct Customer {
    id: u64,
    name: String,
}

#[tokio::test]
async fn test_typed_record_entity() {
    let store = TestStore::<EntityReducer<Customer, String, Notification<Customer, String>, Replace>>::entities();
    let dispatch = store.dispatcher();
    let get_state = store.state_reader();

    let customer = Customer {
        id: 7,
        name: "Ada".to_string(),
    };
    let op = start("customer:7", std::future::ready(Ok::<_, String>(customer.clone())), ())
        .unwrap()
        .with_clock(Arc::new(test_clock()));

    assert_eq!(op.run(&dispatch, &get_state).await.unwrap(), customer);
    assert_eq!(
        store.state().get("customer:7"),
        Some(&EntityState {
            data: Some(customer),
            is_fetching: false,
            last_updated: Some(test_clock().now()),
            error: None,
        })
    );
}
