//! Orders demo binary
//!
//! Walks an orders dashboard through paged loading, a silent refresh, a
//! failing lookup and clean-up, printing the store after each step.

use orders_demo::{
    AppAction, AppStore, OrdersApi, clear_orders, customer_entity, forget, load_customer,
    load_orders, refresh_orders,
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_state(store: &AppStore) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&store.state())?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orders_demo=debug,entity_lifecycle_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Orders Demo: Entity Life Cycle ===\n");

    let store = AppStore::new();
    let api = OrdersApi::new(Duration::from_millis(100));

    println!(">>> Loading page 1");
    let page = load_orders(&store, &api, 1).await?;
    println!("Received {page}");
    print_state(&store)?;

    println!("\n>>> Appending page 2");
    load_orders(&store, &api, 2).await?;
    print_state(&store)?;

    println!("\n>>> Toggling the sidebar (not an entity action)");
    store.dispatch(AppAction::ToggleSidebar);
    print_state(&store)?;

    println!("\n>>> Silent refresh");
    refresh_orders(&store, &api).await?;
    print_state(&store)?;

    println!("\n>>> Loading customer 7 (unknown to the backend)");
    if let Err(error) = load_customer(&store, &api, 7).await {
        println!("Lookup failed: {error}");
    }
    print_state(&store)?;

    println!("\n>>> Loading page 1 while the backend is offline");
    if let Err(error) = load_orders(&store, &api.offline(), 1).await {
        println!("Load failed: {error}");
    }
    print_state(&store)?;

    println!("\n>>> Clearing orders and forgetting customer 7");
    clear_orders(&store);
    forget(&store, &customer_entity(7));
    print_state(&store)?;

    println!("\n=== Demonstration Complete ===");
    Ok(())
}
