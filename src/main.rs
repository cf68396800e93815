//! # Order Tracker demo
//!
//! Signs in (or resumes the saved session) and exercises the services of the
//! session's role:
//!
//! - **Customer**: fills the cart, prints the totals and lists recent orders.
//! - **Driver**: prints the dashboard and follows the active delivery for a few
//!   location samples.
//!
//! ```bash
//! ORDER_TRACKER_EMAIL=driver@example.com ORDER_TRACKER_PASSWORD=secret \
//!     RUST_LOG=info cargo run -- config.toml
//! ```

use order_tracker::config::Config;
use order_tracker::lifecycle::{
    setup_tracing, AppSystem, CustomerServices, DriverServices, Infrastructure, RoleServices,
    SystemError,
};
use order_tracker::model::{CartItem, OrderFilter, OrderType};
use order_tracker::tracker::PathLocationSource;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    setup_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    info!(api = %config.api.api_url(), "Starting order tracker");

    let infra = Infrastructure::from_config(&config)?;
    let system = match AppSystem::resume(&config, infra.clone()) {
        Some(system) => {
            info!(role = %system.role(), "Resumed saved session");
            system
        }
        None => {
            let email = std::env::var("ORDER_TRACKER_EMAIL").unwrap_or_default();
            let password = std::env::var("ORDER_TRACKER_PASSWORD").unwrap_or_default();
            AppSystem::login(&config, infra, &email, &password).await?
        }
    };

    let span = tracing::info_span!("session", role = %system.role());
    match &system.services {
        RoleServices::Customer(customer) => customer_demo(customer).instrument(span).await?,
        RoleServices::Driver(driver) => driver_demo(&system, driver).instrument(span).await?,
    }

    system.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}

async fn customer_demo(customer: &CustomerServices) -> Result<(), SystemError> {
    let cart = &customer.cart;
    let added = async {
        cart.add_or_update(CartItem::new(1, "Burger", Decimal::new(899, 2)), 2).await?;
        cart.add_or_update(CartItem::new(2, "Pizza", Decimal::new(1299, 2)), 1).await
    }
    .await;
    if let Err(e) = added {
        warn!(error = %e, "Cart update failed");
    }

    match cart.totals(OrderType::Delivery).await {
        Ok(totals) => info!(
            subtotal = %totals.subtotal,
            delivery_fee = %totals.delivery_fee,
            total = %totals.total,
            "Cart totals"
        ),
        Err(e) => warn!(error = %e, "Could not read cart"),
    }

    let orders = customer.orders.list(OrderFilter::Active).await?;
    for order in &orders {
        info!(order_id = %order.id, status = ?order.status, step = order.status.step(), "Active order");
    }
    Ok(())
}

async fn driver_demo(system: &AppSystem, driver: &DriverServices) -> Result<(), SystemError> {
    let dashboard = match driver.dashboard.refresh().await {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Dashboard unavailable");
            return Ok(());
        }
    };
    if let Some(stats) = &dashboard.stats {
        info!(
            pending = stats.pending_deliveries,
            in_transit = stats.in_transit,
            earned_today = %stats.total_earnings_today,
            "Dashboard"
        );
    }

    let Some(delivery) = dashboard.active_delivery else {
        info!("No active delivery");
        return Ok(());
    };

    let mut tracker = system.tracker();
    if let Err(e) = tracker.watch_delivery(delivery.clone()).await {
        warn!(error = %e, "Could not track delivery");
        return Ok(());
    }
    let actions: Vec<String> = match tracker.next_actions().await {
        Ok(actions) => actions.iter().map(ToString::to_string).collect(),
        Err(_) => Vec::new(),
    };
    info!(delivery_id = %delivery.id, status = %delivery.status, ?actions, "Tracking delivery");

    if let (Some(pickup), Some(destination)) = (delivery.pickup, delivery.destination) {
        let route = tracker.fetch_route(pickup, destination).await;
        info!(points = route.points.len(), fallback = route.is_fallback(), "Route ready");

        let source = Arc::new(PathLocationSource::new(route.points));
        tracker.start_location_stream(delivery.id, source);
        tokio::time::sleep(Duration::from_secs(12)).await;
    }

    tracker.stop().await;
    Ok(())
}
