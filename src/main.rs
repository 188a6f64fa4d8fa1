//! Gatherly booking service
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use gatherly::{
    api::{self, AppState},
    config::Settings,
    database::{connection::create_pool, run_migrations, DatabaseService},
    scheduler::ExpiryScheduler,
    services::{PaymentGateway, ServiceFactory, StripeGateway},
    utils::{clock::SystemClock, logging},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard keeps the file writer alive
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting Gatherly booking service...");

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;

    // Initialize services
    info!("Initializing services...");
    let database = DatabaseService::new(pool.clone());
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(&settings.payment)?);
    let clock = Arc::new(SystemClock);
    let services = ServiceFactory::new(database, gateway, clock, settings.clone());

    // Start the expiry scheduler
    let mut scheduler = ExpiryScheduler::new(
        services.booking_service.clone(),
        Duration::from_secs(settings.booking.sweep_interval_seconds),
    );
    scheduler.start();

    // Start the HTTP server
    let state = AppState { pool, services };
    let app = api::router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gatherly is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;

    info!("Gatherly has shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
