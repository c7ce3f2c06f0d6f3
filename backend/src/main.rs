//! Kedai POS - Backend Server
//!
//! Point-of-sale and kitchen backend for a small food shop: catalog stock,
//! raw-material production, sales with cash and gateway payments, and the
//! daily cost-of-goods rollup.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{
    net::SocketAddr,
    sync::{atomic::AtomicUsize, Arc},
    time::Duration,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod realtime;
mod routes;
mod services;

pub use config::Config;

use external::{FirebaseCounterStore, MidtransClient};
use realtime::RealtimeHub;
use services::AuthService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub hub: RealtimeHub,
    /// Stock counters in Firebase; `None` runs every stock change on Postgres
    pub fast_path: Option<FirebaseCounterStore>,
    pub gateway: Option<MidtransClient>,
    /// Round-robin position for cashier attribution
    pub kasir_cursor: Arc<AtomicUsize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kedai_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Kedai POS Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let fast_path = config.firebase.as_ref().map(FirebaseCounterStore::new);
    match &fast_path {
        Some(_) => tracing::info!("Fast-path stock store enabled"),
        None => tracing::warn!("Firebase is not configured; stock changes run in degraded mode"),
    }

    let gateway = config.midtrans.as_ref().map(MidtransClient::new);
    if gateway.is_none() {
        tracing::warn!("Midtrans is not configured; only cash sales can be completed");
    }

    if let Some((username, password)) = config.bootstrap.admin_credentials() {
        AuthService::new(db_pool.clone(), &config)
            .ensure_bootstrap_admin(username, password)
            .await?;
    }

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        hub: RealtimeHub::new(),
        fast_path,
        gateway,
        kasir_cursor: Arc::new(AtomicUsize::new(0)),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .route("/ws", get(realtime::ws_handler))
        .route(
            "/midtrans-callback",
            axum::routing::post(handlers::midtrans_callback),
        )
        .nest("/api", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Kedai POS API v1.0"
}
