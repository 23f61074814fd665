//! Dining Waste Tracker - Backend Server
//!
//! Measures plate waste from before/after photos and turns the scan history
//! into reports, student statistics, a leaderboard and insights for dining
//! hall staff.

use axum::{http::Uri, routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;

use config::StorageBackend;
use services::{
    AggregationEngine, MemoryScanLog, PgScanLog, ReportingService, ScanLog, ScanService,
    WasteEstimator,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub log: Arc<dyn ScanLog>,
    pub scans: ScanService,
    pub reporting: ReportingService,
}

impl AppState {
    /// Wire services around an already opened scan log
    pub fn new(config: Config, log: Arc<dyn ScanLog>) -> error::AppResult<Self> {
        let estimator = WasteEstimator::from_config(&config.estimator)?;
        let engine = AggregationEngine::from_offset_minutes(config.reporting.utc_offset_minutes)?;

        Ok(Self {
            scans: ScanService::new(log.clone(), estimator, config.impact),
            reporting: ReportingService::new(log.clone(), engine),
            log,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Dining Waste Tracker Server");
    tracing::info!("Environment: {}", config.environment);

    let log = open_scan_log(&config).await?;
    let state = AppState::new(config.clone(), log)?;

    if state.scans.estimator_enabled() {
        tracing::info!("Vision estimator enabled ({})", config.estimator.model);
    } else {
        tracing::warn!("No estimator API key configured; every scan uses the pixel fallback");
    }

    // Build application
    let app = create_app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waste_tracker_server=debug,tower_http=debug,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_scan_log(config: &Config) -> anyhow::Result<Arc<dyn ScanLog>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory scan log");
            Ok(Arc::new(MemoryScanLog::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("storage.database_url is not set"))?;

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.storage.max_connections)
                .min_connections(config.storage.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PgScanLog::new(db_pool)))
        }
    }
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
        .nest("/api", routes::api_routes())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Dining Waste Tracker API - plate scans, waste reports and leaderboards"
}

async fn not_found(uri: Uri) -> error::AppError {
    error::AppError::NotFound(format!("Route {}", uri.path()))
}
