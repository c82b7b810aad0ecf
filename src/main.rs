mod app_state;
mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    chat::TelegramClient, queue::RedisJobQueue, results::PgResultStore, storage::S3JobStore,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing photobot server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_histogram!(
        "prediction_processing_seconds",
        "Time to process a prediction job"
    );
    metrics::describe_counter!("prediction_jobs_total", "Total prediction jobs submitted");
    metrics::describe_counter!(
        "prediction_jobs_completed",
        "Total prediction jobs completed"
    );
    metrics::describe_counter!("prediction_jobs_failed", "Total prediction jobs that failed");
    metrics::describe_gauge!(
        "prediction_queue_depth",
        "Current number of pending jobs in the queue"
    );

    // Initialize result store
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize job store
    tracing::info!("Initializing S3 job store");
    let storage = S3JobStore::new(
        &config.s3_bucket,
        &config.s3_endpoint,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .expect("Failed to initialize S3 job store");

    // Initialize job queue
    tracing::info!("Connecting to Redis job queue");
    let queue = RedisJobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    // Initialize chat transport
    tracing::info!("Initializing Telegram client");
    let chat = TelegramClient::new(&config.telegram_api_url, &config.telegram_token);

    // Create shared application state
    let state = AppState::new(
        db_pool.clone(),
        Arc::new(chat),
        Arc::new(storage),
        Arc::new(queue),
        Arc::new(PgResultStore::new(db_pool)),
        config.telegram_token.clone(),
    );

    // Build API routes
    let app = Router::new()
        .route("/", get(routes::webhook::index))
        .route("/health", get(routes::health::health_check))
        .route("/webhook/{token}", post(routes::webhook::telegram_webhook))
        .route("/results", post(routes::results::deliver_results))
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting photobot on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
