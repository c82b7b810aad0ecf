use std::sync::Arc;

use photobot::{
    config::AppConfig,
    db,
    services::{
        detector::HttpDetector, notifier::HttpCallbackNotifier, queue::RedisJobQueue,
        results::PgResultStore, storage::S3JobStore, worker::Worker,
    },
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting prediction worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize result store
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let storage = S3JobStore::new(
        &config.s3_bucket,
        &config.s3_endpoint,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .expect("Failed to initialize S3 job store");

    let queue = RedisJobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    let detector = HttpDetector::new(&config.detector_url);
    let notifier = HttpCallbackNotifier::new(&config.callback_url);

    let worker = Worker::new(
        Arc::new(storage),
        Arc::new(queue),
        Arc::new(PgResultStore::new(db_pool)),
        Arc::new(detector),
        Arc::new(notifier),
    );

    // Cooperative shutdown: Ctrl-C flips the flag, the loop notices at the
    // top of its next iteration and lets any in-flight job finish.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    worker.run(shutdown_rx).await;

    tracing::info!("Worker stopped");
}
