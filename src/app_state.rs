use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{
    chat::ChatTransport, ingestion::EventDispatcher, queue::JobQueue, results::ResultStore,
    storage::JobStore,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub chat: Arc<dyn ChatTransport>,
    pub queue: Arc<dyn JobQueue>,
    pub results: Arc<dyn ResultStore>,
    pub ingestion: Arc<EventDispatcher>,
    /// Expected webhook path token; requests with any other token are
    /// rejected without reaching the ingestion service.
    pub webhook_token: String,
}

impl AppState {
    pub fn new(
        db: PgPool,
        chat: Arc<dyn ChatTransport>,
        storage: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        results: Arc<dyn ResultStore>,
        webhook_token: String,
    ) -> Self {
        let ingestion = Arc::new(EventDispatcher::new(
            chat.clone(),
            storage,
            queue.clone(),
        ));
        Self {
            db,
            chat,
            queue,
            results,
            ingestion,
            webhook_token,
        }
    }
}
