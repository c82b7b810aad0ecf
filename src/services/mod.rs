pub mod chat;
pub mod detector;
pub mod ingestion;
pub mod notifier;
pub mod queue;
pub mod results;
pub mod storage;
pub mod worker;
