//! photobot — object-detection chat bot
//!
//! This library provides the core of the photobot system: a chat-facing
//! ingestion service that stages submitted images and enqueues prediction
//! jobs, a queue-backed worker loop that runs the detection pipeline, and a
//! notification callback that delivers human-readable summaries back to the
//! originating conversation.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
