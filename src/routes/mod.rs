pub mod health;
pub mod metrics;
pub mod results;
pub mod webhook;
