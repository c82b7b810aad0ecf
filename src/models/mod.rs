pub mod detection;
pub mod event;
pub mod prediction;
