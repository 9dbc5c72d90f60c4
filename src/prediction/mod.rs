// Public API - what other modules can use
pub use handlers::{get_prediction, rescore_match, round_prediction_stats, save_predictions};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod types;
