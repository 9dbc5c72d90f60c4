// Public API - what other modules can use
pub use handlers::{get_round, next_open_round, round_for_date};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
