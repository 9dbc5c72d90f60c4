// Public API - what other modules can use
pub use handlers::{get_team, upsert_team};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
