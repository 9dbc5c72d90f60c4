// Public API - what other modules can use
pub use handlers::update_stage_flags;

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
