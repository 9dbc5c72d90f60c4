// Public API - what other modules can use
pub use handlers::run_sync;

// Internal modules
pub mod eligibility;
pub mod handlers;
pub mod provider;
pub mod service;
pub mod types;
