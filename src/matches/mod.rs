// Public API - what other modules can use
pub use handlers::{
    delete_match, get_match, list_round_matches, purge_league, purge_round, update_match,
};

// Internal modules
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
