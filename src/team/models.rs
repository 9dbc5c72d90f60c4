use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the teams table
///
/// The registry the core consults for venue resolution and display names;
/// richer club metadata lives with the admin tooling, not here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamModel {
    pub id: i64,
    pub name: String,
    pub venue: Option<String>,
}
