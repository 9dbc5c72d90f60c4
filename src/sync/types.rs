use serde::{Deserialize, Serialize};

/// Outcome of ingesting a single fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted,
    /// The (home, away, kickoff) tuple is already present; a normal no-op
    Duplicate,
}

/// One competition the service keeps in sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueRef {
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl LeagueRef {
    /// Parses a `id:code:name` list separated by commas, e.g.
    /// `2021:PL:Premier League,2001:CL:Champions League`.
    /// Malformed entries are dropped.
    pub fn parse_list(raw: &str) -> Vec<LeagueRef> {
        raw.split(',')
            .filter_map(|entry| {
                let mut parts = entry.trim().splitn(3, ':');
                let id = parts.next()?.trim().parse().ok()?;
                let code = parts.next()?.trim();
                if code.is_empty() {
                    return None;
                }
                let name = parts.next().map(str::trim).unwrap_or(code);
                Some(LeagueRef {
                    id,
                    code: code.to_string(),
                    name: name.to_string(),
                })
            })
            .collect()
    }
}

/// Per-league ingestion tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSyncReport {
    pub league: String,
    pub code: String,
    pub added: u32,
    pub skipped: u32,
    pub failed: u32,
    pub error: Option<String>,
}

/// Result of one sync run across all configured leagues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub succeeded: u32,
    pub failed: u32,
    pub leagues: Vec<LeagueSyncReport>,
}
