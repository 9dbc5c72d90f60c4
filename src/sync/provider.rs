use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// One fixture as delivered by the football-data provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFixture {
    pub id: Option<i64>,
    #[serde(default)]
    pub matchday: Option<i32>,
    pub utc_date: String,
    pub status: String,
    #[serde(default)]
    pub stage: Option<String>,
    pub home_team: ProviderTeam,
    pub away_team: ProviderTeam,
    #[serde(default)]
    pub score: Option<ProviderScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTeam {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderScore {
    #[serde(default)]
    pub full_time: Option<ProviderFullTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFullTime {
    pub home: Option<i32>,
    pub away: Option<i32>,
}

impl ProviderFixture {
    /// The provider's UTC timestamp is the source of truth for kickoff
    pub fn kickoff(&self) -> Result<DateTime<Utc>, AppError> {
        DateTime::parse_from_rfc3339(&self.utc_date)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                AppError::Provider(format!("invalid utcDate {:?}: {}", self.utc_date, e))
            })
    }

    /// Full-time goals if the provider already reports them
    pub fn full_time(&self) -> (Option<i32>, Option<i32>) {
        match self.score.as_ref().and_then(|s| s.full_time.as_ref()) {
            Some(full_time) => (full_time.home, full_time.away),
            None => (None, None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MatchesEnvelope {
    #[serde(default)]
    matches: Vec<ProviderFixture>,
}

/// Source of fixture data for one league
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    async fn league_fixtures(&self, league_code: &str) -> Result<Vec<ProviderFixture>, AppError>;
}

/// Settings for the HTTP fixture provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_token: String,
    pub season: Option<u16>,
    pub request_timeout: Duration,
}

/// Fixture provider backed by the football-data HTTP API
pub struct HttpFixtureProvider {
    client: reqwest::Client,
    base_url: String,
    season: Option<u16>,
}

impl HttpFixtureProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let token = config
            .api_token
            .parse()
            .map_err(|_| AppError::Provider("API token is not a valid header value".to_string()))?;
        headers.insert("X-Auth-Token", token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            season: config.season,
        })
    }
}

#[async_trait]
impl FixtureProvider for HttpFixtureProvider {
    #[instrument(skip(self))]
    async fn league_fixtures(&self, league_code: &str) -> Result<Vec<ProviderFixture>, AppError> {
        let mut url = format!("{}/competitions/{}/matches", self.base_url, league_code);
        if let Some(season) = self.season {
            url.push_str(&format!("?season={}", season));
        }

        debug!(league_code, "Fetching fixtures from provider");
        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, league_code, "Provider request failed");
            AppError::Provider(e.to_string())
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), league_code, "Provider returned an error status");
            return Err(AppError::Provider(format!(
                "status {} for {}",
                response.status(),
                league_code
            )));
        }

        let envelope: MatchesEnvelope = response.json().await.map_err(|e| {
            warn!(error = %e, league_code, "Provider response was not valid JSON");
            AppError::Provider(e.to_string())
        })?;

        debug!(
            league_code,
            fixture_count = envelope.matches.len(),
            "Fixtures fetched"
        );
        Ok(envelope.matches)
    }
}

/// Canned fixture provider for development and testing
#[derive(Default)]
pub struct StaticFixtureProvider {
    leagues: Mutex<HashMap<String, Vec<ProviderFixture>>>,
    failing: Mutex<HashMap<String, String>>,
}

impl StaticFixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers canned fixtures for a league code
    pub fn with_league(self, league_code: &str, fixtures: Vec<ProviderFixture>) -> Self {
        self.leagues
            .lock()
            .unwrap()
            .insert(league_code.to_string(), fixtures);
        self
    }

    /// Makes a league code fail with the given message
    pub fn with_failure(self, league_code: &str, message: &str) -> Self {
        self.failing
            .lock()
            .unwrap()
            .insert(league_code.to_string(), message.to_string());
        self
    }
}

#[async_trait]
impl FixtureProvider for StaticFixtureProvider {
    async fn league_fixtures(&self, league_code: &str) -> Result<Vec<ProviderFixture>, AppError> {
        if let Some(message) = self.failing.lock().unwrap().get(league_code) {
            return Err(AppError::Provider(message.clone()));
        }
        Ok(self
            .leagues
            .lock()
            .unwrap()
            .get(league_code)
            .cloned()
            .unwrap_or_default())
    }
}
