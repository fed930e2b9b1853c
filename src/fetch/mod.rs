//! Game API client with caching.
//!
//! Every request goes through [`ApiClient::fetch`]: the id is validated for
//! its resource kind, the response cache is consulted, and only on a miss is
//! the transport called. HTTP failures are mapped onto [`FetchError`].

mod cache;
mod transport;

pub use cache::{CacheKey, ResponseCache};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::GameApiConfig;
use crate::models::{
    BattleLogEntry, BrawlerInfo, ClubMember, ClubProfile, ItemList, PlayerProfile, RankingEntry,
    Tag,
};

/// The REST resources the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Player,
    BattleLog,
    Club,
    ClubMembers,
    /// The full brawler catalogue; takes an empty id.
    Brawlers,
    Brawler,
    BrawlerRanking,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Player => "player",
            ResourceKind::BattleLog => "battle_log",
            ResourceKind::Club => "club",
            ResourceKind::ClubMembers => "club_members",
            ResourceKind::Brawlers => "brawlers",
            ResourceKind::Brawler => "brawler",
            ResourceKind::BrawlerRanking => "brawler_ranking",
        }
    }

    /// Validate and normalize an id for this kind without touching the network.
    pub fn normalize_id(&self, id: &str) -> Result<String, FetchError> {
        let invalid = |reason: &str| FetchError::Validation {
            kind: *self,
            input: id.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ResourceKind::Player
            | ResourceKind::BattleLog
            | ResourceKind::Club
            | ResourceKind::ClubMembers => Tag::parse(id)
                .map(String::from)
                .map_err(|e| invalid(e.reason)),
            ResourceKind::Brawler | ResourceKind::BrawlerRanking => {
                let id = id.trim();
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
                    Err(invalid("brawler id must be numeric"))
                } else {
                    Ok(id.to_string())
                }
            }
            ResourceKind::Brawlers => {
                if id.trim().is_empty() {
                    Ok(String::new())
                } else {
                    Err(invalid("the brawler list takes no id"))
                }
            }
        }
    }

    /// Request path for a normalized id.
    pub fn path(&self, id: &str) -> String {
        let encoded = id.replacen('#', "%23", 1);
        match self {
            ResourceKind::Player => format!("/players/{}", encoded),
            ResourceKind::BattleLog => format!("/players/{}/battlelog", encoded),
            ResourceKind::Club => format!("/clubs/{}", encoded),
            ResourceKind::ClubMembers => format!("/clubs/{}/members", encoded),
            ResourceKind::Brawlers => "/brawlers".to_string(),
            ResourceKind::Brawler => format!("/brawlers/{}", encoded),
            ResourceKind::BrawlerRanking => format!("/rankings/global/brawlers/{}", encoded),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while fetching from the game API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Invalid {kind} id {input:?}: {reason}")]
    Validation {
        kind: ResourceKind,
        input: String,
        reason: String,
    },

    #[error("Not found (HTTP {status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("Rate limited (HTTP {status}): {message}")]
    RateLimited {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Temporarily unavailable: {message}")]
    Transient { status: Option<u16>, message: String },

    #[error("Request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response body (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

impl FetchError {
    /// HTTP status that caused the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Validation { .. } => None,
            FetchError::Transient { status, .. } => *status,
            FetchError::NotFound { status, .. }
            | FetchError::RateLimited { status, .. }
            | FetchError::Rejected { status, .. }
            | FetchError::Decode { status, .. } => Some(*status),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FetchError::Validation { reason, .. } => reason,
            FetchError::NotFound { message, .. }
            | FetchError::RateLimited { message, .. }
            | FetchError::Transient { message, .. }
            | FetchError::Rejected { message, .. }
            | FetchError::Decode { message, .. } => message,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Validation { .. } => "VALIDATION",
            FetchError::NotFound { .. } => "NOT_FOUND",
            FetchError::RateLimited { .. } => "RATE_LIMITED",
            FetchError::Transient { .. } => "TRANSIENT",
            FetchError::Rejected { .. } => "REJECTED",
            FetchError::Decode { .. } => "DECODE",
        }
    }

    /// Message suitable for showing in a dashboard section.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Validation { input, reason, .. } => format!("{:?} is not valid: {}", input, reason),
            FetchError::NotFound { .. } => "Nothing was found for this tag.".to_string(),
            FetchError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => format!("The game API is rate limiting us. Try again in {}s.", secs),
            FetchError::RateLimited { .. } => {
                "The game API is rate limiting us. Try again later.".to_string()
            }
            FetchError::Transient { .. } => {
                "The game API is temporarily unavailable. Try again later.".to_string()
            }
            FetchError::Rejected { status, message } => {
                format!("The game API rejected the request ({}): {}", status, message)
            }
            FetchError::Decode { .. } => "The game API sent an unexpected response.".to_string(),
        }
    }
}

/// Error body the game API sends with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ProviderError>(body)
        .ok()
        .and_then(|e| e.message.or(e.reason))
        .filter(|m| !m.is_empty())
        .or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Map a raw response onto a payload or a typed error.
fn interpret(response: HttpResponse) -> Result<Value, FetchError> {
    let status = response.status;
    match status {
        200..=299 => serde_json::from_str(&response.body).map_err(|e| FetchError::Decode {
            status,
            message: e.to_string(),
        }),
        404 => Err(FetchError::NotFound {
            status,
            message: error_message(status, &response.body),
        }),
        429 => Err(FetchError::RateLimited {
            status,
            message: error_message(status, &response.body),
            retry_after_secs: response.retry_after_secs,
        }),
        500..=599 => Err(FetchError::Transient {
            status: Some(status),
            message: error_message(status, &response.body),
        }),
        _ => Err(FetchError::Rejected {
            status,
            message: error_message(status, &response.body),
        }),
    }
}

/// Longest wait between two retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Backoff for transient failures. Rate limiting is never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), capped at
    /// [`MAX_RETRY_DELAY`].
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(attempt.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .map_or(MAX_RETRY_DELAY, |d| d.min(MAX_RETRY_DELAY))
    }
}

/// Cached, validating client for the game API.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    retry: RetryPolicy,
    /// One async lock per in-flight key so concurrent identical requests
    /// share a single network call.
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, cache: ResponseCache) -> Self {
        Self {
            transport,
            cache,
            retry: RetryPolicy::default(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a reqwest-backed client from configuration.
    pub fn from_config(config: &GameApiConfig, api_key: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FetchError::Rejected {
            status: 0,
            message: format!("invalid base URL {}: {}", config.base_url, e),
        })?;
        let transport = ReqwestTransport::new(
            &base_url,
            api_key,
            Duration::from_secs(config.timeout_seconds),
        )
        .map_err(|e| FetchError::Transient {
            status: None,
            message: e.message,
        })?;

        let ttl = Duration::from_secs(config.cache_ttl_seconds);
        let cache = match &config.cache_dir {
            Some(dir) => ResponseCache::with_disk(ttl, dir),
            None => ResponseCache::new(ttl),
        };

        Ok(Self::new(Arc::new(transport), cache).with_retry_policy(RetryPolicy {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_delay_ms),
            ..Default::default()
        }))
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetch a resource, serving it from the cache while fresh.
    pub async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Arc<Value>, FetchError> {
        let key = CacheKey::new(kind, kind.normalize_id(id)?);

        if let Some(payload) = self.cache.get(&key).await {
            return Ok(payload);
        }

        let gate = self.gate(&key);
        let result = {
            let _guard = gate.lock().await;
            // Another caller may have filled the cache while we waited.
            match self.cache.get(&key).await {
                Some(payload) => Ok(payload),
                None => self.fetch_and_cache(&key).await,
            }
        };
        self.release_gate(&key, gate);
        result
    }

    /// Drop any cached copy and fetch again.
    pub async fn refresh(&self, kind: ResourceKind, id: &str) -> Result<Arc<Value>, FetchError> {
        let key = CacheKey::new(kind, kind.normalize_id(id)?);
        self.cache.invalidate(&key).await;
        self.fetch(kind, &key.id).await
    }

    /// Drop any cached copy without fetching; the next read goes to the network.
    pub async fn invalidate(&self, kind: ResourceKind, id: &str) -> Result<(), FetchError> {
        let key = CacheKey::new(kind, kind.normalize_id(id)?);
        self.cache.invalidate(&key).await;
        Ok(())
    }

    fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    fn release_gate(&self, key: &CacheKey, gate: Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        // Map + our handle: nobody else is waiting on it.
        if Arc::strong_count(&gate) <= 2 {
            gates.remove(key);
        }
    }

    async fn fetch_and_cache(&self, key: &CacheKey) -> Result<Arc<Value>, FetchError> {
        let path = key.kind.path(&key.id);
        let mut attempt = 0;

        let payload = loop {
            match self.fetch_once(&path).await {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Transient failure for {} (attempt {}/{}): {}; retrying in {:?}",
                        path,
                        attempt + 1,
                        self.retry.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => break other?,
            }
        };

        let payload = Arc::new(payload);
        self.cache.insert(key.clone(), Arc::clone(&payload)).await;
        Ok(payload)
    }

    async fn fetch_once(&self, path: &str) -> Result<Value, FetchError> {
        info!("Fetching {} via {}", path, self.transport.name());
        let response = self
            .transport
            .get(path)
            .await
            .map_err(|e| FetchError::Transient {
                status: None,
                message: if e.timed_out {
                    format!("request timed out: {}", e.message)
                } else {
                    e.message
                },
            })?;
        debug!("{} answered {}", path, response.status);
        interpret(response)
    }

    async fn fetch_as<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> Result<T, FetchError> {
        let payload = self.fetch(kind, id).await?;
        T::deserialize(payload.as_ref()).map_err(|e| FetchError::Decode {
            status: 200,
            message: format!("{} payload: {}", kind, e),
        })
    }

    pub async fn player(&self, tag: &str) -> Result<PlayerProfile, FetchError> {
        self.fetch_as(ResourceKind::Player, tag).await
    }

    /// Most recent battles first, as the API orders them.
    pub async fn battle_log(&self, tag: &str) -> Result<Vec<BattleLogEntry>, FetchError> {
        let list: ItemList<BattleLogEntry> = self.fetch_as(ResourceKind::BattleLog, tag).await?;
        Ok(list.items)
    }

    pub async fn club(&self, tag: &str) -> Result<ClubProfile, FetchError> {
        self.fetch_as(ResourceKind::Club, tag).await
    }

    pub async fn club_members(&self, tag: &str) -> Result<Vec<ClubMember>, FetchError> {
        let list: ItemList<ClubMember> = self.fetch_as(ResourceKind::ClubMembers, tag).await?;
        Ok(list.items)
    }

    /// All brawlers, sorted by name.
    pub async fn brawlers(&self) -> Result<Vec<BrawlerInfo>, FetchError> {
        let list: ItemList<BrawlerInfo> = self.fetch_as(ResourceKind::Brawlers, "").await?;
        let mut items = list.items;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub async fn brawler(&self, id: &str) -> Result<BrawlerInfo, FetchError> {
        self.fetch_as(ResourceKind::Brawler, id).await
    }

    /// Global ranking for one brawler, truncated to `limit` entries.
    pub async fn brawler_rankings(
        &self,
        id: &str,
        limit: usize,
    ) -> Result<Vec<RankingEntry>, FetchError> {
        let list: ItemList<RankingEntry> =
            self.fetch_as(ResourceKind::BrawlerRanking, id).await?;
        let mut items = list.items;
        items.truncate(limit);
        Ok(items)
    }
}
