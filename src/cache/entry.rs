use std::time::Duration;

use tokio::time::Instant;

use crate::app::FetchError;
use crate::domain::QueryKey;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(10 * 60);

/// Freshness policy for one query type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Age after which cached data is still served but refetched.
    pub stale_time: Duration,
    /// Idle time after which an unobserved entry may be evicted.
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    Success,
    /// Last fetch failed. Earlier data, if any, is kept.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Fetch,
    Refresh,
    FetchMore,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: QueryKey,
    pub data: Option<V>,
    /// Time of the last successful fetch.
    pub fetched_at: Option<Instant>,
    pub status: QueryStatus,
    pub error: Option<FetchError>,
    /// Kind of the fetch currently in flight, if any.
    pub fetching: Option<FetchKind>,
}

impl<V> CacheEntry<V> {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            data: None,
            fetched_at: None,
            status: QueryStatus::Idle,
            error: None,
            fetching: None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Entries that never succeeded are always stale.
    pub fn is_stale(&self, stale_time: Duration, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) >= stale_time,
            None => true,
        }
    }
}
