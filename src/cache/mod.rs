//! Keyed query cache with request de-duplication.
//!
//! Every [`QueryKey`] owns one slot holding its [`CacheEntry`] and, while a
//! request is running, the shared future for it. Callers that arrive while a
//! request is in flight await that same future instead of issuing another.
//! The future settles the entry itself, so every awaiter sees the stored
//! result, and it is driven by a spawned task so that a consumer going away
//! never aborts it.

pub mod entry;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::FetchError;
use crate::domain::QueryKey;

pub use entry::{CacheEntry, FetchKind, QueryOptions, QueryStatus};

type InFlight<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;
type Slots<V> = HashMap<QueryKey, Slot<V>>;

struct Slot<V> {
    state: watch::Sender<CacheEntry<V>>,
    in_flight: Option<InFlight<V>>,
    options: QueryOptions,
    last_used: Instant,
}

impl<V> Slot<V> {
    fn new(key: &QueryKey, options: QueryOptions) -> Self {
        let (state, _) = watch::channel(CacheEntry::new(key.clone()));
        Self {
            state,
            in_flight: None,
            options,
            last_used: Instant::now(),
        }
    }
}

pub struct QueryCache<V> {
    slots: Arc<Mutex<Slots<V>>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<V>(slots: &Mutex<Slots<V>>) -> MutexGuard<'_, Slots<V>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

fn settle<V: Clone>(slots: &Mutex<Slots<V>>, key: &QueryKey, result: &Result<V, FetchError>) {
    let mut slots = lock(slots);
    let Some(slot) = slots.get_mut(key) else {
        return;
    };
    slot.in_flight = None;
    slot.last_used = Instant::now();
    slot.state.send_modify(|entry| {
        entry.fetching = None;
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.fetched_at = Some(Instant::now());
                entry.status = QueryStatus::Success;
                entry.error = None;
            }
            Err(e) => {
                warn!("Fetch for {} failed: {}", key, e);
                entry.status = QueryStatus::Error;
                entry.error = Some(e.clone());
            }
        }
    });
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots<V>> {
        lock(&self.slots)
    }

    fn slot<'a>(slots: &'a mut Slots<V>, key: &QueryKey, options: QueryOptions) -> &'a mut Slot<V> {
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key, options));
        slot.options = options;
        slot.last_used = Instant::now();
        slot
    }

    /// Registers `request` as the in-flight fetch for `key` and spawns it.
    fn start<Fut>(&self, key: &QueryKey, slot: &mut Slot<V>, kind: FetchKind, request: Fut) -> InFlight<V>
    where
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        debug!("Starting {:?} for {}", kind, key);

        let slots: Weak<Mutex<Slots<V>>> = Arc::downgrade(&self.slots);
        let settle_key = key.clone();
        let in_flight = async move {
            let result = request.await;
            if let Some(slots) = slots.upgrade() {
                settle(&slots, &settle_key, &result);
            }
            result
        }
        .boxed()
        .shared();

        slot.in_flight = Some(in_flight.clone());
        slot.state.send_modify(|entry| {
            entry.fetching = Some(kind);
            if entry.data.is_none() {
                entry.status = QueryStatus::Loading;
            }
        });

        tokio::spawn(in_flight.clone());
        in_flight
    }

    /// Reads `key`, fetching when needed.
    ///
    /// Fresh data is returned as is. Stale data is returned immediately while
    /// a background refetch runs. Without data the call waits for the fetch.
    /// `fetcher` receives the current data and is only called when a new
    /// request is actually issued.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, options: QueryOptions, fetcher: F) -> CacheEntry<V>
    where
        F: FnOnce(Option<V>) -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots();
            let slot = Self::slot(&mut slots, key, options);
            let entry = slot.state.borrow().clone();
            let has_data = entry.data.is_some();

            if let Some(in_flight) = slot.in_flight.clone() {
                if has_data {
                    return entry;
                }
                in_flight
            } else if has_data && !entry.is_stale(options.stale_time, Instant::now()) {
                debug!("Cache hit for {}", key);
                return entry;
            } else {
                let request = fetcher(entry.data);
                let in_flight = self.start(key, slot, FetchKind::Fetch, request);
                if has_data {
                    return slot.state.borrow().clone();
                }
                in_flight
            }
        };

        let _ = pending.await;
        self.entry_or_new(key)
    }

    /// Forces a fetch of `key` regardless of freshness. Attaches to the
    /// in-flight fetch instead when there is one.
    pub async fn refresh<F, Fut>(&self, key: &QueryKey, options: QueryOptions, fetcher: F) -> CacheEntry<V>
    where
        F: FnOnce(Option<V>) -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots();
            let slot = Self::slot(&mut slots, key, options);
            match slot.in_flight.clone() {
                Some(in_flight) => in_flight,
                None => {
                    let request = fetcher(slot.state.borrow().data.clone());
                    self.start(key, slot, FetchKind::Refresh, request)
                }
            }
        };

        let _ = pending.await;
        self.entry_or_new(key)
    }

    /// Extends already loaded data for `key`.
    ///
    /// Returns `None` without issuing a request when nothing is loaded yet,
    /// when another fetch is in flight, or when `fetcher` declines by
    /// returning `None`.
    pub async fn try_fetch_more<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Option<CacheEntry<V>>
    where
        F: FnOnce(&V) -> Option<Fut>,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots();
            let slot = slots.get_mut(key)?;
            if slot.in_flight.is_some() {
                return None;
            }
            let request = {
                let entry = slot.state.borrow();
                fetcher(entry.data.as_ref()?)?
            };
            slot.last_used = Instant::now();
            self.start(key, slot, FetchKind::FetchMore, request)
        };

        let _ = pending.await;
        Some(self.entry_or_new(key))
    }

    pub fn entry(&self, key: &QueryKey) -> Option<CacheEntry<V>> {
        let mut slots = self.slots();
        let slot = slots.get_mut(key)?;
        slot.last_used = Instant::now();
        let entry = slot.state.borrow().clone();
        Some(entry)
    }

    fn entry_or_new(&self, key: &QueryKey) -> CacheEntry<V> {
        self.entry(key)
            .unwrap_or_else(|| CacheEntry::new(key.clone()))
    }

    /// Observes every change to the entry for `key`. An entry with live
    /// subscribers is never garbage collected.
    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<CacheEntry<V>> {
        let mut slots = self.slots();
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key, QueryOptions::default()));
        slot.state.subscribe()
    }

    /// Marks the entry stale so the next read refetches it.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(slot) = self.slots().get_mut(key) {
            slot.state.send_modify(|entry| entry.fetched_at = None);
        }
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.slots()
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Evicts entries that nobody observes, that have nothing in flight and
    /// that have not been used for longer than their `gc_time`.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|_, slot| {
            slot.in_flight.is_some()
                || slot.state.receiver_count() > 0
                || now.saturating_duration_since(slot.last_used) < slot.options.gc_time
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            debug!("Evicted {} cache entries", evicted);
        }
        evicted
    }

    pub fn spawn_gc(&self, every: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                cache.collect_garbage();
            }
        })
    }
}
