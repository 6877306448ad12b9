//! Relationship cache - a bounded, TTL-based cache of category-fund
//! resolution results.
//!
//! The cache is an optimization only; correctness never depends on it and
//! every caller can hit the resolver directly with identical behavior. It is
//! an explicit component with injectable configuration, constructed once per
//! process and passed by reference, so tests get a fresh instance each.
//!
//! Two tables are kept, both keyed by category id: resolved fund sets and
//! raw relationship rows. Each table sits behind its own `tokio` `RwLock`;
//! when both locks are needed they are always taken funds-first to avoid
//! deadlock. Eviction is LRU by recency of write, with the timestamp
//! refreshed on every read hit, so frequently-read categories are not
//! evicted merely for being old.

use crate::core::resolver::ResolvedFunds;
use crate::entities::category_fund_relationship;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Sizing and expiry configuration for [`RelationshipCache`].
#[derive(Debug, Clone)]
pub struct RelationshipCacheConfig {
    /// Maximum combined entry count across both tables
    pub max_entries: usize,
    /// Default time-to-live for entries without a per-entry override
    pub ttl: Duration,
}

impl Default for RelationshipCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 200,
            ttl: Duration::from_secs(300),
        }
    }
}

impl RelationshipCacheConfig {
    /// Builds a cache configuration from loaded application settings.
    #[must_use]
    pub fn from_settings(settings: &crate::config::settings::CacheSettings) -> Self {
        Self {
            max_entries: settings.max_entries,
            ttl: Duration::from_secs(settings.ttl_seconds),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Process-wide cache of category-fund resolution state.
#[derive(Debug)]
pub struct RelationshipCache {
    config: RelationshipCacheConfig,
    funds: RwLock<HashMap<i64, Entry<ResolvedFunds>>>,
    relationships: RwLock<HashMap<i64, Entry<Vec<category_fund_relationship::Model>>>>,
}

impl RelationshipCache {
    /// Creates an empty cache with the given configuration.
    #[must_use]
    pub fn new(config: RelationshipCacheConfig) -> Self {
        Self {
            config,
            funds: RwLock::new(HashMap::new()),
            relationships: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached resolved fund set for the category, refreshing the
    /// entry's timestamp on a hit. Expired entries are evicted and treated
    /// as a miss.
    pub async fn get_funds(&self, category_id: i64) -> Option<ResolvedFunds> {
        let mut funds = self.funds.write().await;
        Self::get_entry(&mut funds, category_id)
    }

    /// Returns the cached relationship rows for the category, with the same
    /// hit/expiry semantics as [`Self::get_funds`].
    pub async fn get_relationships(
        &self,
        category_id: i64,
    ) -> Option<Vec<category_fund_relationship::Model>> {
        let mut relationships = self.relationships.write().await;
        Self::get_entry(&mut relationships, category_id)
    }

    fn get_entry<T: Clone>(table: &mut HashMap<i64, Entry<T>>, category_id: i64) -> Option<T> {
        match table.get_mut(&category_id) {
            Some(entry) if entry.is_expired() => {
                trace!(category_id, "Cache entry expired; evicting");
                table.remove(&category_id);
                None
            }
            Some(entry) => {
                entry.stored_at = Instant::now();
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Stores the resolved fund set for the category, evicting the single
    /// globally-oldest entry first when the cache is full.
    pub async fn set_funds(&self, category_id: i64, value: ResolvedFunds, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.ttl);
        let mut funds = self.funds.write().await;
        if !funds.contains_key(&category_id) {
            let mut relationships = self.relationships.write().await;
            self.evict_oldest_if_full(&mut funds, &mut relationships);
        }
        funds.insert(category_id, Entry::new(value, ttl));
    }

    /// Stores the relationship rows for the category, with the same eviction
    /// behavior as [`Self::set_funds`].
    pub async fn set_relationships(
        &self,
        category_id: i64,
        value: Vec<category_fund_relationship::Model>,
        ttl: Option<Duration>,
    ) {
        let ttl = ttl.unwrap_or(self.config.ttl);
        let mut funds = self.funds.write().await;
        let mut relationships = self.relationships.write().await;
        if !relationships.contains_key(&category_id) {
            self.evict_oldest_if_full(&mut funds, &mut relationships);
        }
        relationships.insert(category_id, Entry::new(value, ttl));
    }

    /// Evicts exactly one entry, the globally-oldest by stored timestamp
    /// across both tables, when the combined count is at capacity.
    fn evict_oldest_if_full(
        &self,
        funds: &mut HashMap<i64, Entry<ResolvedFunds>>,
        relationships: &mut HashMap<i64, Entry<Vec<category_fund_relationship::Model>>>,
    ) {
        if funds.len() + relationships.len() < self.config.max_entries {
            return;
        }

        let oldest_fund = funds
            .iter()
            .min_by_key(|(_, e)| e.stored_at)
            .map(|(k, e)| (*k, e.stored_at));
        let oldest_relationship = relationships
            .iter()
            .min_by_key(|(_, e)| e.stored_at)
            .map(|(k, e)| (*k, e.stored_at));

        match (oldest_fund, oldest_relationship) {
            (Some((fund_key, fund_at)), Some((_, rel_at))) if fund_at <= rel_at => {
                debug!(category_id = fund_key, "Cache full; evicting oldest fund entry");
                funds.remove(&fund_key);
            }
            (Some(_), Some((rel_key, _))) | (None, Some((rel_key, _))) => {
                debug!(
                    category_id = rel_key,
                    "Cache full; evicting oldest relationship entry"
                );
                relationships.remove(&rel_key);
            }
            (Some((fund_key, _)), None) => {
                debug!(category_id = fund_key, "Cache full; evicting oldest fund entry");
                funds.remove(&fund_key);
            }
            (None, None) => {}
        }
    }

    /// Removes both tables' entries for the category. Called after any
    /// mutation of that category's relationships.
    pub async fn invalidate(&self, category_id: i64) {
        let mut funds = self.funds.write().await;
        let mut relationships = self.relationships.write().await;
        funds.remove(&category_id);
        relationships.remove(&category_id);
        trace!(category_id, "Invalidated cache entries for category");
    }

    /// Removes every category entry whose cached value references the fund.
    /// Called after a fund's identity-affecting attributes change or the
    /// fund is deleted.
    pub async fn invalidate_by_fund(&self, fund_id: i64) {
        let mut funds = self.funds.write().await;
        let mut relationships = self.relationships.write().await;
        let before = funds.len() + relationships.len();
        funds.retain(|_, entry| !entry.value.funds.iter().any(|f| f.id == fund_id));
        relationships.retain(|_, entry| !entry.value.iter().any(|r| r.fund_id == fund_id));
        let removed = before - (funds.len() + relationships.len());
        debug!(fund_id, removed, "Invalidated cache entries referencing fund");
    }

    /// Removes every cached fund set that was resolved without restrictions.
    /// Called when a fund is created: an unrestricted category's cached set
    /// spans all funds, so it would omit the new fund until it expired. A new
    /// fund appears in no cached entry, which is why
    /// [`Self::invalidate_by_fund`] cannot cover this case.
    pub async fn invalidate_unrestricted(&self) {
        let mut funds = self.funds.write().await;
        let before = funds.len();
        funds.retain(|_, entry| entry.value.has_restrictions);
        let removed = before - funds.len();
        if removed > 0 {
            debug!(removed, "Invalidated unrestricted cache entries");
        }
    }

    /// Removes all expired entries from both tables, regardless of access.
    /// Intended to run on a fixed interval so abandoned categories do not
    /// accumulate. Returns the number of entries removed.
    pub async fn cleanup(&self) -> usize {
        let mut funds = self.funds.write().await;
        let mut relationships = self.relationships.write().await;
        let before = funds.len() + relationships.len();
        funds.retain(|_, entry| !entry.is_expired());
        relationships.retain(|_, entry| !entry.is_expired());
        let removed = before - (funds.len() + relationships.len());
        if removed > 0 {
            debug!(removed, "Cache cleanup removed expired entries");
        }
        removed
    }

    /// Combined entry count across both tables.
    pub async fn entry_count(&self) -> usize {
        let funds = self.funds.read().await;
        let relationships = self.relationships.read().await;
        funds.len() + relationships.len()
    }
}
