//! Report cache keyed by rounded coordinates
use crate::domain::SkyReport;
use crate::utils::coordinate_key;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub report: Arc<SkyReport>,
    pub stored_at: DateTime<Utc>,
    pub last_read: DateTime<Utc>,
}

/// Decides which cache entries go
pub trait EvictionPolicy: Send + Sync {
    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool;

    /// Keys to remove so the cache satisfies the policy
    fn victims(&self, entries: &HashMap<String, CacheEntry>, now: DateTime<Utc>) -> Vec<String>;
}

/// Drop entries older than `ttl`, then the least recently read beyond `max_entries`.
#[derive(Debug, Clone)]
pub struct TtlCapacityPolicy {
    pub ttl: Duration,
    pub max_entries: usize,
}

impl EvictionPolicy for TtlCapacityPolicy {
    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.stored_at > self.ttl
    }

    fn victims(&self, entries: &HashMap<String, CacheEntry>, now: DateTime<Utc>) -> Vec<String> {
        let (expired, mut live): (Vec<_>, Vec<_>) = entries
            .iter()
            .partition(|(_, entry)| self.is_expired(entry, now));

        let mut victims: Vec<String> = expired.into_iter().map(|(k, _)| k.clone()).collect();
        if live.len() > self.max_entries {
            live.sort_by(|a, b| a.1.last_read.cmp(&b.1.last_read).then_with(|| a.0.cmp(b.0)));
            let excess = live.len() - self.max_entries;
            victims.extend(live.into_iter().take(excess).map(|(k, _)| k.clone()));
        }
        victims
    }
}

pub struct ReportCache {
    precision: usize,
    entries: RwLock<HashMap<String, CacheEntry>>,
    policy: Box<dyn EvictionPolicy>,
}

impl ReportCache {
    pub fn new(precision: usize, policy: impl EvictionPolicy + 'static) -> Self {
        Self {
            precision,
            entries: RwLock::new(HashMap::new()),
            policy: Box::new(policy),
        }
    }

    pub fn key(&self, lat: f64, lon: f64) -> String {
        coordinate_key(lat, lon, self.precision)
    }

    /// Store a report under its own location, replacing any previous one
    pub fn put(&self, report: SkyReport, now: DateTime<Utc>) -> String {
        let key = self.key(report.location.lat, report.location.lon);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.clone(),
            CacheEntry {
                report: Arc::new(report),
                stored_at: now,
                last_read: now,
            },
        );
        for victim in self.policy.victims(&entries, now) {
            entries.remove(&victim);
        }
        key
    }

    /// Current report near a location, unless the policy says it expired
    pub fn get(&self, lat: f64, lon: f64, now: DateTime<Utc>) -> Option<Arc<SkyReport>> {
        let key = self.key(lat, lon);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get_mut(&key)?;
        if self.policy.is_expired(entry, now) {
            return None;
        }
        entry.last_read = now;
        Some(entry.report.clone())
    }

    /// Apply the policy; returns how many entries were dropped
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let victims = self.policy.victims(&entries, now);
        for victim in &victims {
            entries.remove(victim);
        }
        victims.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{empty_report, now};

    fn report_at(lat: f64, lon: f64) -> SkyReport {
        let mut report = empty_report();
        report.location.lat = lat;
        report.location.lon = lon;
        report
    }

    fn cache(max_entries: usize) -> ReportCache {
        ReportCache::new(
            2,
            TtlCapacityPolicy {
                ttl: Duration::minutes(15),
                max_entries,
            },
        )
    }

    #[test]
    fn test_nearby_coordinates_share_an_entry() {
        let cache = cache(10);
        cache.put(report_at(40.7128, -74.0060), now());
        assert!(cache.get(40.7149, -74.0051, now()).is_some());
        assert!(cache.get(40.80, -74.00, now()).is_none());
    }

    #[test]
    fn test_expired_entries_are_hidden_and_swept() {
        let cache = cache(10);
        assert!(cache.is_empty());
        cache.put(report_at(10.0, 10.0), now());
        assert!(!cache.is_empty());
        let later = now() + Duration::minutes(16);
        assert!(cache.get(10.0, 10.0, later).is_none());
        assert_eq!(cache.sweep(later), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_read() {
        let cache = cache(2);
        cache.put(report_at(1.0, 1.0), now());
        cache.put(report_at(2.0, 2.0), now() + Duration::seconds(1));
        cache.get(1.0, 1.0, now() + Duration::seconds(2));
        cache.put(report_at(3.0, 3.0), now() + Duration::seconds(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(2.0, 2.0, now() + Duration::seconds(4)).is_none());
        assert!(cache.get(1.0, 1.0, now() + Duration::seconds(4)).is_some());
    }
}
