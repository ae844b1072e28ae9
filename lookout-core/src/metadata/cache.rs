//! Bounded cache of fetched stream metadata.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use lru::LruCache;

use super::StreamMetadata;
use crate::config::{MetadataConfig, RetentionPolicy};

/// A cached metadata entry with its fetch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMetadata {
    pub metadata: StreamMetadata,
    pub fetched_at: DateTime<Utc>,
}

/// LRU-bounded store of per-stream metadata.
///
/// The cache is the only place metadata lives; the resolver reads it through
/// [`MetadataCache::lookup`] and treats absence as "not yet known". Merging
/// the same fetch result twice is a no-op apart from the recorded fetch time,
/// which keeps recomputation idempotent.
pub struct MetadataCache {
    entries: LruCache<String, CachedMetadata>,
    retention: RetentionPolicy,
}

impl MetadataCache {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            entries: LruCache::new(config.cache_capacity),
            retention: config.retention,
        }
    }

    /// Merges freshly fetched metadata, stamping each entry with the fetch time.
    pub fn merge(&mut self, fetched: HashMap<String, StreamMetadata>) {
        let fetched_at = Utc::now();
        for (name, metadata) in fetched {
            tracing::debug!("cached metadata for stream '{name}' at {fetched_at}");
            self.entries.put(
                name,
                CachedMetadata {
                    metadata,
                    fetched_at,
                },
            );
        }
    }

    /// Metadata for `stream`, if fetched and not evicted.
    ///
    /// A pure read: does not refresh LRU recency, so repeated resolution
    /// passes cannot perturb eviction order.
    pub fn lookup(&self, stream: &str) -> Option<&StreamMetadata> {
        self.entries.peek(stream).map(|cached| &cached.metadata)
    }

    /// The cached entry for `stream`, including its fetch time.
    pub fn entry(&self, stream: &str) -> Option<&CachedMetadata> {
        self.entries.peek(stream)
    }

    /// Names from `needed` that are not cached and so require a fetch.
    pub fn missing_from(&self, needed: &HashSet<String>) -> HashSet<String> {
        needed
            .iter()
            .filter(|name| !self.entries.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Applies the retention policy against the current needed set.
    ///
    /// Under `DropUnneeded`, entries for streams outside `needed` are
    /// removed; under `RetainStale` they stay until LRU capacity evicts them.
    pub fn apply_retention(&mut self, needed: &HashSet<String>) {
        if self.retention != RetentionPolicy::DropUnneeded {
            return;
        }

        let stale: Vec<String> = self
            .entries
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !needed.contains(*name))
            .cloned()
            .collect();

        for name in stale {
            tracing::debug!("dropping metadata for no-longer-needed stream '{name}'");
            self.entries.pop(&name);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::metadata::ProducerMetadata;

    fn config_with(retention: RetentionPolicy, capacity: usize) -> MetadataConfig {
        MetadataConfig {
            cache_capacity: NonZeroUsize::new(capacity).expect("non-zero capacity"),
            retention,
            ..MetadataConfig::default()
        }
    }

    fn metadata(codec: &str) -> StreamMetadata {
        StreamMetadata {
            producers: vec![ProducerMetadata {
                url: None,
                medias: vec![format!("audio, recvonly, {codec}")],
            }],
        }
    }

    fn names(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_merge_and_lookup() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::RetainStale, 8));
        cache.merge(HashMap::from([("front_sub".to_string(), metadata("AAC"))]));

        assert!(cache.lookup("front_sub").is_some());
        assert!(cache.lookup("back_sub").is_none());
        assert!(cache.entry("front_sub").is_some());
    }

    #[test]
    fn test_missing_from_reports_unfetched_names() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::RetainStale, 8));
        cache.merge(HashMap::from([("front_sub".to_string(), metadata("AAC"))]));

        let missing = cache.missing_from(&names(&["front_sub", "back_sub"]));
        assert_eq!(missing, names(&["back_sub"]));
    }

    #[test]
    fn test_retain_stale_keeps_unneeded_entries() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::RetainStale, 8));
        cache.merge(HashMap::from([("front_sub".to_string(), metadata("AAC"))]));

        cache.apply_retention(&names(&["back_sub"]));
        assert!(cache.lookup("front_sub").is_some());
    }

    #[test]
    fn test_drop_unneeded_prunes_entries() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::DropUnneeded, 8));
        cache.merge(HashMap::from([
            ("front_sub".to_string(), metadata("AAC")),
            ("back_sub".to_string(), metadata("OPUS")),
        ]));

        cache.apply_retention(&names(&["front_sub"]));
        assert!(cache.lookup("front_sub").is_some());
        assert!(cache.lookup("back_sub").is_none());
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::RetainStale, 2));
        cache.merge(HashMap::from([("a".to_string(), metadata("AAC"))]));
        cache.merge(HashMap::from([("b".to_string(), metadata("AAC"))]));
        cache.merge(HashMap::from([("c".to_string(), metadata("AAC"))]));

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut cache = MetadataCache::new(&config_with(RetentionPolicy::RetainStale, 8));
        let fetched = HashMap::from([("front_sub".to_string(), metadata("AAC"))]);

        cache.merge(fetched.clone());
        let first = cache.lookup("front_sub").cloned();
        cache.merge(fetched);
        let second = cache.lookup("front_sub").cloned();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }
}
