//! Host pool management.
//!
//! # Responsibilities
//! - Merge static configuration with the persisted discovery host cache
//! - Collapse duplicate host URLs (first occurrence wins)
//! - Read/write the `{project_key}_hosts` cache entry

use std::collections::HashSet;

use crate::config::HostConfig;
use crate::storage::Storage;

/// A candidate endpoint inside one selection round. Immutable per round; the
/// pool itself may grow between rounds via discovery merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub url: String,
    pub discovery: bool,
}

impl From<&HostConfig> for HostEntry {
    fn from(config: &HostConfig) -> Self {
        Self {
            url: config.url.clone(),
            discovery: config.discovery,
        }
    }
}

/// Set union of static and cached discovery hosts. Insertion order is kept
/// for deterministic tie-breaking, duplicates collapse.
pub fn merge_hosts(static_hosts: &[HostEntry], cached: &[String]) -> Vec<HostEntry> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(static_hosts.len() + cached.len());

    for entry in static_hosts {
        if seen.insert(entry.url.clone()) {
            merged.push(entry.clone());
        }
    }
    for url in cached {
        if seen.insert(url.clone()) {
            merged.push(HostEntry {
                url: url.clone(),
                discovery: false,
            });
        }
    }
    merged
}

/// Read the persisted discovery host cache. Malformed entries are discarded
/// rather than surfaced; the static configuration always remains usable.
pub fn read_cached_hosts(storage: &dyn Storage, key: &str) -> Vec<String> {
    let Some(raw) = storage.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(hosts) => hosts,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding malformed discovery host cache");
            Vec::new()
        }
    }
}

/// Replace the persisted discovery host cache with `hosts`.
pub fn write_cached_hosts(storage: &dyn Storage, key: &str, hosts: &[String]) {
    if let Ok(raw) = serde_json::to_string(hosts) {
        storage.set(key, &raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn entry(url: &str) -> HostEntry {
        HostEntry {
            url: url.into(),
            discovery: false,
        }
    }

    #[test]
    fn test_merge_dedupes_overlap() {
        let static_hosts = vec![entry("https://a"), entry("https://b")];
        let cached = vec!["https://b".to_string(), "https://c".to_string()];

        let merged = merge_hosts(&static_hosts, &cached);
        let urls: Vec<_> = merged.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b", "https://c"]);
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let static_hosts = vec![entry("https://a")];
        let cached = vec!["https://a".to_string(), "https://x".to_string()];

        let first = merge_hosts(&static_hosts, &cached);
        let second = merge_hosts(&first, &cached);
        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_discovery_tag_survives_merge() {
        let static_hosts = vec![HostEntry {
            url: "https://seed".into(),
            discovery: true,
        }];
        let cached = vec!["https://real".to_string()];

        let merged = merge_hosts(&static_hosts, &cached);
        assert!(merged[0].discovery);
        // Discovered hosts are plain serving endpoints.
        assert!(!merged[1].discovery);
    }

    #[test]
    fn test_cache_roundtrip_and_malformed() {
        let storage = MemoryStorage::new();
        write_cached_hosts(&storage, "p_hosts", &["https://x".to_string()]);
        assert_eq!(
            read_cached_hosts(&storage, "p_hosts"),
            vec!["https://x".to_string()]
        );

        storage.set("p_hosts", "{not json");
        assert!(read_cached_hosts(&storage, "p_hosts").is_empty());
    }
}
