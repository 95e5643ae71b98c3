//! Best-server election.
//!
//! # Responsibilities
//! - Fan probes out across the whole host pool and collect every result
//! - Rank results and elect the fastest usable non-discovery host
//! - Cache the winner with a TTL and serialize refreshes (single-flight)
//! - Persist replacement host lists returned by discovery probes
//!
//! # Design Decisions
//! - The current answer lives behind an RwLock and is only replaced when a
//!   round produces a winner; a failed round leaves it stale-but-valid
//! - Refresh rounds are serialized by an async mutex. Contenders that queued
//!   behind an in-flight round re-check freshness after acquiring it and
//!   adopt that round's result instead of probing again
//! - A round with no usable winner retries forever at a fixed cadence;
//!   callers block until some host recovers. Each miss is logged

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use tokio::sync::{Mutex, RwLock};
use tokio::time;

use crate::config::ClientConfig;
use crate::selector::pool::{self, HostEntry};
use crate::selector::probe::{self, ProbeResult};
use crate::storage::Storage;

/// Speed reported when the first host is adopted without probing.
const STATIC_MODE_SPEED: i64 = 100;
/// Delay before re-running a round that produced no usable winner.
const ROUND_RETRY_DELAY: Duration = Duration::from_millis(500);

/// The single shared answer: the fastest known usable host.
#[derive(Debug, Clone)]
pub struct BestServer {
    pub host: String,
    /// Probe latency of the electing round in milliseconds; `-1` before any
    /// round has completed.
    pub speed: i64,
    pub ok: bool,
    /// Epoch milliseconds of the round that elected this host; `0` for the
    /// construction placeholder.
    pub selected_at: u64,
    /// Ranked results of the electing round, fastest first.
    pub results: Vec<ProbeResult>,
}

/// Orchestrates probe rounds over the host pool and owns the cached answer.
pub struct BestServerSelector {
    client: reqwest::Client,
    storage: Arc<dyn Storage>,
    static_hosts: Vec<HostEntry>,
    probe_path: Option<String>,
    probe_timeout: Duration,
    refresh_interval_ms: u64,
    hosts_key: String,
    current: RwLock<BestServer>,
    round_lock: Mutex<()>,
}

impl BestServerSelector {
    /// Precondition: `config` has passed validation (non-empty host list).
    pub(crate) fn new(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
        client: reqwest::Client,
    ) -> Self {
        let static_hosts: Vec<HostEntry> = config.hosts.iter().map(HostEntry::from).collect();
        let first_host = static_hosts
            .first()
            .map(|entry| entry.url.clone())
            .unwrap_or_default();

        Self {
            client,
            storage,
            static_hosts,
            probe_path: config.probe_path.clone(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
            refresh_interval_ms: config.refresh_interval_ms,
            hosts_key: config.hosts_storage_key(),
            current: RwLock::new(BestServer {
                host: first_host,
                speed: -1,
                ok: false,
                selected_at: 0,
                results: Vec::new(),
            }),
            round_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the cached answer; never triggers probing.
    pub async fn current(&self) -> BestServer {
        self.current.read().await.clone()
    }

    /// The current best server, refreshing it when stale. `force` bypasses
    /// the TTL and always runs a fresh round.
    ///
    /// Never fails: under a total outage this keeps retrying at a fixed
    /// cadence and only returns once some host succeeds.
    pub async fn best_server(self: &Arc<Self>, force: bool) -> BestServer {
        // Single static endpoint mode: nothing to probe, ever.
        let Some(test_path) = self.probe_path.clone() else {
            return self.adopt_first_host().await;
        };

        if !force {
            let pool = self.merged_pool();
            let non_discovery = pool.iter().filter(|entry| !entry.discovery).count();
            if non_discovery == 1 {
                // With a single candidate a caller is never blocked on a full
                // race: hand back the cached answer and validate it in the
                // background when it needs refreshing.
                let snapshot = self.current().await;
                if self.needs_refresh(&snapshot) {
                    let selector = Arc::clone(self);
                    tokio::spawn(async move {
                        selector.force_refresh().await;
                    });
                }
                return snapshot;
            }

            let snapshot = self.current().await;
            if !self.needs_refresh(&snapshot) {
                return snapshot;
            }
        }

        // Single-flight: one round at a time. A contender that waited here
        // re-checks freshness and adopts the finished round's answer.
        let _round = self.round_lock.lock().await;
        if !force {
            let snapshot = self.current().await;
            if !self.needs_refresh(&snapshot) {
                return snapshot;
            }
        }
        self.run_rounds(&test_path).await
    }

    /// Background validation entry point: runs a fresh round regardless of
    /// cache freshness.
    async fn force_refresh(&self) {
        let Some(test_path) = self.probe_path.clone() else {
            return;
        };
        let _round = self.round_lock.lock().await;
        self.run_rounds(&test_path).await;
    }

    /// Run selection rounds until one elects a winner, then publish it.
    /// Caller must hold the round lock.
    async fn run_rounds(&self, test_path: &str) -> BestServer {
        loop {
            let pool = self.merged_pool();
            match self.run_round(&pool, test_path).await {
                Some(winner) => {
                    tracing::info!(
                        host = %winner.host,
                        speed_ms = winner.speed,
                        candidates = pool.len(),
                        "Best server elected"
                    );
                    let mut current = self.current.write().await;
                    *current = winner.clone();
                    return winner;
                }
                None => {
                    tracing::warn!(
                        candidates = pool.len(),
                        retry_ms = ROUND_RETRY_DELAY.as_millis() as u64,
                        "Selection round produced no usable host, retrying"
                    );
                    time::sleep(ROUND_RETRY_DELAY).await;
                }
            }
        }
    }

    /// One fan-out/fan-in cycle. Returns `None` when every host failed or
    /// only discovery hosts succeeded.
    async fn run_round(&self, pool: &[HostEntry], test_path: &str) -> Option<BestServer> {
        tracing::debug!(candidates = pool.len(), path = %test_path, "Probing host pool");

        let probes = pool
            .iter()
            .map(|entry| probe::probe(&self.client, &entry.url, test_path, self.probe_timeout));
        let mut results = join_all(probes).await;

        // Persist replacement host lists before ranking. The in-flight pool
        // stays untouched; future merges pick the cache up.
        for result in &results {
            if let Some(hosts) = &result.discovered {
                pool::write_cached_hosts(self.storage.as_ref(), &self.hosts_key, hosts);
                tracing::info!(
                    host = %result.host,
                    discovered = hosts.len(),
                    "Discovery host cache updated"
                );
            }
        }

        rank_results(&mut results);
        let (host, speed) = {
            let winner = pick_winner(&results, |host| self.is_discovery(host))?;
            (winner.host.clone(), winner.elapsed_ms as i64)
        };

        Some(BestServer {
            host,
            speed,
            ok: true,
            selected_at: epoch_ms(),
            results,
        })
    }

    /// Adopt the first configured host unconditionally (no health-check path
    /// configured).
    async fn adopt_first_host(&self) -> BestServer {
        let mut current = self.current.write().await;
        if !current.ok {
            current.ok = true;
            current.speed = STATIC_MODE_SPEED;
            current.selected_at = epoch_ms();
            tracing::debug!(host = %current.host, "Adopted static endpoint without probing");
        }
        current.clone()
    }

    fn merged_pool(&self) -> Vec<HostEntry> {
        let cached = pool::read_cached_hosts(self.storage.as_ref(), &self.hosts_key);
        pool::merge_hosts(&self.static_hosts, &cached)
    }

    /// A cached answer needs a round when it is the construction placeholder,
    /// points at a discovery host (the pool was never resolved to real
    /// endpoints), or its TTL elapsed.
    fn needs_refresh(&self, best: &BestServer) -> bool {
        !best.ok
            || self.is_discovery(&best.host)
            || epoch_ms().saturating_sub(best.selected_at) > self.refresh_interval_ms
    }

    /// Discovery tags only ever come from static configuration; discovered
    /// hosts are always plain serving endpoints.
    fn is_discovery(&self, host: &str) -> bool {
        self.static_hosts
            .iter()
            .any(|entry| entry.discovery && entry.url == host)
    }
}

/// Ascending elapsed time; the stable sort keeps pool order for ties.
fn rank_results(results: &mut [ProbeResult]) {
    results.sort_by_key(|result| result.elapsed_ms);
}

/// The fastest successful non-discovery entry of a ranked round.
fn pick_winner<F>(results: &[ProbeResult], is_discovery: F) -> Option<&ProbeResult>
where
    F: Fn(&str) -> bool,
{
    results
        .iter()
        .find(|result| result.ok && !is_discovery(&result.host))
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(host: &str, elapsed_ms: u64, ok: bool) -> ProbeResult {
        ProbeResult {
            host: host.into(),
            elapsed_ms,
            ok,
            error: None,
            discovered: None,
        }
    }

    #[test]
    fn test_winner_is_fastest_ok() {
        let mut results = vec![
            result("https://a", 50, true),
            result("https://b", 30, false),
            result("https://c", 80, true),
        ];
        rank_results(&mut results);
        let winner = pick_winner(&results, |_| false).unwrap();
        assert_eq!(winner.host, "https://a");
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let mut results = vec![
            result("https://a", 40, true),
            result("https://b", 40, true),
            result("https://c", 40, true),
        ];
        rank_results(&mut results);
        let winner = pick_winner(&results, |_| false).unwrap();
        assert_eq!(winner.host, "https://a");
    }

    #[test]
    fn test_all_failed_elects_nobody() {
        let mut results = vec![result("https://a", 3000, false), result("https://b", 10, false)];
        rank_results(&mut results);
        assert!(pick_winner(&results, |_| false).is_none());
    }

    #[test]
    fn test_discovery_host_never_wins() {
        let mut results = vec![result("https://seed", 5, true), result("https://a", 90, true)];
        rank_results(&mut results);
        let winner = pick_winner(&results, |host| host == "https://seed").unwrap();
        assert_eq!(winner.host, "https://a");
    }

    #[test]
    fn test_only_discovery_succeeded_elects_nobody() {
        let mut results = vec![result("https://seed", 5, true), result("https://a", 90, false)];
        rank_results(&mut results);
        assert!(pick_winner(&results, |host| host == "https://seed").is_none());
    }
}
