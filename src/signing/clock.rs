//! Clock synchronization.
//!
//! # Responsibilities
//! - Obtain a remote reference time once per process
//! - Cache the local-to-remote offset for signature timestamps
//! - Share one in-flight fetch between concurrent first signers
//!
//! The offset is never invalidated: there is no periodic resync. While no
//! time source is reachable, initialization polls at a fixed cadence rather
//! than failing, so signing blocks instead of erroring.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio::time;

use crate::error::{Error, Result};

/// Poll cadence while no time source is reachable.
const SYNC_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Reference time reported by a remote source.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RemoteTime {
    /// Remote epoch seconds.
    pub t: u64,
}

/// Cached synchronization result. Set once per process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct SyncState {
    /// Delta to add to local epoch milliseconds to obtain remote time.
    pub offset_ms: i64,
    pub remote_epoch_secs: u64,
}

/// A source of authoritative remote time, injected at construction.
#[async_trait]
pub trait TimeSource: Send + Sync {
    async fn fetch(&self) -> Result<RemoteTime>;
}

/// Fetches remote time over HTTP. Accepts a plain JSON body or a JSON
/// literal wrapped in a script assignment (`Var={...};`).
pub struct HttpTimeSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTimeSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TimeSource for HttpTimeSource {
    async fn fetch(&self) -> Result<RemoteTime> {
        let body = self.client.get(&self.url).send().await?.text().await?;
        parse_time_body(&body)
    }
}

/// Extract the JSON object from either body form and read its `t` field.
pub(crate) fn parse_time_body(body: &str) -> Result<RemoteTime> {
    let start = body
        .find('{')
        .ok_or_else(|| Error::TimeSync("no JSON object in time response".to_string()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| Error::TimeSync("unterminated JSON object in time response".to_string()))?;
    if end < start {
        return Err(Error::TimeSync("malformed time response".to_string()));
    }

    serde_json::from_str(&body[start..=end]).map_err(|e| Error::TimeSync(e.to_string()))
}

/// Caches the local-to-remote clock offset for the process lifetime.
pub struct ClockSync {
    source: Arc<dyn TimeSource>,
    state: OnceCell<SyncState>,
}

impl ClockSync {
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            state: OnceCell::new(),
        }
    }

    /// The cached offset in milliseconds, fetching it on first use.
    pub async fn offset_ms(&self) -> i64 {
        self.sync_state().await.offset_ms
    }

    /// The cached synchronization state, fetching it on first use.
    ///
    /// Concurrent first callers share a single in-flight fetch. While every
    /// fetch attempt fails this polls at a fixed cadence, so callers block
    /// until a source becomes available.
    pub async fn sync_state(&self) -> SyncState {
        *self
            .state
            .get_or_init(|| async {
                loop {
                    match self.source.fetch().await {
                        Ok(remote) => {
                            let offset_ms = (remote.t as i64) * 1000 - epoch_ms_i64();
                            tracing::info!(
                                offset_ms,
                                remote_epoch_secs = remote.t,
                                "Clock synchronized"
                            );
                            return SyncState {
                                offset_ms,
                                remote_epoch_secs: remote.t,
                            };
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                retry_ms = SYNC_RETRY_DELAY.as_millis() as u64,
                                "Clock sync failed, retrying"
                            );
                            time::sleep(SYNC_RETRY_DELAY).await;
                        }
                    }
                }
            })
            .await
    }
}

pub(crate) fn epoch_ms_i64() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let remote = parse_time_body(r#"{"s":"o","t":1700000000,"ip":"1.2.3.4"}"#).unwrap();
        assert_eq!(remote.t, 1_700_000_000);
    }

    #[test]
    fn test_parse_script_wrapped_json() {
        let remote = parse_time_body(r#"QZOutputJson={"s":"o","t":1700000123};"#).unwrap();
        assert_eq!(remote.t, 1_700_000_123);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_time_body("service unavailable").is_err());
        assert!(parse_time_body(r#"{"s":"o"}"#).is_err());
    }

    #[tokio::test]
    async fn test_offset_cached_after_first_fetch() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct CountingSource(AtomicU32);

        #[async_trait]
        impl TimeSource for CountingSource {
            async fn fetch(&self) -> Result<RemoteTime> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(RemoteTime { t: 1_700_000_000 })
            }
        }

        let source = Arc::new(CountingSource(AtomicU32::new(0)));
        let clock = ClockSync::new(source.clone());

        let first = clock.sync_state().await;
        let second = clock.sync_state().await;
        assert_eq!(first.remote_epoch_secs, second.remote_epoch_secs);
        assert_eq!(first.offset_ms, second.offset_ms);
        assert_eq!(source.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_polls_until_source_recovers() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct FlakySource(AtomicU32);

        #[async_trait]
        impl TimeSource for FlakySource {
            async fn fetch(&self) -> Result<RemoteTime> {
                if self.0.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::TimeSync("unreachable".to_string()))
                } else {
                    Ok(RemoteTime { t: 1_700_000_000 })
                }
            }
        }

        let clock = ClockSync::new(Arc::new(FlakySource(AtomicU32::new(0))));
        let state = clock.sync_state().await;
        assert_eq!(state.remote_epoch_secs, 1_700_000_000);
    }
}
