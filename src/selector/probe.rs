//! Timed health-check probes.
//!
//! # Responsibilities
//! - Time a single host's response to the health-check path
//! - Race the network call against a hard timeout
//! - Fold every transport failure into an `ok = false` result
//!
//! A probe never fails as far as the caller is concerned: the result is
//! delivered exactly once, whichever of the network call and the timer
//! finishes first. The losing branch is dropped.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::time;

/// Outcome of probing one host. Ephemeral: consumed by the selector when it
/// ranks a round, then kept only for observability.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub host: String,
    pub elapsed_ms: u64,
    pub ok: bool,
    pub error: Option<String>,
    /// Replacement host list parsed from a discovery response body. The
    /// selector persists it for future pool merges.
    pub discovered: Option<Vec<String>>,
}

impl ProbeResult {
    fn failure(host: &str, elapsed_ms: u64, error: String) -> Self {
        Self {
            host: host.to_string(),
            elapsed_ms,
            ok: false,
            error: Some(error),
            discovered: None,
        }
    }
}

/// Expected shape of a discovery response: `{"data":{"hosts":[...]}}`.
#[derive(Debug, Deserialize)]
struct DiscoveryBody {
    data: DiscoveryData,
}

#[derive(Debug, Deserialize)]
struct DiscoveryData {
    hosts: Vec<String>,
}

/// Probe a single host: `GET {host}{test_path}` under a hard timeout.
pub async fn probe(
    client: &reqwest::Client,
    host: &str,
    test_path: &str,
    timeout: Duration,
) -> ProbeResult {
    let url = format!("{}{}", host, test_path);
    let start = Instant::now();

    let outcome = time::timeout(timeout, client.get(&url).send()).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(response)) => inspect_response(host, elapsed_ms, response).await,
        Ok(Err(e)) => {
            tracing::warn!(host = %host, error = %e, "Probe failed: connection error");
            ProbeResult::failure(host, elapsed_ms, e.to_string())
        }
        Err(_) => {
            tracing::warn!(
                host = %host,
                timeout_ms = timeout.as_millis() as u64,
                "Probe failed: timeout"
            );
            ProbeResult::failure(host, elapsed_ms, "timeout".to_string())
        }
    }
}

async fn inspect_response(host: &str, elapsed_ms: u64, response: reqwest::Response) -> ProbeResult {
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(host = %host, status = %status, "Probe failed: non-success status");
        return ProbeResult::failure(host, elapsed_ms, format!("status {}", status));
    }

    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    let mut discovered = None;
    if is_json {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Probe failed: unreadable body");
                return ProbeResult::failure(host, elapsed_ms, e.to_string());
            }
        };
        // A JSON health response must carry the discovery shape; anything
        // else is not a usable endpoint answer.
        match serde_json::from_str::<DiscoveryBody>(&body) {
            Ok(parsed) => discovered = Some(parsed.data.hosts),
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Probe failed: malformed discovery body");
                return ProbeResult::failure(host, elapsed_ms, format!("malformed discovery body: {}", e));
            }
        }
    }

    tracing::debug!(host = %host, elapsed_ms, "Probe succeeded");
    ProbeResult {
        host: host.to_string(),
        elapsed_ms,
        ok: true,
        error: None,
        discovered,
    }
}
