//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the multi-server client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Project identifier. Prefixes the persisted storage keys
    /// (`{project_key}_session`, `{project_key}_hosts`). Required.
    pub project_key: String,

    /// Candidate server endpoints. Required, non-empty. The first entry is
    /// the placeholder answer before any probing has happened.
    pub hosts: Vec<HostConfig>,

    /// Health-check path probed on every host during a selection round.
    /// `None` switches to single static endpoint mode: the first host is
    /// adopted unconditionally and no probing ever happens.
    pub probe_path: Option<String>,

    /// Per-probe timeout in milliseconds.
    pub probe_timeout_ms: u64,

    /// How long a selected best server stays fresh, in milliseconds.
    pub refresh_interval_ms: u64,

    /// Mirror the `Authorization` header through storage under
    /// `{project_key}_session`.
    pub session_enabled: bool,

    /// Secret used to sign root-relative request URLs. Empty disables
    /// signing.
    pub sign_key: String,

    /// Remote clock endpoint used for signature timestamps. Must answer with
    /// a JSON body (optionally wrapped in a script assignment) exposing at
    /// least `t`, the remote epoch seconds.
    pub time_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            hosts: Vec::new(),
            probe_path: Some("/hosts".to_string()),
            probe_timeout_ms: 3_000,
            refresh_interval_ms: 60_000,
            session_enabled: false,
            sign_key: String::new(),
            time_url: "https://vv.video.qq.com/checktime?otype=json".to_string(),
        }
    }
}

impl ClientConfig {
    /// Storage key holding the session credential.
    pub fn session_storage_key(&self) -> String {
        format!("{}_session", self.project_key)
    }

    /// Storage key holding the persisted discovery host list.
    pub fn hosts_storage_key(&self) -> String {
        format!("{}_hosts", self.project_key)
    }
}

/// A single candidate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HostConfig {
    /// Endpoint base URL (scheme + authority, no trailing slash).
    pub url: String,

    /// Discovery hosts answer probes with a replacement host list and are
    /// never themselves selected to serve traffic.
    #[serde(default)]
    pub discovery: bool,
}

impl HostConfig {
    /// A plain serving endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovery: false,
        }
    }

    /// A discovery endpoint: probed for a replacement host list, never
    /// selected to serve traffic.
    pub fn discovery(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            discovery: true,
        }
    }
}
