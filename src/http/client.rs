//! The client facade and request pipeline.
//!
//! # Responsibilities
//! - Resolve the current best host per outbound request
//! - Attach the session credential and mirror it back from responses
//! - Append the request signature
//! - Expose plain verb methods; response bodies are returned unparsed

use std::fmt;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::config::{validate_config, ClientConfig};
use crate::error::{Error, Result};
use crate::selector::BestServerSelector;
use crate::signing::{signer, ClockSync, HttpTimeSource, TimeSource};
use crate::storage::{MemoryStorage, Storage};

/// HTTP client facade over the host-selection engine and request signer.
pub struct MultiServerClient {
    client: reqwest::Client,
    config: ClientConfig,
    selector: Arc<BestServerSelector>,
    clock: Arc<ClockSync>,
    storage: Arc<dyn Storage>,
    session_key: String,
}

impl MultiServerClient {
    /// Build a client with in-memory storage.
    ///
    /// Fails synchronously on misconfiguration (missing `project_key`, empty
    /// host list, invalid host URLs); this is the only construction failure
    /// mode.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_storage(config, Arc::new(MemoryStorage::new()))
    }

    /// Build a client over caller-provided storage (session credential and
    /// discovery host cache live there).
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let client = reqwest::Client::new();
        let time_source = Arc::new(HttpTimeSource::new(client.clone(), config.time_url.clone()));
        Self::with_parts(config, storage, client, time_source)
    }

    /// Build a client with every collaborator injected. The time source seam
    /// replaces environment sniffing: pass whatever clock the host runtime
    /// provides.
    pub fn with_parts(
        config: ClientConfig,
        storage: Arc<dyn Storage>,
        client: reqwest::Client,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        validate_config(&config).map_err(|errors| {
            Error::Config(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;

        let selector = Arc::new(BestServerSelector::new(
            &config,
            Arc::clone(&storage),
            client.clone(),
        ));
        let clock = Arc::new(ClockSync::new(time_source));
        let session_key = config.session_storage_key();

        tracing::debug!(
            project = %config.project_key,
            hosts = config.hosts.len(),
            signing = !config.sign_key.is_empty(),
            session = config.session_enabled,
            "Client constructed"
        );

        Ok(Self {
            client,
            config,
            selector,
            clock,
            storage,
            session_key,
        })
    }

    /// The selection engine, for direct refreshes and observability.
    pub fn selector(&self) -> &Arc<BestServerSelector> {
        &self.selector
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T>(&self, path: &str, body: &T) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T>(&self, path: &str, body: &T) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    /// The full request pipeline. `path` is either root-relative (routed to
    /// the current best host, signed, session-tracked) or an absolute URL
    /// (sent as-is, never signed).
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<reqwest::Response>
    where
        T: Serialize + ?Sized,
    {
        let url = self.resolve_url(path).await?;
        let mut request = self.client.request(method, url);

        if self.config.session_enabled {
            if let Some(authorization) = self.storage.get(&self.session_key) {
                request = request.header(AUTHORIZATION, authorization);
            }
        }

        if let Some(sign) = signer::sign_path(path, &self.config.sign_key, &self.clock).await {
            request = request.query(&[("sign", sign)]);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        self.mirror_session(&response);
        Ok(response)
    }

    async fn resolve_url(&self, path: &str) -> Result<Url> {
        if !path.starts_with('/') {
            // Absolute URLs bypass host selection entirely.
            return Ok(Url::parse(path)?);
        }
        let best = self.selector.best_server(false).await;
        Ok(Url::parse(&format!("{}{}", best.host, path))?)
    }

    /// Mirror the `Authorization` response header into storage: a value
    /// replaces the session credential, an empty value deletes it, absence
    /// leaves it untouched.
    fn mirror_session(&self, response: &reqwest::Response) {
        if !self.config.session_enabled {
            return;
        }
        let Some(value) = response.headers().get(AUTHORIZATION) else {
            return;
        };
        match value.to_str() {
            Ok("") => {
                self.storage.remove(&self.session_key);
                tracing::debug!("Session credential cleared");
            }
            Ok(token) => {
                self.storage.set(&self.session_key, token);
                tracing::debug!("Session credential updated");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring non-UTF8 Authorization response header");
            }
        }
    }
}

impl fmt::Debug for MultiServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiServerClient")
            .field("project_key", &self.config.project_key)
            .field("hosts", &self.config.hosts.len())
            .field("session_enabled", &self.config.session_enabled)
            .finish_non_exhaustive()
    }
}
