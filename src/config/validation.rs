//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required construction parameters (`project_key`, `hosts`)
//! - Validate value ranges (timeouts > 0) and host URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the client

use std::fmt;

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic violation in a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingProjectKey,
    NoHosts,
    InvalidHostUrl { url: String, reason: String },
    ZeroProbeTimeout,
    ZeroRefreshInterval,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingProjectKey => {
                write!(f, "project_key is required and must be non-empty")
            }
            ValidationError::NoHosts => write!(f, "hosts must contain at least one entry"),
            ValidationError::InvalidHostUrl { url, reason } => {
                write!(f, "invalid host url '{}': {}", url, reason)
            }
            ValidationError::ZeroProbeTimeout => write!(f, "probe_timeout_ms must be > 0"),
            ValidationError::ZeroRefreshInterval => write!(f, "refresh_interval_ms must be > 0"),
        }
    }
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.project_key.trim().is_empty() {
        errors.push(ValidationError::MissingProjectKey);
    }

    if config.hosts.is_empty() {
        errors.push(ValidationError::NoHosts);
    }
    for host in &config.hosts {
        if let Err(e) = Url::parse(&host.url) {
            errors.push(ValidationError::InvalidHostUrl {
                url: host.url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.probe_timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }
    if config.refresh_interval_ms == 0 {
        errors.push(ValidationError::ZeroRefreshInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
