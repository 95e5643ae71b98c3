//! Crate error type.
//!
//! Only construction-time misconfiguration surfaces synchronously; probe and
//! selection failures are recovered internally and never reach the caller as
//! errors (see the selector module).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client facade.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid construction parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure of an application request.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be assembled.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A remote time source returned an unusable response.
    #[error("time sync error: {0}")]
    TimeSync(String),
}
