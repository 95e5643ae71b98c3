//! Multi-Server HTTP Client
//!
//! An HTTP client facade that transparently picks the fastest of several
//! candidate server endpoints, keeps that choice fresh, signs outgoing
//! requests with a time-synchronized token, and mirrors a session credential
//! through pluggable storage.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │             MULTI-SERVER CLIENT               │
//!                       │                                               │
//!  get/post/put/delete  │  ┌──────────┐      ┌───────────────────────┐  │
//!  ─────────────────────┼─▶│   http   │─────▶│  selector             │  │
//!                       │  │  client  │      │  (probe fan-out,      │  │
//!                       │  └────┬─────┘      │   ranking, TTL cache, │  │
//!                       │       │            │   discovery merge)    │  │
//!                       │       │            └───────────┬───────────┘  │
//!                       │       ▼                        │              │
//!                       │  ┌──────────┐           ┌──────▼──────┐       │
//!                       │  │ signing  │           │   storage   │       │
//!                       │  │ (clock + │           │  (session,  │       │
//!                       │  │  digest) │           │ hosts cache)│       │
//!                       │  └──────────┘           └─────────────┘       │
//!                       └───────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use multiserver_client::{ClientConfig, HostConfig, MultiServerClient};
//!
//! # async fn example() -> Result<(), multiserver_client::Error> {
//! let mut config = ClientConfig::default();
//! config.project_key = "myproject".into();
//! config.hosts = vec![
//!     HostConfig::new("https://a.example.com"),
//!     HostConfig::new("https://b.example.com"),
//! ];
//!
//! let client = MultiServerClient::new(config)?;
//! let response = client.get("/api/items").await?;
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod selector;
pub mod signing;

// Cross-cutting concerns
pub mod error;
pub mod storage;

pub use config::{ClientConfig, HostConfig};
pub use error::{Error, Result};
pub use http::MultiServerClient;
pub use selector::{BestServer, BestServerSelector};
pub use signing::{ClockSync, TimeSource};
pub use storage::{MemoryStorage, Storage};
