//! Best-server selection subsystem.
//!
//! # Data Flow
//! ```text
//! Request needs a host
//!     → best.rs (cache fresh? return cached answer)
//!     → pool.rs (merge static hosts + persisted discovery cache)
//!     → probe.rs (time a health check per host, all concurrently)
//!     → best.rs (rank results, elect winner, cache with TTL)
//!     → discovery responses rewrite the persisted host cache
//! ```
//!
//! # Design Decisions
//! - A selection round is all-or-nothing: it completes only once every
//!   probe has resolved, so partial completion never elects a winner
//! - Rounds are single-flighted; contenders adopt the round they waited on
//! - Probe failures never propagate; a round with no usable winner retries
//!   at a fixed cadence until one appears
//! - Discovery hosts feed the pool but are never elected themselves

pub mod best;
pub mod pool;
pub mod probe;

pub use best::{BestServer, BestServerSelector};
pub use pool::HostEntry;
pub use probe::ProbeResult;
