//! Request signing subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound root-relative request
//!     → clock.rs (local-to-remote offset; fetched once, cached for the
//!       process lifetime, shared across concurrent first signers)
//!     → signer.rs (timestamp + nonce + caller id + digest)
//!     → `sign` query parameter appended to the request
//! ```
//!
//! # Design Decisions
//! - Signing is a silent no-op without a secret key or for absolute URLs
//! - The time source is an injected capability chosen at construction, not
//!   a runtime environment check
//! - The digest is a fast non-cryptographic MD5 for casual tamper and
//!   replay resistance only; it is not a security boundary

pub mod clock;
pub mod signer;

pub use clock::{ClockSync, HttpTimeSource, RemoteTime, SyncState, TimeSource};
pub use signer::{sign_path, signature};
