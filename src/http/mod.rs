//! HTTP facade subsystem.
//!
//! # Data Flow
//! ```text
//! get/post/put/delete(path)
//!     → selector (current best host)
//!     → storage  (attach session Authorization header)
//!     → signing  (append `sign` query parameter)
//!     → reqwest send
//!     → storage  (mirror Authorization response header back)
//! ```

pub mod client;

pub use client::MultiServerClient;
