//! Client configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or in-code struct
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → shared by the facade, selector and signer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the client is constructed
//! - All fields except `project_key` and `hosts` have defaults
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every violation, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ClientConfig, HostConfig};
pub use validation::{validate_config, ValidationError};
