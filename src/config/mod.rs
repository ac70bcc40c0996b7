//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables
//!     → loader.rs (lookup & parse)
//!     → GatewayConfig (validated, immutable)
//!     → shared with the server and ledger subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no safe degraded mode, so a
//!   missing required variable aborts startup
//! - The loader is pure over a lookup function for testability

pub mod loader;
pub mod schema;

pub use loader::{from_env, ConfigError};
pub use schema::{GatewayConfig, ObservabilityConfig};
