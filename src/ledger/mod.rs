//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (secret keys, RPC URL)
//!     → signer.rs (key decoding, process identities)
//!     → client.rs (RPC connection, anchor/nonce/rent queries)
//!     → service.rs (build, sign, submit, confirm)
//! ```
//!
//! # Security Constraints
//! - Secret keys ONLY from environment variables
//! - Never log secret keys, only derived addresses
//! - All RPC calls share one configurable timeout
//! - The stale-nonce race is classified, not prevented

pub mod client;
pub mod service;
pub mod signer;
pub mod types;

pub use client::LedgerClient;
pub use service::TransferService;
pub use signer::ServiceSigners;
pub use types::{LedgerError, LedgerResult, TransactionVersion, TransferOutcome, TransferRequest};
