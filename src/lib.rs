//! Solana Transfer Gateway Library

pub mod config;
pub mod http;
pub mod ledger;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use ledger::TransferService;
