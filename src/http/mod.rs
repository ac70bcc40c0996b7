//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, request ID)
//!     → handlers.rs (decode body, call the transfer service)
//!     → ledger subsystem (build / sign / submit / confirm)
//!     → handlers.rs (map outcome or error to a JSON response)
//! ```

pub mod handlers;
pub mod server;

pub use server::HttpServer;
