//! fee-server: fee aggregation and payment reconciliation service
//!
//! - [`fees`]: the engine (quarter splitter, aggregator, ledger reducer, status classifier)
//! - [`gateway`]: payment integrity verifier
//! - [`db`]: store interfaces and implementations
//! - [`services`] and [`api`]: orchestration and HTTP surface

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod services;
pub mod state;

pub use config::Config;
pub use state::AppState;
