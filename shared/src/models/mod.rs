//! Data models
//!
//! Shared between the engine and the HTTP layer.
//! All IDs are `i64`; all money is [`Amount`] in minor units.

pub mod amount;
pub mod fee;
pub mod ledger;
pub mod payment;
pub mod student;

// Re-exports
pub use amount::*;
pub use fee::*;
pub use ledger::*;
pub use payment::*;
pub use student::*;
