//! Shared types for the school fee engine
//!
//! Domain models consumed by both the engine and the HTTP layer,
//! the unified error system, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
