//! fb-core: stable foundation for fbflow.
//!
//! Contains:
//! - ids (compact IDs for blocks, ports and links)
//! - signal (signal type tags and payloads)
//! - table (parameter and result tables)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod signal;
pub mod table;

// Re-exports: nice ergonomics for downstream crates
pub use error::{FbError, FbResult};
pub use ids::*;
pub use signal::*;
pub use table::*;
