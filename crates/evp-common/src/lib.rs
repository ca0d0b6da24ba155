//! EVP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error and logging plumbing for the EVP workspace members.
//!
//! # Example
//!
//! ```no_run
//! use evp_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!
//!     info!("Pipeline started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{EvpError, Result};
