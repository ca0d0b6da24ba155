//! EVP Pipeline Library
//!
//! A scheduled batch pipeline that pulls newly produced XML event files from
//! an FTP endpoint, splits their user records around the mean age, and
//! publishes the resulting JSON-lines buckets to S3.
//!
//! # Stages
//!
//! - **transfer**: list remote files, filter to the processing date, then
//!   download and remove each eligible file with bounded concurrency
//! - **transform**: parse each document, normalize its records, partition
//!   them around the mean age, and write the two bucket files
//! - **publish**: upload the bucket files to the object store
//!
//! # Example
//!
//! ```no_run
//! use evp_pipeline::{config::PipelineConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_env()?;
//!     let date = chrono::Local::now().date_naive();
//!     pipeline::run(&config, date).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod publish;
pub mod transfer;
pub mod transform;
