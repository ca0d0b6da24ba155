//! Configuration management
//!
//! All configuration is loaded from environment variables once at startup
//! and passed into the pipeline components by reference; no component reads
//! process state on its own.

use evp_common::{EvpError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Default remote directory to pull source files from.
pub const DEFAULT_SOURCE_PATH: &str = "/";

/// Default local directory for downloaded source files.
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

/// Default local root for date-partitioned bucket output.
pub const DEFAULT_OUTPUT_DIR: &str = "./json";

/// Default object-store region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default object-store key prefix for published bucket files.
pub const DEFAULT_KEY_PREFIX: &str = "json";

/// FTP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// FTP server hostname
    pub host: String,

    /// FTP server port
    pub port: u16,

    /// FTP username
    pub username: String,

    /// FTP password
    pub password: String,

    /// Remote directory holding the source files
    pub source_path: String,
}

impl RemoteConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: require("FTP_HOST")?,
            port: env::var("FTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FTP_PORT),
            username: require("FTP_USER")?,
            password: require("FTP_PASSWORD")?,
            source_path: env::var("FTP_SOURCE_PATH")
                .unwrap_or_else(|_| DEFAULT_SOURCE_PATH.to_string()),
        })
    }
}

/// Object-store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint (MinIO/LocalStack); None for AWS
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Key prefix under which bucket files are published
    pub key_prefix: String,
    pub access_key: String,
    pub secret_key: String,
    /// Force path-style addressing (required by MinIO)
    pub path_style: bool,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            bucket: require("S3_BUCKET")?,
            key_prefix: env::var("S3_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .map_err(|_| EvpError::Config("S3_ACCESS_KEY must be set".to_string()))?,
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .map_err(|_| EvpError::Config("S3_SECRET_KEY must be set".to_string()))?,
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }
}

/// Full pipeline configuration, constructed once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,

    /// Local directory downloaded source files land in
    pub download_dir: PathBuf,

    /// Local root for date-partitioned bucket output
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            remote: RemoteConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            download_dir: env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| EvpError::Config(format!("{} must be set", name)))
}
