//! Object-store publishing for bucket files

use anyhow::{Context, Result};
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::StorageConfig;
use crate::transform::{bucket_dir, ABOVE_BUCKET_FILE, BELOW_BUCKET_FILE};

/// S3 client wrapper for the publish stage
pub struct ObjectStore {
    client: Client,
    bucket: String,
    key_prefix: String,
}

/// Outcome of one successful upload
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

impl ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "evp-publish",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Object store client initialized for bucket: {}", config.bucket);

        Self {
            client,
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Upload one local file to `<prefix>/<basename>`.
    ///
    /// A missing local file is skipped with a warning and no remote call is
    /// made.
    pub async fn upload_file(&self, path: &Path) -> Result<Option<UploadResult>> {
        if !path.exists() {
            warn!("File {} not found. Skipping upload.", path.display());
            return Ok(None);
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .context("Local path has no usable file name")?;
        let key = object_key(&self.key_prefix, file_name);

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let checksum = calculate_sha256(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/json")
            .body(ByteStream::from(data))
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", self.bucket, key))?;

        info!(
            "Successfully uploaded {} to s3://{}/{}",
            path.display(),
            self.bucket,
            key
        );

        Ok(Some(UploadResult { key, checksum, size }))
    }

    /// Upload both bucket files for `date`.
    ///
    /// A rejection from the remote store is logged and does not abort the
    /// batch. Returns the number of files actually uploaded.
    pub async fn publish_buckets(&self, output_dir: &Path, date: NaiveDate) -> usize {
        let dir = bucket_dir(output_dir, date);
        let mut published = 0;

        for file_name in [ABOVE_BUCKET_FILE, BELOW_BUCKET_FILE] {
            let path = dir.join(file_name);
            match self.upload_file(&path).await {
                Ok(Some(result)) => {
                    debug!(
                        "Uploaded {} ({} bytes, sha256 {})",
                        result.key, result.size, result.checksum
                    );
                    published += 1;
                },
                Ok(None) => {},
                Err(e) => error!("Error uploading {}: {:#}", path.display(), e),
            }
        }

        published
    }
}

/// Build the object key as `<prefix>/<file_name>`, tolerating a trailing
/// slash on the prefix.
fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StorageConfig {
        StorageConfig {
            endpoint: Some("http://localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            bucket: "test-bucket".to_string(),
            key_prefix: "json".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("json", "above.json"), "json/above.json");
        assert_eq!(object_key("json/", "above.json"), "json/above.json");
        assert_eq!(object_key("", "above.json"), "above.json");
        assert_eq!(object_key("a/b", "c.json"), "a/b/c.json");
    }

    #[test]
    fn test_calculate_sha256() {
        let checksum = calculate_sha256(b"Hello, World!");
        assert_eq!(
            checksum,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[tokio::test]
    async fn test_upload_skips_missing_file() {
        let store = ObjectStore::new(&test_config());
        let result = store
            .upload_file(Path::new("/definitely/not/here.json"))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_publish_buckets_nothing_on_disk() {
        let store = ObjectStore::new(&test_config());
        let dir = tempfile::TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let published = store.publish_buckets(dir.path(), date).await;
        assert_eq!(published, 0);
    }
}
