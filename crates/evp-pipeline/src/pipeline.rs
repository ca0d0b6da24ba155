//! Pipeline driver: sequences fetch, transform, and publish once per run
//!
//! The processing date is pinned at run start and passed into every
//! date-sensitive stage, so a run that crosses local midnight still filters
//! and writes under one date.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use evp_common::EvpError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::publish::ObjectStore;
use crate::transfer::TransferClient;
use crate::transform;

/// Aggregated outcome of one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_fetched: usize,
    pub fetch_failures: usize,
    pub documents_transformed: usize,
    pub documents_skipped: usize,
    pub files_published: usize,
}

/// Run the full pipeline for one processing date.
///
/// A transform abort for a document without usable ages skips that document;
/// structural parse failures and local IO failures are fatal for the run.
pub async fn run(config: &PipelineConfig, date: NaiveDate) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    fs::create_dir_all(&config.download_dir)
        .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

    info!(
        "Step 1: downloading files modified on {} from the FTP server",
        date
    );
    let client = TransferClient::new(config.remote.clone());
    let report = client.fetch_eligible(date, &config.download_dir).await;
    summary.files_fetched = report.fetched.len();
    summary.fetch_failures = report.failed.len();

    info!("Step 2: transforming XML documents into bucket files");
    // Every XML file currently present is processed, not just this run's
    // fetches; files orphaned by an earlier crash are picked up here.
    for path in xml_documents(&config.download_dir)? {
        info!("Processing file: {}", path.display());
        match transform::transform_document(&path, &config.output_dir, date) {
            Ok(_) => summary.documents_transformed += 1,
            Err(EvpError::NoValidAges(file)) => {
                error!(
                    "Cannot compute an average age for {}; skipping document",
                    file
                );
                summary.documents_skipped += 1;
            },
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to transform {}", path.display()))
            },
        }
    }

    info!("Step 3: uploading bucket files to the object store");
    let store = ObjectStore::new(&config.storage);
    summary.files_published = store.publish_buckets(&config.output_dir, date).await;

    info!(
        "Run complete: {} fetched ({} failed), {} transformed ({} skipped), {} published",
        summary.files_fetched,
        summary.fetch_failures,
        summary.documents_transformed,
        summary.documents_skipped,
        summary.files_published
    );

    Ok(summary)
}

/// XML files currently in the download directory, name-sorted
fn xml_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}
