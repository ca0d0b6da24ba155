//! Remote transfer stage: listing, date filtering, and bounded fetch/reap
//!
//! Each worker drives a synchronous [`FtpStream`] from a blocking task and
//! opens its own connection, so no transport state is shared between
//! concurrent fetches. Every submitted fetch is driven to completion and its
//! outcome folded into the [`FetchReport`] before the stage returns.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use std::io;
use std::path::Path;
use std::time::Duration;
use suppaftp::FtpStream;
use tracing::{debug, error, info, warn};

use crate::config::RemoteConfig;

/// Number of files fetched concurrently.
pub const FETCH_CONCURRENCY: usize = 4;

/// Maximum number of attempts for the remote listing
pub const MAX_LIST_RETRIES: u32 = 3;

/// Base delay between listing attempts (in seconds)
/// Actual delay is this value multiplied by the attempt number
pub const RETRY_DELAY_SECS: u64 = 5;

/// One remote source file with its modification instant
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// File name (no directory component)
    pub name: String,

    /// Last-modified instant reported by the server (MDTM, UTC)
    pub modified_at: DateTime<Utc>,
}

/// True when the file's last-modified instant falls on `date`, truncating
/// the instant to calendar-day granularity in local time.
pub fn is_modified_on(file: &RemoteFile, date: NaiveDate) -> bool {
    file.modified_at.with_timezone(&Local).date_naive() == date
}

/// Per-file failure captured during the fetch stage
#[derive(Debug)]
pub struct FetchFailure {
    pub name: String,
    pub error: String,
}

/// Aggregated outcome of the fetch stage
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Names of files downloaded and removed from the server
    pub fetched: Vec<String>,

    /// Files abandoned for this run, with the failure that stopped them
    pub failed: Vec<FetchFailure>,
}

/// FTP transfer client for the fetch stage
pub struct TransferClient {
    config: RemoteConfig,
}

impl TransferClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self { config }
    }

    /// List the remote source directory with modification times.
    ///
    /// Connectivity failures are retried, then logged and degraded to an
    /// empty listing; they never propagate to the caller.
    pub async fn list_source_files(&self) -> Vec<RemoteFile> {
        for attempt in 1..=MAX_LIST_RETRIES {
            debug!(
                "Listing attempt {}/{} for {}",
                attempt, MAX_LIST_RETRIES, self.config.source_path
            );

            let config = self.config.clone();
            match tokio::task::spawn_blocking(move || Self::list_sync(&config)).await {
                Ok(Ok(files)) => {
                    info!(
                        "Listed {} files under {}",
                        files.len(),
                        self.config.source_path
                    );
                    return files;
                },
                Ok(Err(e)) => {
                    if attempt < MAX_LIST_RETRIES {
                        let delay = RETRY_DELAY_SECS * attempt as u64;
                        warn!(
                            "Listing attempt {}/{} failed: {:#}. Retrying in {}s...",
                            attempt, MAX_LIST_RETRIES, e, delay
                        );
                        tokio::time::sleep(Duration::from_secs(delay)).await;
                    } else {
                        error!(
                            "Failed to list {} after {} attempts: {:#}",
                            self.config.source_path, MAX_LIST_RETRIES, e
                        );
                    }
                },
                Err(e) => {
                    error!("Listing task panicked: {}", e);
                    break;
                },
            }
        }

        Vec::new()
    }

    /// Download every file modified on `date` and remove it from the server.
    ///
    /// Up to [`FETCH_CONCURRENCY`] files are in flight at once, each on its
    /// own connection. A failure in either the download or the delete
    /// abandons that file for the run; other files proceed.
    pub async fn fetch_eligible(&self, date: NaiveDate, download_dir: &Path) -> FetchReport {
        let files = self.list_source_files().await;
        let eligible: Vec<RemoteFile> = files
            .into_iter()
            .filter(|file| is_modified_on(file, date))
            .collect();

        if eligible.is_empty() {
            info!("No remote files modified on {}", date);
            return FetchReport::default();
        }

        info!(
            "Fetching {} files with concurrency={}",
            eligible.len(),
            FETCH_CONCURRENCY
        );

        let outcomes = stream::iter(eligible)
            .map(|file| {
                let config = self.config.clone();
                let local_path = download_dir.join(&file.name);
                async move {
                    let name = file.name.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        Self::fetch_one_sync(&config, &file.name, &local_path)
                    })
                    .await;

                    match result {
                        Ok(Ok(())) => Ok(name),
                        Ok(Err(e)) => Err(FetchFailure {
                            name,
                            error: format!("{:#}", e),
                        }),
                        Err(e) => Err(FetchFailure {
                            name,
                            error: format!("fetch task panicked: {}", e),
                        }),
                    }
                }
            })
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        let mut report = FetchReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(name) => report.fetched.push(name),
                Err(failure) => {
                    error!(
                        "Error downloading or deleting file {}: {}",
                        failure.name, failure.error
                    );
                    report.failed.push(failure);
                },
            }
        }

        info!(
            "Fetch stage complete: {} downloaded, {} failed",
            report.fetched.len(),
            report.failed.len()
        );

        report
    }

    fn connect(config: &RemoteConfig) -> Result<FtpStream> {
        debug!("Connecting to FTP server: {}:{}", config.host, config.port);

        let mut ftp_stream = FtpStream::connect(format!("{}:{}", config.host, config.port))
            .context("Failed to connect to FTP server")?;

        // Extended Passive Mode - better for NAT/Docker environments
        ftp_stream.set_mode(suppaftp::Mode::ExtendedPassive);

        ftp_stream
            .login(&config.username, &config.password)
            .context("FTP login failed")?;

        ftp_stream
            .transfer_type(suppaftp::types::FileType::Binary)
            .context("Failed to set binary mode")?;

        Ok(ftp_stream)
    }

    /// Synchronous listing: NLST for names, MDTM per name for instants
    fn list_sync(config: &RemoteConfig) -> Result<Vec<RemoteFile>> {
        let mut ftp_stream = Self::connect(config)?;

        let names = ftp_stream
            .nlst(Some(config.source_path.as_str()))
            .with_context(|| format!("Failed to list {}", config.source_path))?;

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            // NLST may return bare names or full paths depending on the server
            let base = match name.rsplit('/').next() {
                Some(base) if !base.is_empty() => base.to_string(),
                _ => continue,
            };
            let remote_path = join_remote(&config.source_path, &base);

            match ftp_stream.mdtm(&remote_path) {
                Ok(mtime) => files.push(RemoteFile {
                    name: base,
                    modified_at: Utc.from_utc_datetime(&mtime),
                }),
                // Entries without MDTM (directories, vanished files) are not
                // source files
                Err(e) => debug!("Skipping {} (no MDTM): {}", remote_path, e),
            }
        }

        if let Err(e) = ftp_stream.quit() {
            warn!("Failed to quit FTP session gracefully: {}", e);
        }

        Ok(files)
    }

    /// Synchronous download-then-delete for one file.
    ///
    /// The remote copy is only deleted after the local write completed; a
    /// delete failure leaves the remote copy in place for the next run.
    fn fetch_one_sync(config: &RemoteConfig, name: &str, local_path: &Path) -> Result<()> {
        let mut ftp_stream = Self::connect(config)?;
        let remote_path = join_remote(&config.source_path, name);

        let mut reader = ftp_stream
            .retr_as_stream(&remote_path)
            .with_context(|| format!("Failed to open download stream for {}", remote_path))?;

        let mut local_file = std::fs::File::create(local_path)
            .with_context(|| format!("Failed to create {}", local_path.display()))?;

        io::copy(&mut reader, &mut local_file)
            .with_context(|| format!("Failed to write {}", local_path.display()))?;

        ftp_stream
            .finalize_retr_stream(reader)
            .context("Failed to finalize download stream")?;

        info!("File {} downloaded to {}", name, local_path.display());

        ftp_stream
            .rm(&remote_path)
            .with_context(|| format!("Failed to delete {} from server", remote_path))?;

        info!("File {} deleted from server", name);

        if let Err(e) = ftp_stream.quit() {
            warn!("Failed to quit FTP session gracefully: {}", e);
        }

        Ok(())
    }
}

fn join_remote(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}
