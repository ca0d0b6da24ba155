//! XML-to-JSON transformation stage
//!
//! Reads one source document, normalizes its user records, splits them
//! around the mean age, and writes the two bucket files for the processing
//! date. Structural parse failures are fatal for the document; field-level
//! problems degrade into the record (see [`records`]).

pub mod partition;
pub mod records;

pub use partition::{average_age, partition_by_average};
pub use records::{RawUser, UserRecord, SENTINEL_EVENT_TIME, UNKNOWN};

use chrono::NaiveDate;
use evp_common::{EvpError, Result};
use serde::Deserialize;
use serde_jsonlines::write_json_lines;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bucket file for records strictly above the mean age.
pub const ABOVE_BUCKET_FILE: &str = "above_average_output.json";

/// Bucket file for records at or below the mean age.
pub const BELOW_BUCKET_FILE: &str = "below_average_output.json";

/// A source document: a root element containing `<User>` children
#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "User", default)]
    users: Vec<RawUser>,
}

/// Parse one source document into normalized records, in document order.
///
/// Malformed markup is fatal for the document and propagates to the caller;
/// field-level problems degrade into the records instead.
pub fn parse_document(path: &Path) -> Result<Vec<UserRecord>> {
    let content = fs::read_to_string(path)?;

    let document: UserDocument = quick_xml::de::from_str(&content)
        .map_err(|e| EvpError::Parse(format!("{}: {}", path.display(), e)))?;

    Ok(document.users.iter().map(UserRecord::from_raw).collect())
}

/// Directory holding the bucket files for one processing date.
pub fn bucket_dir(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(date.format("%Y-%m-%d").to_string())
}

/// Write one bucket as JSON lines, truncating any previous file.
///
/// An empty bucket still produces the (empty) file.
fn write_bucket(dir: &Path, file_name: &str, records: &[UserRecord]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    write_json_lines(&path, records)?;

    info!("Saved {} records to {}", records.len(), path.display());
    Ok(path)
}

/// Outcome of one document transformation
#[derive(Debug)]
pub struct TransformSummary {
    pub records: usize,
    pub average_age: f64,
    pub above: usize,
    pub below_or_equal: usize,
}

/// Transform one source document into the two bucket files for `date`.
///
/// Returns [`EvpError::NoValidAges`] when no record carries a usable age;
/// no bucket file is written in that case. Repeated runs for the same date
/// overwrite the same two files.
pub fn transform_document(
    path: &Path,
    output_dir: &Path,
    date: NaiveDate,
) -> Result<TransformSummary> {
    let records = parse_document(path)?;

    let average = average_age(&records)
        .ok_or_else(|| EvpError::NoValidAges(path.display().to_string()))?;

    let total = records.len();
    let (above, below_or_equal) = partition_by_average(records, average);

    let dir = bucket_dir(output_dir, date);
    fs::create_dir_all(&dir)?;
    write_bucket(&dir, ABOVE_BUCKET_FILE, &above)?;
    write_bucket(&dir, BELOW_BUCKET_FILE, &below_or_equal)?;

    info!(
        "Transformed {}: {} records, average age {:.2}, {} above / {} below-or-equal",
        path.display(),
        total,
        average,
        above.len(),
        below_or_equal.len()
    );

    Ok(TransformSummary {
        records: total,
        average_age: average,
        above: above.len(),
        below_or_equal: below_or_equal.len(),
    })
}
