//! Mean-age statistic and bucket partitioning

use super::records::UserRecord;

/// Arithmetic mean of all non-null ages.
///
/// Returns `None` when no record carries a usable age; callers must treat
/// that as a document-level abort, not a crash.
pub fn average_age(records: &[UserRecord]) -> Option<f64> {
    let ages: Vec<i64> = records.iter().filter_map(|record| record.age).collect();

    if ages.is_empty() {
        return None;
    }

    Some(ages.iter().sum::<i64>() as f64 / ages.len() as f64)
}

/// Split records into (above, below-or-equal) buckets around `average`.
///
/// "Above" is strict (`age > average`); the boundary value lands in
/// "below-or-equal". Records without an age belong to neither bucket.
/// Relative document order is preserved within each bucket.
pub fn partition_by_average(
    records: Vec<UserRecord>,
    average: f64,
) -> (Vec<UserRecord>, Vec<UserRecord>) {
    let mut above = Vec::new();
    let mut below_or_equal = Vec::new();

    for record in records {
        match record.age {
            Some(age) if (age as f64) > average => above.push(record),
            Some(_) => below_or_equal.push(record),
            None => {},
        }
    }

    (above, below_or_equal)
}
