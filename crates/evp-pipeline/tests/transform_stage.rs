//! On-disk tests for the transform stage: one source document in, two
//! date-partitioned bucket files out.

use chrono::NaiveDate;
use evp_pipeline::transform::{
    self, bucket_dir, ABOVE_BUCKET_FILE, BELOW_BUCKET_FILE, SENTINEL_EVENT_TIME, UNKNOWN,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REFERENCE_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Users>
  <User><UserID>u-01</UserID><UserName>Asha</UserName><UserAge>30</UserAge><EventTime>2024-06-15T08:00:00</EventTime></User>
  <User><UserID>u-02</UserID><UserName>Brook</UserName><UserAge>25</UserAge><EventTime>2024-06-15T08:01:00</EventTime></User>
  <User><UserID>u-03</UserID><UserName>Chen</UserName><UserAge>35</UserAge><EventTime>2024-06-15T08:02:00</EventTime></User>
  <User><UserID>u-04</UserID><UserName>Dara</UserName><UserAge>28</UserAge><EventTime>2024-06-15T08:03:00</EventTime></User>
  <User><UserID>u-05</UserID><UserName>Emre</UserName><UserAge>40</UserAge><EventTime>2024-06-15T08:04:00</EventTime></User>
  <User><UserID>u-06</UserID><UserName>Faye</UserName><UserAge>22</UserAge><EventTime>2024-06-15T08:05:00</EventTime></User>
  <User><UserID>u-07</UserID><UserName>Gil</UserName><UserAge>33</UserAge><EventTime>2024-06-15T08:06:00</EventTime></User>
  <User><UserID>u-08</UserID><UserName>Hana</UserName><UserAge>27</UserAge><EventTime>2024-06-15T08:07:00</EventTime></User>
  <User><UserID>u-09</UserID><UserName>Ines</UserName><UserAge>31</UserAge><EventTime>2024-06-15T08:08:00</EventTime></User>
  <User><UserID>u-10</UserID><UserName>Jody</UserName><UserAge>29</UserAge><EventTime>2024-06-15T08:09:00</EventTime></User>
</Users>"#;

fn processing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn write_document(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn read_bucket(output_dir: &Path, date: NaiveDate, file_name: &str) -> Vec<Value> {
    let path = bucket_dir(output_dir, date).join(file_name);
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn reference_document_splits_around_mean_of_thirty() {
    let dir = TempDir::new().unwrap();
    let document = write_document(dir.path(), "events.xml", REFERENCE_DOCUMENT);
    let output_dir = dir.path().join("json");
    let date = processing_date();

    let summary = transform::transform_document(&document, &output_dir, date).unwrap();
    assert_eq!(summary.records, 10);
    assert_eq!(summary.average_age, 30.0);
    assert_eq!(summary.above, 4);
    assert_eq!(summary.below_or_equal, 6);

    let above = read_bucket(&output_dir, date, ABOVE_BUCKET_FILE);
    let below = read_bucket(&output_dir, date, BELOW_BUCKET_FILE);

    let above_ages: Vec<i64> = above.iter().map(|v| v["UserAge"].as_i64().unwrap()).collect();
    let below_ages: Vec<i64> = below.iter().map(|v| v["UserAge"].as_i64().unwrap()).collect();

    // Strictly above the mean; the record at exactly 30 lands below-or-equal
    assert_eq!(above_ages, vec![35, 40, 33, 31]);
    assert_eq!(below_ages, vec![30, 25, 28, 22, 27, 29]);

    // Event times are re-rendered with millisecond precision, treated as UTC
    assert_eq!(above[0]["EventTime"], "2024-06-15T08:02:00.000Z");
    assert_eq!(below[0]["EventTime"], "2024-06-15T08:00:00.000Z");

    // Every record carries exactly the four output fields
    for value in above.iter().chain(below.iter()) {
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert!(object.contains_key("UserID"));
        assert!(object.contains_key("UserName"));
        assert!(object.contains_key("UserAge"));
        assert!(object.contains_key("EventTime"));
    }
}

#[test]
fn degraded_fields_survive_into_the_output() {
    let dir = TempDir::new().unwrap();
    let document = write_document(
        dir.path(),
        "partial.xml",
        r#"<Users>
  <User><UserID>u-1</UserID><UserName>Asha</UserName><UserAge>40</UserAge><EventTime>2024-06-15T10:00:00</EventTime></User>
  <User><UserAge>20</UserAge><EventTime>not-a-time</EventTime></User>
  <User><UserID>u-3</UserID><UserName>Null Age</UserName><UserAge>unparseable</UserAge></User>
</Users>"#,
    );
    let output_dir = dir.path().join("json");
    let date = processing_date();

    let summary = transform::transform_document(&document, &output_dir, date).unwrap();

    // Mean over the two valid ages; the null-age record is in neither bucket
    assert_eq!(summary.records, 3);
    assert_eq!(summary.average_age, 30.0);
    assert_eq!(summary.above, 1);
    assert_eq!(summary.below_or_equal, 1);

    let below = read_bucket(&output_dir, date, BELOW_BUCKET_FILE);
    assert_eq!(below.len(), 1);
    assert_eq!(below[0]["UserID"], UNKNOWN);
    assert_eq!(below[0]["UserName"], UNKNOWN);
    assert_eq!(below[0]["UserAge"], 20);
    assert_eq!(below[0]["EventTime"], SENTINEL_EVENT_TIME);
}

#[test]
fn all_equal_ages_leave_the_above_bucket_empty_but_present() {
    let dir = TempDir::new().unwrap();
    let document = write_document(
        dir.path(),
        "uniform.xml",
        r#"<Users>
  <User><UserID>u-1</UserID><UserName>A</UserName><UserAge>30</UserAge><EventTime>2024-06-15T10:00:00</EventTime></User>
  <User><UserID>u-2</UserID><UserName>B</UserName><UserAge>30</UserAge><EventTime>2024-06-15T11:00:00</EventTime></User>
</Users>"#,
    );
    let output_dir = dir.path().join("json");
    let date = processing_date();

    transform::transform_document(&document, &output_dir, date).unwrap();

    let above_path = bucket_dir(&output_dir, date).join(ABOVE_BUCKET_FILE);
    assert!(above_path.exists());
    assert_eq!(fs::read_to_string(above_path).unwrap(), "");

    assert_eq!(read_bucket(&output_dir, date, BELOW_BUCKET_FILE).len(), 2);
}

#[test]
fn reruns_for_the_same_date_overwrite_the_buckets() {
    let dir = TempDir::new().unwrap();
    let output_dir = dir.path().join("json");
    let date = processing_date();

    let first = write_document(
        dir.path(),
        "first.xml",
        r#"<Users>
  <User><UserID>u-1</UserID><UserName>A</UserName><UserAge>10</UserAge><EventTime>2024-06-15T10:00:00</EventTime></User>
  <User><UserID>u-2</UserID><UserName>B</UserName><UserAge>20</UserAge><EventTime>2024-06-15T11:00:00</EventTime></User>
</Users>"#,
    );
    transform::transform_document(&first, &output_dir, date).unwrap();

    let second = write_document(
        dir.path(),
        "second.xml",
        r#"<Users>
  <User><UserID>u-9</UserID><UserName>Z</UserName><UserAge>50</UserAge><EventTime>2024-06-15T12:00:00</EventTime></User>
</Users>"#,
    );
    transform::transform_document(&second, &output_dir, date).unwrap();

    // Not additive: only the second document's records remain
    let below = read_bucket(&output_dir, date, BELOW_BUCKET_FILE);
    assert_eq!(below.len(), 1);
    assert_eq!(below[0]["UserID"], "u-9");
}
