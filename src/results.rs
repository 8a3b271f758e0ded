use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use crate::error::StoreError;
use crate::metrics;

/// Storage key holding the serialized result log
pub const RESULTS_KEY: &str = "typingTestResults";

/// Outcome of one completed session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub wpm: u32,
    /// 0..=100
    pub accuracy: u32,
    /// Elapsed seconds, at most the configured duration
    pub duration: u32,
    pub date: DateTime<Utc>,
    pub category: String,
    pub errors: usize,
    pub correct_chars: usize,
    pub total_chars: usize,
}

/// Append-only log of completed results.
///
/// Reads never fail: absent or corrupt data reads as an empty log.
pub trait ResultsStore {
    fn append(&mut self, result: &TestResult) -> Result<(), StoreError>;

    /// Every result in insertion order
    fn all(&self) -> Vec<TestResult>;

    fn count(&self) -> usize {
        self.all().len()
    }

    fn average_wpm(&self) -> u32 {
        average_wpm(&self.all())
    }

    fn best_wpm(&self) -> u32 {
        best_wpm(&self.all())
    }

    /// Up to `limit` results, newest first
    fn recent(&self, limit: usize) -> Vec<TestResult> {
        self.all().into_iter().rev().take(limit).collect()
    }
}

impl<S: ResultsStore + ?Sized> ResultsStore for Box<S> {
    fn append(&mut self, result: &TestResult) -> Result<(), StoreError> {
        (**self).append(result)
    }

    fn all(&self) -> Vec<TestResult> {
        (**self).all()
    }
}

pub fn average_wpm(results: &[TestResult]) -> u32 {
    let wpms: Vec<f64> = results.iter().map(|r| r.wpm as f64).collect();
    metrics::mean(&wpms).map_or(0, |m| m.round() as u32)
}

pub fn best_wpm(results: &[TestResult]) -> u32 {
    results.iter().map(|r| r.wpm).max().unwrap_or(0)
}

/// Write results as CSV with the persisted field names as header
pub fn write_csv<W: io::Write>(results: &[TestResult], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}

fn parse_log(raw: &str) -> serde_json::Result<Vec<TestResult>> {
    serde_json::from_str(raw)
}

fn decode_log(raw: &str) -> Vec<TestResult> {
    match parse_log(raw) {
        Ok(results) => results,
        Err(e) => {
            log::warn!("stored results are corrupt, treating history as empty: {e}");
            Vec::new()
        }
    }
}

/// Durable store: a key-value table in SQLite holding the JSON-encoded log
#[derive(Debug)]
pub struct SqliteResultsStore {
    conn: Connection,
}

impl SqliteResultsStore {
    /// Open (and create if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    fn read_raw(conn: &Connection) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            [RESULTS_KEY],
            |row| row.get(0),
        )
        .optional()
    }
}

impl ResultsStore for SqliteResultsStore {
    fn append(&mut self, result: &TestResult) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        let mut results = match Self::read_raw(&tx)? {
            Some(raw) => match parse_log(&raw) {
                Ok(results) => results,
                Err(e) => {
                    log::warn!(
                        "overwriting {} bytes of unreadable results with a fresh log: {e}",
                        raw.len()
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        results.push(result.clone());
        let encoded = serde_json::to_string(&results)?;

        tx.execute(
            r#"
            INSERT INTO kv_store (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![RESULTS_KEY, encoded],
        )?;
        tx.commit()?;

        log::debug!("appended result {} ({} stored)", result.id, results.len());
        Ok(())
    }

    fn all(&self) -> Vec<TestResult> {
        match Self::read_raw(&self.conn) {
            Ok(Some(raw)) => decode_log(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("could not read stored results: {e}");
                Vec::new()
            }
        }
    }
}

/// Volatile store used when no durable medium is available
#[derive(Debug, Default, Clone)]
pub struct MemoryResultsStore {
    results: Vec<TestResult>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultsStore for MemoryResultsStore {
    fn append(&mut self, result: &TestResult) -> Result<(), StoreError> {
        self.results.push(result.clone());
        Ok(())
    }

    fn all(&self) -> Vec<TestResult> {
        self.results.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn result(id: u64, wpm: u32) -> TestResult {
        TestResult {
            id: id.to_string(),
            wpm,
            accuracy: 97,
            duration: 60,
            date: Utc.timestamp_millis_opt(id as i64).unwrap(),
            category: "General".to_string(),
            errors: 3,
            correct_chars: 97,
            total_chars: 100,
        }
    }

    #[test]
    fn empty_store_aggregates_are_zero() {
        let store = SqliteResultsStore::in_memory().unwrap();
        assert!(store.all().is_empty());
        assert_eq!(store.count(), 0);
        assert_eq!(store.average_wpm(), 0);
        assert_eq!(store.best_wpm(), 0);
    }

    #[test]
    fn append_then_all_returns_record_last_and_unchanged() {
        let mut store = SqliteResultsStore::in_memory().unwrap();
        store.append(&result(1_000, 40)).unwrap();
        let r = result(2_000, 55);
        store.append(&r).unwrap();

        let all = store.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all.last(), Some(&r));
    }

    #[test]
    fn append_preserves_order_and_duplicates() {
        let mut store = SqliteResultsStore::in_memory().unwrap();
        let a = result(3_000, 30);
        let b = result(1_000, 90);
        store.append(&a).unwrap();
        store.append(&b).unwrap();
        store.append(&a).unwrap();

        let ids: Vec<String> = store.all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["3000", "1000", "3000"]);
    }

    #[test]
    fn aggregates() {
        let mut store = SqliteResultsStore::in_memory().unwrap();
        for (i, wpm) in [40, 55, 62].into_iter().enumerate() {
            store.append(&result(i as u64 + 1, wpm)).unwrap();
        }
        // (40 + 55 + 62) / 3 = 52.33
        assert_eq!(store.average_wpm(), 52);
        assert_eq!(store.best_wpm(), 62);
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn average_rounds_half_up() {
        assert_eq!(average_wpm(&[result(1, 40), result(2, 41)]), 41);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let mut store = MemoryResultsStore::new();
        for i in 1..=12u64 {
            store.append(&result(i, i as u32)).unwrap();
        }
        let recent = store.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "12");
        assert_eq!(recent[9].id, "3");
        // the log itself is untouched
        assert_eq!(store.all()[0].id, "1");
    }

    #[test]
    fn corrupt_data_reads_as_empty() {
        let mut store = SqliteResultsStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)",
                params![RESULTS_KEY, "[{\"id\": oops"],
            )
            .unwrap();
        assert!(store.all().is_empty());
        assert_eq!(store.average_wpm(), 0);

        // appending after corruption starts a fresh log
        store.append(&result(5, 70)).unwrap();
        assert_eq!(store.all(), vec![result(5, 70)]);
    }

    #[test]
    fn persisted_layout_uses_camel_case_fields() {
        let mut store = SqliteResultsStore::in_memory().unwrap();
        store.append(&result(1_700_000_000_000, 48)).unwrap();
        let raw = SqliteResultsStore::read_raw(&store.conn).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &value.as_array().unwrap()[0];
        for field in [
            "id",
            "wpm",
            "accuracy",
            "duration",
            "date",
            "category",
            "errors",
            "correctChars",
            "totalChars",
        ] {
            assert!(record.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn reads_log_written_by_other_tools() {
        let raw = r#"[{"id":"1717000000000","wpm":52,"accuracy":96,"duration":60,
            "date":"2024-05-29T16:26:40.000Z","category":"All","errors":4,
            "correctChars":260,"totalChars":264}]"#;
        let results = decode_log(raw);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].correct_chars, 260);
        assert_eq!(results[0].category, "All");
    }

    #[test]
    fn truncated_log_is_a_parse_error() {
        let encoded = serde_json::to_string(&vec![result(1, 40)]).unwrap();
        assert!(parse_log(&encoded).is_ok());
        assert!(parse_log(&encoded[..encoded.len() / 2]).is_err());
        assert!(parse_log("").is_err());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("results.db");
        {
            let mut store = SqliteResultsStore::open(&path).unwrap();
            store.append(&result(10, 33)).unwrap();
        }
        let store = SqliteResultsStore::open(&path).unwrap();
        assert_eq!(store.all(), vec![result(10, 33)]);
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let mut out = Vec::new();
        write_csv(&[result(1, 40), result(2, 50)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,wpm,accuracy,duration,date,category,errors,correctChars,totalChars")
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn ResultsStore> = Box::new(MemoryResultsStore::new());
        store.append(&result(1, 20)).unwrap();
        assert_eq!(store.best_wpm(), 20);
    }
}
