use crate::store::{AttendanceRow, Status, Store, REQUIRED_COLUMNS};
use anyhow::Context;
use serde_json::json;
use std::collections::HashSet;
use std::io::Read;

/// Error surfaced by import/export, carrying the IPC error code it should be
/// reported under.
#[derive(Debug)]
pub struct ExchangeError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ExchangeError {
    fn schema(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        ExchangeError {
            code: "schema_mismatch",
            message: message.into(),
            details,
        }
    }

    fn storage(err: anyhow::Error) -> Self {
        ExchangeError {
            code: "storage_failure",
            message: format!("{err:#}"),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows the merge added on top of the existing store.
    pub added: usize,
    /// Rows in the store after merge and dedup.
    pub total: usize,
}

/// Merges an external tabular file into the store. The external header must
/// name all four required columns (any order, extras ignored); every row is
/// revalidated on the way in. The merge keeps existing rows first and
/// collapses exact four-field duplicates to their first occurrence.
pub fn import_csv<R: Read>(store: &Store, reader: R) -> Result<ImportReport, ExchangeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| ExchangeError::schema(format!("unreadable header row: {e}"), None))?
        .clone();

    let mut positions = [0usize; 4];
    let mut missing: Vec<&str> = Vec::new();
    for (slot, name) in REQUIRED_COLUMNS.into_iter().enumerate() {
        match headers.iter().position(|h| h == name) {
            Some(idx) => positions[slot] = idx,
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(ExchangeError::schema(
            "file is missing required columns",
            Some(json!({ "missing": missing })),
        ));
    }

    let mut external: Vec<AttendanceRow> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        // Header is line 1; data starts at line 2.
        let line = i + 2;
        let record = record
            .map_err(|e| ExchangeError::schema(format!("bad record on line {line}: {e}"), None))?;
        let field = |slot: usize| record.get(positions[slot]).unwrap_or("").trim();
        let status = Status::parse(field(3)).ok_or_else(|| {
            ExchangeError::schema(
                format!("bad record on line {line}: unknown status {:?}", field(3)),
                Some(json!({ "line": line })),
            )
        })?;
        let row = AttendanceRow::new(field(0), field(1), field(2), status).map_err(|e| {
            ExchangeError::schema(
                format!("bad record on line {line}: {e:#}"),
                Some(json!({ "line": line })),
            )
        })?;
        external.push(row);
    }

    let existing = store.load().map_err(ExchangeError::storage)?;
    let before = existing.len();
    let mut merged = existing;
    merged.extend(external);
    let mut seen: HashSet<AttendanceRow> = HashSet::new();
    merged.retain(|row| seen.insert(row.clone()));
    store.save(&merged).map_err(ExchangeError::storage)?;

    Ok(ImportReport {
        added: merged.len().saturating_sub(before),
        total: merged.len(),
    })
}

/// Serializes rows as the canonical four-column file, header first. The full
/// dump includes placeholder rows.
pub fn export_csv(rows: &[AttendanceRow]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(REQUIRED_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush export: {e}"))?;
    String::from_utf8(bytes).context("export is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_store;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(prefix: &str) -> (PathBuf, Store) {
        let ws = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        let store = open_store(&ws).expect("open store");
        (ws, store)
    }

    #[test]
    fn import_rejects_missing_columns() {
        let (ws, store) = temp_store("attendanced-exchange-schema");
        let err = import_csv(&store, Cursor::new("Student Name,Date,Time\nAlice,,\n"))
            .expect_err("schema mismatch");
        assert_eq!(err.code, "schema_mismatch");
        assert_eq!(
            err.details,
            Some(json!({ "missing": ["Status"] })),
        );
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn import_accepts_extra_columns_in_any_order() {
        let (ws, store) = temp_store("attendanced-exchange-extra");
        let text = "Homeroom,Status,Time,Date,Student Name\n\
                    7B,Present,08:00:00,2024-03-01,Alice\n";
        let report = import_csv(&store, Cursor::new(text)).expect("import");
        assert_eq!(report.added, 1);
        assert_eq!(report.total, 1);
        let rows = store.load().expect("load");
        assert_eq!(rows[0].student_name, "Alice");
        assert_eq!(rows[0].status, Status::Present);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn import_collapses_exact_duplicates() {
        let (ws, store) = temp_store("attendanced-exchange-dedup");
        store
            .save(&[
                AttendanceRow::new("Alice", "2024-03-01", "08:00:00", Status::Present)
                    .expect("row"),
            ])
            .expect("seed");
        let text = "Student Name,Date,Time,Status\n\
                    Alice,2024-03-01,08:00:00,Present\n\
                    Alice,2024-03-02,08:00:00,Absent\n\
                    Alice,2024-03-02,08:00:00,Absent\n";
        let report = import_csv(&store, Cursor::new(text)).expect("import");
        assert_eq!(report.total, 2);
        assert_eq!(report.added, 1);
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn import_rejects_malformed_rows_with_line_number() {
        let (ws, store) = temp_store("attendanced-exchange-badrow");
        let text = "Student Name,Date,Time,Status\n\
                    Alice,2024-03-01,08:00:00,Tardy\n";
        let err = import_csv(&store, Cursor::new(text)).expect_err("bad row");
        assert_eq!(err.code, "schema_mismatch");
        assert!(err.message.contains("line 2"));
        // Rejected imports leave the store untouched.
        assert!(store.load().expect("load").is_empty());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn export_of_empty_store_is_just_the_header() {
        let text = export_csv(&[]).expect("export");
        assert_eq!(text, "Student Name,Date,Time,Status\n");
    }

    #[test]
    fn export_then_import_reproduces_rows() {
        let (ws, store) = temp_store("attendanced-exchange-roundtrip");
        let rows = vec![
            AttendanceRow::placeholder("Doe, Jane"),
            AttendanceRow::new("Doe, Jane", "2024-03-01", "08:15:00", Status::Present)
                .expect("row"),
        ];
        let text = export_csv(&rows).expect("export");
        let report = import_csv(&store, Cursor::new(text)).expect("import");
        assert_eq!(report.total, 2);
        assert_eq!(store.load().expect("load"), rows);
        let _ = std::fs::remove_dir_all(ws);
    }
}
