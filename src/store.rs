use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STORE_FILE_NAME: &str = "attendance_records.csv";

/// Column names of the backing file, in file order. Import matches external
/// headers against these by name.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Student Name", "Date", "Time", "Status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Present,
    Absent,
    /// Placeholder rows carry an empty status field.
    #[serde(rename = "")]
    Unmarked,
}

impl Status {
    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "Present" => Some(Status::Present),
            "Absent" => Some(Status::Absent),
            "" => Some(Status::Unmarked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
            Status::Unmarked => "",
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Status::Present | Status::Absent)
    }
}

/// One line of the attendance file. A row with empty date/time and
/// `Unmarked` status registers a student without any attendance yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceRow {
    #[serde(rename = "Student Name")]
    pub student_name: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Status")]
    pub status: Status,
}

impl AttendanceRow {
    /// Builds a row, rejecting malformed date/time values. Dates must be
    /// `YYYY-MM-DD`, times `HH:MM:SS`; both may be empty.
    pub fn new(student_name: &str, date: &str, time: &str, status: Status) -> anyhow::Result<Self> {
        if !date.is_empty() {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid date: {date:?}"))?;
        }
        if !time.is_empty() {
            NaiveTime::parse_from_str(time, "%H:%M:%S")
                .with_context(|| format!("invalid time: {time:?}"))?;
        }
        Ok(AttendanceRow {
            student_name: student_name.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            status,
        })
    }

    pub fn placeholder(student_name: &str) -> Self {
        AttendanceRow {
            student_name: student_name.to_string(),
            date: String::new(),
            time: String::new(),
            status: Status::Unmarked,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.date.is_empty()
    }
}

/// CSV-file backed record store. Every operation goes through a full
/// `load`/`save` cycle; nothing is cached between calls.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Store { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row in file order. Creates the file with the header and
    /// zero rows if it does not exist yet.
    pub fn load(&self) -> anyhow::Result<Vec<AttendanceRow>> {
        if !self.path.exists() {
            self.save(&[])?;
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: AttendanceRow =
                record.with_context(|| format!("read {}", self.path.display()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Rewrites the whole file: header line first, then the given rows in the
    /// given order.
    pub fn save(&self, rows: &[AttendanceRow]) -> anyhow::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .with_context(|| format!("write {}", self.path.display()))?;
        writer.write_record(REQUIRED_COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("flush {}", self.path.display()))?;
        Ok(())
    }
}

/// Opens (and if needed initializes) the attendance store under `workspace`.
pub fn open_store(workspace: &Path) -> anyhow::Result<Store> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("create workspace {}", workspace.display()))?;
    let store = Store::new(workspace.join(STORE_FILE_NAME));
    if !store.path.exists() {
        store.save(&[])?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_workspace(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn open_creates_file_with_exact_header() {
        let ws = temp_workspace("attendanced-store-header");
        let store = open_store(&ws).expect("open store");
        let text = std::fs::read_to_string(store.path()).expect("read file");
        assert_eq!(text, "Student Name,Date,Time,Status\n");
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn save_load_round_trip_preserves_order_and_fields() {
        let ws = temp_workspace("attendanced-store-roundtrip");
        let store = open_store(&ws).expect("open store");
        let rows = vec![
            AttendanceRow::placeholder("Doe, Jane"),
            AttendanceRow::new("Doe, Jane", "2024-03-01", "08:15:00", Status::Present)
                .expect("row"),
            AttendanceRow::new("Ng Wei", "2024-03-01", "08:16:30", Status::Absent).expect("row"),
        ];
        store.save(&rows).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded, rows);

        // A name containing the delimiter must come back intact.
        assert_eq!(loaded[0].student_name, "Doe, Jane");
        assert!(loaded[0].is_placeholder());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn load_rejects_unknown_status_values() {
        let ws = temp_workspace("attendanced-store-badstatus");
        let store = open_store(&ws).expect("open store");
        std::fs::write(
            store.path(),
            "Student Name,Date,Time,Status\nAlice,2024-03-01,08:00:00,Late\n",
        )
        .expect("write file");
        assert!(store.load().is_err());
        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn row_constructor_validates_date_and_time() {
        assert!(AttendanceRow::new("Alice", "2024-02-30", "08:00:00", Status::Present).is_err());
        assert!(AttendanceRow::new("Alice", "2024-03-01", "8 o'clock", Status::Present).is_err());
        assert!(AttendanceRow::new("Alice", "", "", Status::Unmarked).is_ok());
        assert!(AttendanceRow::new("Alice", "2024-03-01", "08:00:00", Status::Absent).is_ok());
    }
}
