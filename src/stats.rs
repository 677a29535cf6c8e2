use crate::store::{AttendanceRow, Status};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub student_name: String,
    pub present: u64,
    pub absent: u64,
    pub percentage: f64,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Groups dated rows by student and counts statuses. Results are ordered by
/// student name ascending. A student whose dated rows are all unmarked still
/// appears, with a percentage of 0.0.
fn grouped<'a, I>(rows: I) -> Vec<StudentStats>
where
    I: IntoIterator<Item = &'a AttendanceRow>,
{
    let mut counts: BTreeMap<&'a str, (u64, u64)> = BTreeMap::new();
    for row in rows {
        let entry = counts.entry(row.student_name.as_str()).or_default();
        match row.status {
            Status::Present => entry.0 += 1,
            Status::Absent => entry.1 += 1,
            Status::Unmarked => {}
        }
    }
    counts
        .into_iter()
        .map(|(name, (present, absent))| {
            let denom = present + absent;
            let percentage = if denom == 0 {
                0.0
            } else {
                present as f64 / denom as f64 * 100.0
            };
            StudentStats {
                student_name: name.to_string(),
                present,
                absent,
                percentage,
            }
        })
        .collect()
}

/// Per-student counts over every dated row.
pub fn overall_stats(rows: &[AttendanceRow]) -> Vec<StudentStats> {
    grouped(rows.iter().filter(|r| !r.date.is_empty()))
}

/// Per-student counts restricted to one calendar month. Rows whose date does
/// not parse are dropped, and an out-of-range month simply matches nothing.
pub fn stats_by_month(rows: &[AttendanceRow], month: u32, year: i32) -> Vec<StudentStats> {
    grouped(rows.iter().filter(|r| {
        parse_date(&r.date)
            .map(|d| d.month() == month && d.year() == year)
            .unwrap_or(false)
    }))
}

/// Per-student counts restricted to one calendar year.
pub fn stats_by_year(rows: &[AttendanceRow], year: i32) -> Vec<StudentStats> {
    grouped(rows.iter().filter(|r| {
        parse_date(&r.date)
            .map(|d| d.year() == year)
            .unwrap_or(false)
    }))
}

/// Sorted distinct months and years seen among parseable dates. Feeds the
/// filter pickers, nothing else.
pub fn month_year_options(rows: &[AttendanceRow]) -> (Vec<u32>, Vec<i32>) {
    let mut months: BTreeSet<u32> = BTreeSet::new();
    let mut years: BTreeSet<i32> = BTreeSet::new();
    for row in rows {
        if let Some(d) = parse_date(&row.date) {
            months.insert(d.month());
            years.insert(d.year());
        }
    }
    (
        months.into_iter().collect(),
        years.into_iter().collect(),
    )
}
