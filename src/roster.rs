use crate::store::{AttendanceRow, Status, Store};
use chrono::Local;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Added,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked { date: String, time: String },
    AlreadyMarked,
}

pub fn is_valid_student_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Registers a student by appending a placeholder row. Re-registering a known
/// name is a no-op.
pub fn register_student(store: &Store, name: &str) -> anyhow::Result<RegisterOutcome> {
    let name = name.trim();
    let mut rows = store.load()?;
    if rows.iter().any(|r| r.student_name == name) {
        return Ok(RegisterOutcome::AlreadyExists);
    }
    rows.push(AttendanceRow::placeholder(name));
    store.save(&rows)?;
    Ok(RegisterOutcome::Added)
}

/// Distinct non-empty student names, sorted ascending.
pub fn list_students(store: &Store) -> anyhow::Result<Vec<String>> {
    let rows = store.load()?;
    let names: BTreeSet<String> = rows
        .into_iter()
        .filter(|r| !r.student_name.trim().is_empty())
        .map(|r| r.student_name)
        .collect();
    Ok(names.into_iter().collect())
}

/// Rows with a real date for one student, in store order. Placeholders are
/// not history.
pub fn attendance_history(store: &Store, name: &str) -> anyhow::Result<Vec<AttendanceRow>> {
    let rows = store.load()?;
    Ok(rows
        .into_iter()
        .filter(|r| r.student_name == name && !r.date.is_empty())
        .collect())
}

/// Marks a student present or absent for today, using the local clock.
pub fn mark_attendance(store: &Store, name: &str, status: Status) -> anyhow::Result<MarkOutcome> {
    let now = Local::now();
    mark_attendance_at(
        store,
        name,
        status,
        &now.format("%Y-%m-%d").to_string(),
        &now.format("%H:%M:%S").to_string(),
    )
}

/// Clock-independent body of `mark_attendance`. At most one Present/Absent
/// row may exist per (student, date); a second mark on the same date is
/// rejected regardless of its time or status.
pub fn mark_attendance_at(
    store: &Store,
    name: &str,
    status: Status,
    date: &str,
    time: &str,
) -> anyhow::Result<MarkOutcome> {
    let mut rows = store.load()?;
    let already_marked = rows
        .iter()
        .any(|r| r.student_name == name && r.date == date && r.status.is_marked());
    if already_marked {
        return Ok(MarkOutcome::AlreadyMarked);
    }
    rows.push(AttendanceRow::new(name, date, time, status)?);
    store.save(&rows)?;
    Ok(MarkOutcome::Marked {
        date: date.to_string(),
        time: time.to_string(),
    })
}

/// Removes every row whose four fields all match exactly. Matching zero rows
/// is not an error; returns how many rows went away.
pub fn delete_record(
    store: &Store,
    name: &str,
    date: &str,
    time: &str,
    status: Status,
) -> anyhow::Result<usize> {
    let mut rows = store.load()?;
    let before = rows.len();
    rows.retain(|r| {
        !(r.student_name == name && r.date == date && r.time == time && r.status == status)
    });
    let removed = before - rows.len();
    store.save(&rows)?;
    Ok(removed)
}
