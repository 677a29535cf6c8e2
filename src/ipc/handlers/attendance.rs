use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, MarkOutcome};
use crate::store::Status;
use serde_json::json;

fn get_required_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn handle_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(name) = get_required_str(&req.params, "name") else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    if !roster::is_valid_student_name(&name) {
        return err(
            &req.id,
            "invalid_name",
            "student name must not be empty",
            None,
        );
    }
    let Some(status_str) = get_required_str(&req.params, "status") else {
        return err(&req.id, "bad_params", "missing status", None);
    };
    let status = match Status::parse(&status_str) {
        Some(s) if s.is_marked() => s,
        _ => {
            return err(
                &req.id,
                "bad_params",
                "status must be Present or Absent",
                None,
            )
        }
    };
    match roster::mark_attendance(store, name.trim(), status) {
        Ok(MarkOutcome::Marked { date, time }) => ok(
            &req.id,
            json!({ "marked": true, "date": date, "time": time }),
        ),
        Ok(MarkOutcome::AlreadyMarked) => ok(&req.id, json!({ "marked": false })),
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(name) = get_required_str(&req.params, "name") else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let Some(date) = get_required_str(&req.params, "date") else {
        return err(&req.id, "bad_params", "missing date", None);
    };
    let Some(time) = get_required_str(&req.params, "time") else {
        return err(&req.id, "bad_params", "missing time", None);
    };
    let Some(status_str) = get_required_str(&req.params, "status") else {
        return err(&req.id, "bad_params", "missing status", None);
    };
    let Some(status) = Status::parse(&status_str) else {
        return err(
            &req.id,
            "bad_params",
            "status must be Present, Absent or empty",
            None,
        );
    };
    match roster::delete_record(store, &name, &date, &time, status) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(handle_mark(state, req)),
        "attendance.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
