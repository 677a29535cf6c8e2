use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, RegisterOutcome};
use serde_json::json;

fn get_required_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    match roster::register_student(store, &name) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "added": outcome == RegisterOutcome::Added,
                "name": name.trim(),
            }),
        ),
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match roster::list_students(store) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(name) = get_required_str(&req.params, "name") else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    match roster::attendance_history(store, &name) {
        Ok(rows) => {
            let rows_json: Vec<serde_json::Value> = rows
                .iter()
                .map(|r| {
                    json!({
                        "studentName": r.student_name,
                        "date": r.date,
                        "time": r.time,
                        "status": r.status.as_str(),
                    })
                })
                .collect();
            ok(&req.id, json!({ "rows": rows_json }))
        }
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.register" => Some(handle_register(state, req)),
        "students.list" => Some(handle_list(state, req)),
        "students.history" => Some(handle_history(state, req)),
        _ => None,
    }
}
