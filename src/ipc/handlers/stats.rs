use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::stats::{self, StudentStats};
use serde_json::json;

fn stats_json(rows: &[StudentStats]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|s| {
            json!({
                "studentName": s.student_name,
                "present": s.present,
                "absent": s.absent,
                "percentage": s.percentage,
            })
        })
        .collect()
}

fn handle_overall(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store.load() {
        Ok(rows) => ok(
            &req.id,
            json!({ "rows": stats_json(&stats::overall_stats(&rows)) }),
        ),
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_by_month(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(month) = req.params.get("month").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing month", None);
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing year", None);
    };
    // Filter values that cannot even be calendar components match nothing,
    // same as month 13. A truncating cast would alias huge values onto real
    // months.
    let (Ok(month), Ok(year)) = (u32::try_from(month), i32::try_from(year)) else {
        return ok(&req.id, json!({ "rows": [] }));
    };
    match store.load() {
        Ok(rows) => {
            let filtered = stats::stats_by_month(&rows, month, year);
            ok(&req.id, json!({ "rows": stats_json(&filtered) }))
        }
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_by_year(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return err(&req.id, "bad_params", "missing year", None);
    };
    let Ok(year) = i32::try_from(year) else {
        return ok(&req.id, json!({ "rows": [] }));
    };
    match store.load() {
        Ok(rows) => {
            let filtered = stats::stats_by_year(&rows, year);
            ok(&req.id, json!({ "rows": stats_json(&filtered) }))
        }
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

fn handle_month_year_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store.load() {
        Ok(rows) => {
            let (months, years) = stats::month_year_options(&rows);
            ok(&req.id, json!({ "months": months, "years": years }))
        }
        Err(e) => err(&req.id, "storage_failure", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.overall" => Some(handle_overall(state, req)),
        "stats.byMonth" => Some(handle_by_month(state, req)),
        "stats.byYear" => Some(handle_by_year(state, req)),
        "stats.monthYearOptions" => Some(handle_month_year_options(state, req)),
        _ => None,
    }
}
