use crate::exchange;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;

fn handle_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(path) = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            return err(
                &req.id,
                "storage_failure",
                format!("open {}: {e}", path.display()),
                None,
            )
        }
    };
    match exchange::import_csv(store, file) {
        Ok(report) => {
            log::info!(
                "imported {} ({} new rows, {} total)",
                path.display(),
                report.added,
                report.total
            );
            ok(
                &req.id,
                json!({ "imported": report.added, "total": report.total }),
            )
        }
        Err(e) => err(&req.id, e.code, e.message, e.details),
    }
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_path = req
        .params
        .get("outPath")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let rows = match store.load() {
        Ok(rows) => rows,
        Err(e) => return err(&req.id, "storage_failure", format!("{e:#}"), None),
    };
    let csv_text = match exchange::export_csv(&rows) {
        Ok(text) => text,
        Err(e) => return err(&req.id, "storage_failure", format!("{e:#}"), None),
    };
    if let Some(out_path) = out_path {
        if let Err(e) = std::fs::write(&out_path, &csv_text) {
            return err(
                &req.id,
                "storage_failure",
                format!("write {}: {e}", out_path.display()),
                None,
            );
        }
        return ok(
            &req.id,
            json!({ "csv": csv_text, "outPath": out_path.to_string_lossy() }),
        );
    }
    ok(&req.id, json!({ "csv": csv_text }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exchange.importCsv" => Some(handle_import_csv(state, req)),
        "exchange.exportCsv" => Some(handle_export_csv(state, req)),
        _ => None,
    }
}
