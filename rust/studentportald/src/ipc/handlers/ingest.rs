use crate::error::PortalError;
use crate::ingest::{ingest_file, ProgressLog};
use crate::ipc::error::{err, ok, portal_err};
use crate::ipc::handlers::setup::load_ingest_settings;
use crate::ipc::helpers::{banner, BannerKind, BANNER_DISMISS_MS};
use crate::ipc::types::{AppState, Handler, Request};
use crate::records::STUDENTS_COLLECTION;
use crate::store::SqliteStore;
use crate::workbook::{is_spreadsheet_path, SPREADSHEET_EXTENSIONS};
use serde_json::{json, Value};
use std::path::PathBuf;

pub const METHODS: &[(&str, Handler)] = &[
    ("ingest.selectFile", handle_select_file),
    ("ingest.upload", handle_upload),
];

fn not_authorized(req: &Request) -> Value {
    err(&req.id, "not_authorized", "Please log in first", None)
}

fn handle_select_file(state: &mut AppState, req: &Request) -> Value {
    if !state.session.is_active() {
        return not_authorized(req);
    }
    let Some(raw) = req.params.get("path").and_then(|v| v.as_str()) else {
        // A null or missing path clears the selection.
        state.selected_file = None;
        return ok(&req.id, json!({ "selected": null, "uploadEnabled": false }));
    };

    let path = PathBuf::from(raw);
    if !is_spreadsheet_path(&path) {
        return err(
            &req.id,
            "bad_params",
            format!(
                "unsupported file type; expected one of: {}",
                SPREADSHEET_EXTENSIONS.join(", ")
            ),
            None,
        );
    }
    let meta = match std::fs::metadata(&path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return err(&req.id, "bad_params", "path is not a file", None),
        Err(e) => return err(&req.id, "read_failed", e.to_string(), None),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let size_kb = format!("{:.2}", meta.len() as f64 / 1024.0);
    state.selected_file = Some(path);
    ok(
        &req.id,
        json!({
            "selected": { "name": name, "sizeKb": size_kb },
            "uploadEnabled": true,
            "banner": banner(
                BannerKind::Info,
                format!("Selected: {} ({} KB)", name, size_kb),
                None
            ),
        }),
    )
}

fn upload_failed(req: &Request, e: &PortalError, progress: &mut ProgressLog) -> Value {
    // An empty sheet is reported as-is; every other failure gets the upload prefix.
    let message = match e {
        PortalError::NoValidData => e.to_string(),
        _ => format!("Upload failed: {}", e),
    };
    if !matches!(e, PortalError::NoValidData) {
        progress.push(format!("❌ Error: {}", e));
    }
    log::error!("ingest failed: {}", e);
    portal_err(
        &req.id,
        e,
        Some(json!({
            "progress": progress.lines(),
            "banner": banner(BannerKind::Error, message, Some(BANNER_DISMISS_MS)),
        })),
    )
}

fn handle_upload(state: &mut AppState, req: &Request) -> Value {
    if !state.session.is_active() {
        return not_authorized(req);
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(path) = state.selected_file.clone() else {
        let message = "Please select a file first";
        return err(
            &req.id,
            "no_file_selected",
            message,
            Some(json!({
                "banner": banner(BannerKind::Error, message, Some(BANNER_DISMISS_MS)),
            })),
        );
    };
    let settings = match load_ingest_settings(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    log::info!(
        "ingest started: {} -> {}",
        path.to_string_lossy(),
        STUDENTS_COLLECTION
    );
    let mut progress = ProgressLog::default();
    let mut store = SqliteStore::new(conn);
    let outcome = match ingest_file(&mut store, &path, &settings, &mut progress) {
        Ok(o) => o,
        Err(e) => return upload_failed(req, &e, &mut progress),
    };

    let written = outcome.records_written;
    progress.push(format!("✅ Successfully uploaded {} student records!", written));
    state.selected_file = None;
    ok(
        &req.id,
        json!({
            "recordsWritten": written,
            "rowsExamined": outcome.rows_examined,
            "skippedRows": outcome.skipped_rows,
            "batches": outcome.batches,
            "progress": progress.lines(),
            "banner": banner(
                BannerKind::Success,
                format!("Successfully uploaded {} student records", written),
                Some(BANNER_DISMISS_MS)
            ),
        }),
    )
}
