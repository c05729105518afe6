use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Handler, Request};
use crate::session::SessionContext;
use serde_json::json;
use std::path::PathBuf;

pub const METHODS: &[(&str, Handler)] = &[
    ("health", handle_health),
    ("workspace.select", handle_workspace_select),
];

/// Opens (or creates) the workspace database and reads the session flag from it.
pub fn open_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<()> {
    let conn = db::open_db(&path)?;
    let session = SessionContext::load(&conn)?;
    log::info!(
        "workspace opened: {} (session {})",
        path.to_string_lossy(),
        session.view().as_str()
    );
    state.workspace = Some(path);
    state.db = Some(conn);
    state.session = session;
    state.selected_file = None;
    Ok(())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(req, "path") {
        Ok(p) => PathBuf::from(p),
        Err(resp) => return resp,
    };

    match open_workspace(state, path.clone()) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "view": state.session.view().as_str(),
            }),
        ),
        Err(e) => {
            log::error!("workspace open failed: {e:#}");
            err(&req.id, "db_open_failed", format!("{e:#}"), None)
        }
    }
}
