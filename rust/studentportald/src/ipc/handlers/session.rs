use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::load_security_settings;
use crate::ipc::helpers::{banner, BannerKind, BANNER_DISMISS_MS};
use crate::ipc::types::{AppState, Handler, Request};
use serde_json::{json, Value};

pub const METHODS: &[(&str, Handler)] = &[
    ("session.status", handle_status),
    ("session.login", handle_login),
    ("session.logout", handle_logout),
];

/// The page waits this long after a successful login before switching views.
const LOGIN_REDIRECT_MS: u64 = 1000;

fn handle_status(state: &mut AppState, req: &Request) -> Value {
    ok(
        &req.id,
        json!({
            "view": state.session.view().as_str(),
            "workspaceOpen": state.db.is_some(),
        }),
    )
}

fn handle_login(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let user_id = req
        .params
        .get("userId")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let security = match load_security_settings(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match state.session.login(conn, user_id, password, &security) {
        Ok(()) => {
            log::info!("admin login accepted for {}", user_id.trim());
            let message = "Login successful! Redirecting...";
            ok(
                &req.id,
                json!({
                    "view": state.session.view().as_str(),
                    "redirectAfterMs": LOGIN_REDIRECT_MS,
                    "banner": banner(BannerKind::Success, message, Some(BANNER_DISMISS_MS)),
                }),
            )
        }
        Err(e) => {
            log::warn!("admin login rejected for {}", user_id.trim());
            let message = e.to_string();
            err(
                &req.id,
                e.code(),
                message.clone(),
                Some(json!({
                    "banner": banner(BannerKind::Error, message, Some(BANNER_DISMISS_MS)),
                })),
            )
        }
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if let Err(e) = state.session.logout(conn) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    state.selected_file = None;
    log::info!("admin logged out");
    ok(
        &req.id,
        json!({
            "view": state.session.view().as_str(),
            "banner": banner(
                BannerKind::Success,
                "Logged out successfully",
                Some(BANNER_DISMISS_MS)
            ),
        }),
    )
}
