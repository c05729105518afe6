use rusqlite::Connection;
use serde_json::{json, Value};

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

/// Terminal banners that clear themselves after this long.
pub const BANNER_DISMISS_MS: u64 = 5000;

#[derive(Debug, Clone, Copy)]
pub enum BannerKind {
    Success,
    Error,
    Info,
}

impl BannerKind {
    fn as_str(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
            BannerKind::Info => "info",
        }
    }
}

pub fn banner(kind: BannerKind, message: impl Into<String>, dismiss_after_ms: Option<u64>) -> Value {
    json!({
        "kind": kind.as_str(),
        "message": message.into(),
        "dismissAfterMs": dismiss_after_ms,
    })
}

pub fn require_db<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn get_required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing params.{}", key), None))
}
