use super::handlers;
use super::types::{AppState, Handler, Request};
use crate::ipc::error::err;

/// Method families in dispatch order. Each family lists its method names next to the
/// function that serves them; nothing is reachable that is not named here.
const FAMILIES: &[&[(&str, Handler)]] = &[
    handlers::core::METHODS,
    handlers::setup::METHODS,
    handlers::session::METHODS,
    handlers::ingest::METHODS,
    handlers::lookup::METHODS,
];

pub fn find_handler(method: &str) -> Option<Handler> {
    FAMILIES
        .iter()
        .flat_map(|family| family.iter())
        .find(|(name, _)| *name == method)
        .map(|(_, handler)| *handler)
}

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    match find_handler(&req.method) {
        Some(handler) => handler(state, &req),
        None => err(
            &req.id,
            "not_implemented",
            format!("unknown method: {}", req.method),
            None,
        ),
    }
}
