use crate::error::PortalError;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{banner, get_required_str, require_db, BannerKind, BANNER_DISMISS_MS};
use crate::ipc::types::{AppState, Handler, Request};
use crate::lookup::{
    normalize_input, search, validate_identity_number, CopyableField, LookupOutcome,
    MSG_NOT_FOUND, MSG_SEARCH_FAILED,
};
use crate::records::StudentRecord;
use crate::store::{RecordStore, SqliteStore};
use serde_json::{json, Value};

pub const METHODS: &[(&str, Handler)] = &[
    ("lookup.normalize", handle_normalize),
    ("lookup.search", handle_search),
    ("lookup.copyField", handle_copy_field),
];

const COPIED_LABEL: &str = "✓ Copied!";
const COPIED_REVERT_MS: u64 = 2000;

/// Lookup errors stay on screen until the next action.
fn error_response(req: &Request, code: &str, message: &str) -> Value {
    err(
        &req.id,
        code,
        message,
        Some(json!({ "banner": banner(BannerKind::Error, message, None) })),
    )
}

fn handle_normalize(_state: &mut AppState, req: &Request) -> Value {
    let raw = req
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    ok(&req.id, json!({ "value": normalize_input(raw) }))
}

fn result_card(record: &StudentRecord) -> Value {
    json!({
        "student": record,
        "copyable": CopyableField::ALL
            .iter()
            .map(|f| json!({
                "field": f.record_field().wire_name(),
                "label": f.button_label(),
            }))
            .collect::<Vec<_>>(),
        "notice": format!(
            "Keep your credentials safe. Your full email is {}",
            record.derived_email
        ),
    })
}

fn search_reply<S: RecordStore + ?Sized>(req: &Request, store: &S, candidate: &str) -> Value {
    match search(store, candidate) {
        Ok(LookupOutcome::Found(record)) => {
            let mut result = result_card(&record);
            result["found"] = json!(true);
            result["banner"] = banner(
                BannerKind::Success,
                "Student record found!",
                Some(BANNER_DISMISS_MS),
            );
            ok(&req.id, result)
        }
        Ok(LookupOutcome::NotFound) => ok(
            &req.id,
            json!({
                "found": false,
                "banner": banner(BannerKind::Error, MSG_NOT_FOUND, None),
            }),
        ),
        Err(PortalError::Store(e)) => {
            log::error!("lookup query failed: {}", e);
            error_response(req, "store_failed", MSG_SEARCH_FAILED)
        }
        Err(e) => error_response(req, e.code(), &e.to_string()),
    }
}

fn handle_search(state: &mut AppState, req: &Request) -> Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let candidate = req
        .params
        .get("icNumber")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    search_reply(req, &SqliteStore::new(conn), candidate)
}

fn handle_copy_field(state: &mut AppState, req: &Request) -> Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let field_raw = match get_required_str(req, "field") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(field) = CopyableField::parse(&field_raw) else {
        return err(
            &req.id,
            "bad_params",
            "field must be one of: delimaId, password",
            None,
        );
    };
    let candidate = req
        .params
        .get("icNumber")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let ic = match validate_identity_number(candidate) {
        Ok(v) => v,
        Err(e) => return error_response(req, e.code(), &e.to_string()),
    };

    let store = SqliteStore::new(conn);
    match store.get_one(ic) {
        Ok(Some(record)) => ok(
            &req.id,
            json!({
                "field": field.record_field().wire_name(),
                "text": field.record_field().value_of(&record),
                "buttonLabel": COPIED_LABEL,
                "revertAfterMs": COPIED_REVERT_MS,
            }),
        ),
        Ok(None) => error_response(req, "not_found", MSG_NOT_FOUND),
        Err(e) => {
            log::error!("copy lookup failed: {}", e);
            error_response(
                req,
                "copy_failed",
                "Failed to copy. Please select and copy manually.",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RecordField;
    use crate::store::StoreError;

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn get_one(&self, _: &str) -> Result<Option<StudentRecord>, StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn query_equals(&self, _: RecordField, _: &str) -> Result<Vec<StudentRecord>, StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn batch_upsert(&mut self, _: &[StudentRecord]) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn search_request(ic: &str) -> Request {
        Request {
            id: "1".to_string(),
            method: "lookup.search".to_string(),
            params: json!({ "icNumber": ic }),
        }
    }

    #[test]
    fn store_failure_shows_the_generic_message() {
        let reply = search_reply(&search_request("900101015555"), &BrokenStore, "900101015555");
        assert_eq!(reply["ok"], false);
        assert_eq!(reply["error"]["code"], "store_failed");
        assert_eq!(reply["error"]["message"], MSG_SEARCH_FAILED);
        let banner = &reply["error"]["details"]["banner"];
        assert_eq!(banner["kind"], "error");
        assert_eq!(banner["message"], MSG_SEARCH_FAILED);
        assert!(banner["dismissAfterMs"].is_null());
        let raw = rusqlite::Error::InvalidQuery.to_string();
        assert!(!reply.to_string().contains(&raw));
    }

    #[test]
    fn bad_shape_is_reported_before_the_store_is_touched() {
        let reply = search_reply(&search_request("12345"), &BrokenStore, "12345");
        assert_eq!(reply["error"]["code"], "invalid_ic");
        assert!(reply["error"]["details"]["banner"]["dismissAfterMs"].is_null());
    }
}
