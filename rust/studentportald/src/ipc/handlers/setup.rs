use crate::config::{IngestSettings, SecuritySettings};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::require_db;
use crate::ipc::types::{AppState, Handler, Request};
use crate::store::MAX_BATCH_SIZE;
use rusqlite::Connection;
use serde_json::{json, Map, Value};

pub const METHODS: &[(&str, Handler)] = &[
    ("setup.get", handle_setup_get),
    ("setup.update", handle_setup_update),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SetupSection {
    Ingest,
    Security,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ingest" => Some(Self::Ingest),
            "security" => Some(Self::Security),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Ingest => "setup.ingest",
            Self::Security => "setup.security",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Ingest => {
            let d = IngestSettings::default();
            json!({
                "emailDomain": d.email_domain,
                "sentinel": d.sentinel,
                "minIdentityLength": d.min_identity_length,
                "batchSize": d.batch_size
            })
        }
        SetupSection::Security => {
            let d = SecuritySettings::default();
            json!({
                "adminUserId": d.admin_user_id,
                "adminPassword": d.admin_password
            })
        }
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.chars().count() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_non_empty(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = parse_string_max(v, key, max_len)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Ingest => match k.as_str() {
                "emailDomain" => {
                    let s = parse_non_empty(v, k, 120)?.to_ascii_lowercase();
                    if s.contains('@') || s.chars().any(char::is_whitespace) {
                        return Err("emailDomain must be a bare domain".into());
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                "sentinel" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 16)?));
                }
                "minIdentityLength" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 64)?));
                }
                "batchSize" => {
                    obj.insert(
                        k.clone(),
                        Value::from(parse_i64_range(v, k, 1, MAX_BATCH_SIZE as i64)?),
                    );
                }
                _ => return Err(format!("unknown ingest field: {}", k)),
            },
            SetupSection::Security => match k.as_str() {
                "adminUserId" => {
                    obj.insert(k.clone(), Value::String(parse_non_empty(v, k, 64)?));
                }
                "adminPassword" => {
                    // Passwords keep their surrounding whitespace.
                    let s = v
                        .as_str()
                        .ok_or_else(|| format!("{} must be string", k))?;
                    if s.is_empty() || s.chars().count() > 128 {
                        return Err(format!("{} length must be in 1..=128", k));
                    }
                    obj.insert(k.clone(), Value::String(s.to_string()));
                }
                _ => return Err(format!("unknown security field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Apply keys one at a time; a bad saved value is skipped on its own.
            for (k, v) in saved_obj {
                let mut one = Map::new();
                one.insert(k.clone(), v.clone());
                if let Err(msg) = merge_section_patch(section, &mut current, &one) {
                    log::warn!("ignoring saved {}.{}: {}", section.key(), k, msg);
                }
            }
        }
    }
    Ok(current)
}

pub fn load_ingest_settings(conn: &Connection) -> anyhow::Result<IngestSettings> {
    Ok(IngestSettings::from_section(&load_section(
        conn,
        SetupSection::Ingest,
    )?))
}

pub fn load_security_settings(conn: &Connection) -> anyhow::Result<SecuritySettings> {
    Ok(SecuritySettings::from_section(&load_section(
        conn,
        SetupSection::Security,
    )?))
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let ingest = match load_section(conn, SetupSection::Ingest) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let security = match load_security_settings(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "ingest": ingest,
            "security": {
                "adminUserId": security.admin_user_id,
                "adminPasswordSet": !security.admin_password.is_empty()
            }
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> Value {
    let conn = match require_db(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    if !state.session.is_active() {
        return err(&req.id, "not_authorized", "Please log in first", None);
    }
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    log::info!("setup section {} updated", section.key());
    ok(&req.id, json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn ingest_patch_validates_fields() {
        let mut cur = default_section(SetupSection::Ingest);
        merge_section_patch(
            SetupSection::Ingest,
            &mut cur,
            &patch(json!({ "emailDomain": " School.Test ", "batchSize": 100 })),
        )
        .expect("valid patch");
        let s = IngestSettings::from_section(&cur);
        assert_eq!(s.email_domain, "school.test");
        assert_eq!(s.batch_size, 100);

        for bad in [
            json!({ "batchSize": 501 }),
            json!({ "batchSize": 0 }),
            json!({ "emailDomain": "a@b.c" }),
            json!({ "sentinel": "" }),
            json!({ "minIdentityLength": "ten" }),
            json!({ "colour": "blue" }),
        ] {
            let mut cur = default_section(SetupSection::Ingest);
            assert!(
                merge_section_patch(SetupSection::Ingest, &mut cur, &patch(bad.clone())).is_err(),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn saved_sections_overlay_defaults() {
        let conn = Connection::open_in_memory().expect("open");
        db::init_schema(&conn).expect("schema");
        db::settings_set_json(&conn, "setup.ingest", &json!({ "sentinel": "-", "batchSize": "x" }))
            .expect("save");
        let s = load_ingest_settings(&conn).expect("load");
        assert_eq!(s.batch_size, 500);
        assert_eq!(s.sentinel, "-");
        assert_eq!(s.email_domain, "delima.edu.my");

        // A bad key sorting first must not take later valid keys down with it.
        db::settings_set_json(
            &conn,
            "setup.ingest",
            &json!({ "batchSize": 0, "minIdentityLength": 12, "sentinel": "?" }),
        )
        .expect("save");
        let s = load_ingest_settings(&conn).expect("load");
        assert_eq!(s.batch_size, 500);
        assert_eq!(s.min_identity_length, 12);
        assert_eq!(s.sentinel, "?");

        db::settings_set_json(&conn, "setup.security", &json!({ "adminPassword": "s3cret" }))
            .expect("save");
        let sec = load_security_settings(&conn).expect("load");
        assert_eq!(sec.admin_user_id, "admin");
        assert_eq!(sec.admin_password, "s3cret");
    }
}
