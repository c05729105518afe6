use serde_json::Value;

use crate::store::MAX_BATCH_SIZE;

pub const DEFAULT_EMAIL_DOMAIN: &str = "delima.edu.my";
pub const DEFAULT_SENTINEL: &str = "N/A";
pub const DEFAULT_MIN_IDENTITY_LENGTH: usize = 10;
pub const DEFAULT_ADMIN_USER_ID: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "12345678";

/// Opens this workspace at startup when set.
pub const WORKSPACE_ENV: &str = "STUDENTPORTALD_WORKSPACE";

/// Row mapping and upload settings, read from the `setup.ingest` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub email_domain: String,
    pub sentinel: String,
    pub min_identity_length: usize,
    pub batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings {
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            min_identity_length: DEFAULT_MIN_IDENTITY_LENGTH,
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl IngestSettings {
    /// Missing or mistyped fields fall back to defaults.
    pub fn from_section(section: &Value) -> Self {
        let d = IngestSettings::default();
        IngestSettings {
            email_domain: str_field(section, "emailDomain").unwrap_or(d.email_domain),
            sentinel: str_field(section, "sentinel").unwrap_or(d.sentinel),
            min_identity_length: usize_field(section, "minIdentityLength")
                .unwrap_or(d.min_identity_length),
            batch_size: usize_field(section, "batchSize").unwrap_or(d.batch_size),
        }
    }
}

/// Static shared admin credential, read from the `setup.security` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuritySettings {
    pub admin_user_id: String,
    pub admin_password: String,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        SecuritySettings {
            admin_user_id: DEFAULT_ADMIN_USER_ID.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl SecuritySettings {
    pub fn from_section(section: &Value) -> Self {
        let d = SecuritySettings::default();
        SecuritySettings {
            admin_user_id: str_field(section, "adminUserId").unwrap_or(d.admin_user_id),
            admin_password: str_field(section, "adminPassword").unwrap_or(d.admin_password),
        }
    }
}

fn str_field(section: &Value, key: &str) -> Option<String> {
    section
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn usize_field(section: &Value, key: &str) -> Option<usize> {
    section
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|n| usize::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_section_keeps_defaults() {
        let s = IngestSettings::from_section(&json!({ "emailDomain": "school.test" }));
        assert_eq!(s.email_domain, "school.test");
        assert_eq!(s.sentinel, "N/A");
        assert_eq!(s.min_identity_length, 10);
        assert_eq!(s.batch_size, 500);
    }

    #[test]
    fn mistyped_fields_fall_back() {
        let s = IngestSettings::from_section(&json!({ "batchSize": "many", "minIdentityLength": -3 }));
        assert_eq!(s.batch_size, 500);
        assert_eq!(s.min_identity_length, 10);

        let sec = SecuritySettings::from_section(&json!({ "adminUserId": 7 }));
        assert_eq!(sec, SecuritySettings::default());
    }
}
