use serde::{Deserialize, Serialize};

use crate::config::IngestSettings;

pub const STUDENTS_COLLECTION: &str = "students";

/// One student's issued credentials, addressed by national identity number.
///
/// Field names on the wire match the documents the portal pages read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "ic")]
    pub identity_number: String,
    #[serde(rename = "name")]
    pub full_name: String,
    #[serde(rename = "delimaId")]
    pub external_id: String,
    #[serde(rename = "email")]
    pub derived_email: String,
    #[serde(rename = "password")]
    pub issued_password: String,
}

impl StudentRecord {
    /// Builds a record from raw cell text. Blank optional fields become the sentinel and the
    /// email is always derived from the external id, never taken from input.
    pub fn from_cells(
        identity_number: &str,
        full_name: &str,
        external_id: &str,
        issued_password: &str,
        settings: &IngestSettings,
    ) -> Self {
        let external_id = external_id.trim();
        StudentRecord {
            identity_number: identity_number.trim().to_string(),
            full_name: or_sentinel(full_name, settings),
            external_id: or_sentinel(external_id, settings),
            derived_email: derive_email(external_id, settings),
            issued_password: or_sentinel(issued_password, settings),
        }
    }
}

pub fn derive_email(external_id: &str, settings: &IngestSettings) -> String {
    let id = external_id.trim();
    if id.is_empty() {
        return settings.sentinel.clone();
    }
    format!("{}@{}", id.to_lowercase(), settings.email_domain)
}

fn or_sentinel(s: &str, settings: &IngestSettings) -> String {
    let t = s.trim();
    if t.is_empty() {
        settings.sentinel.clone()
    } else {
        t.to_string()
    }
}

/// Queryable fields of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    IdentityNumber,
    FullName,
    ExternalId,
    DerivedEmail,
    IssuedPassword,
}

impl RecordField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ic" => Some(Self::IdentityNumber),
            "name" => Some(Self::FullName),
            "delimaId" => Some(Self::ExternalId),
            "email" => Some(Self::DerivedEmail),
            "password" => Some(Self::IssuedPassword),
            _ => None,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::IdentityNumber => "ic",
            Self::FullName => "name",
            Self::ExternalId => "delimaId",
            Self::DerivedEmail => "email",
            Self::IssuedPassword => "password",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::IdentityNumber => "ic",
            Self::FullName => "name",
            Self::ExternalId => "delima_id",
            Self::DerivedEmail => "email",
            Self::IssuedPassword => "password",
        }
    }

    pub fn value_of(self, record: &StudentRecord) -> &str {
        match self {
            Self::IdentityNumber => &record.identity_number,
            Self::FullName => &record.full_name,
            Self::ExternalId => &record.external_id,
            Self::DerivedEmail => &record.derived_email,
            Self::IssuedPassword => &record.issued_password,
        }
    }
}
