use crate::error::PortalError;
use crate::records::{RecordField, StudentRecord};
use crate::store::RecordStore;

pub const IDENTITY_NUMBER_LEN: usize = 12;

pub const MSG_EMPTY_INPUT: &str = "Please enter your IC number";
pub const MSG_BAD_SHAPE: &str = "Please enter a valid 12-digit IC number";
pub const MSG_NOT_FOUND: &str =
    "No student found with this IC number. Please check and try again.";
pub const MSG_SEARCH_FAILED: &str = "An error occurred while searching. Please try again.";

/// Live input filter: keeps ASCII digits only, at most 12 of them.
pub fn normalize_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(IDENTITY_NUMBER_LEN)
        .collect()
}

pub fn validate_identity_number(value: &str) -> Result<&str, PortalError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(PortalError::validation("invalid_ic", MSG_EMPTY_INPUT));
    }
    if v.len() != IDENTITY_NUMBER_LEN || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PortalError::validation("invalid_ic", MSG_BAD_SHAPE));
    }
    Ok(v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(StudentRecord),
    NotFound,
}

/// Validates the candidate and runs the equality query. The first matching document wins.
pub fn search<S: RecordStore + ?Sized>(
    store: &S,
    candidate: &str,
) -> Result<LookupOutcome, PortalError> {
    let ic = validate_identity_number(candidate)?;
    let mut matches = store.query_equals(RecordField::IdentityNumber, ic)?;
    if matches.len() > 1 {
        log::warn!("lookup: {} documents share one identity number", matches.len());
    }
    if matches.is_empty() {
        Ok(LookupOutcome::NotFound)
    } else {
        Ok(LookupOutcome::Found(matches.swap_remove(0)))
    }
}

/// Fields the result card offers a copy button for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyableField {
    ExternalId,
    IssuedPassword,
}

impl CopyableField {
    pub const ALL: [CopyableField; 2] = [CopyableField::ExternalId, CopyableField::IssuedPassword];

    pub fn parse(s: &str) -> Option<Self> {
        match RecordField::parse(s)? {
            RecordField::ExternalId => Some(Self::ExternalId),
            RecordField::IssuedPassword => Some(Self::IssuedPassword),
            _ => None,
        }
    }

    pub fn record_field(self) -> RecordField {
        match self {
            Self::ExternalId => RecordField::ExternalId,
            Self::IssuedPassword => RecordField::IssuedPassword,
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Self::ExternalId => "📋 Copy ID",
            Self::IssuedPassword => "📋 Copy Password",
        }
    }
}
