use crate::store::StoreError;

/// Failures a portal operation reports back to the page.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Bad user input; reported inline and never retried.
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("Failed to read file: {0}")]
    Read(String),
    #[error("Failed to parse Excel file: {0}")]
    Decode(String),
    #[error("No valid data found in the Excel file")]
    NoValidData,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workspace(anyhow::Error),
}

impl PortalError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        PortalError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PortalError::Validation { code, .. } => *code,
            PortalError::Read(_) => "read_failed",
            PortalError::Decode(_) => "parse_failed",
            PortalError::NoValidData => "no_valid_data",
            PortalError::Store(_) => "store_failed",
            PortalError::Workspace(_) => "db_update_failed",
        }
    }
}
