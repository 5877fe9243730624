use thiserror::Error;

use crate::core::form::Field;

/// A field-scoped problem found before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Full name is required")]
    EmptyName,
    #[error("Phone number must look like {mask}")]
    InvalidPhone { mask: String },
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error("Enter a time like 08:00")]
    InvalidTime,
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::EmptyName => Field::FullName,
            Self::InvalidPhone { .. } => Field::Phone,
            Self::UnknownTimezone(_) => Field::Timezone,
            Self::InvalidTime => Field::NotifyOn,
        }
    }
}

/// A remote call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server returned {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Contact not found")]
    NotFound,
    #[error("No credentials for {0}")]
    Unauthenticated(String),
}

impl From<reqwest::Error> for MutationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Why a form could not start a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{} field(s) need attention", .0.len())]
    Invalid(Vec<ValidationError>),
    #[error("A save is already in progress")]
    InFlight,
    #[error("Form is not open for editing")]
    NotEditing,
}

/// Local persistence problems. Logged, never fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Keyring error: {0}")]
    Keyring(String),
}
