// ── Core error types ──
//
// Errors surfaced by gatehouse-core. Front ends decide how each variant is
// presented: the web layer re-renders forms for `Validation`, redirects for
// `NotFound`/`ZoneNotFound`, and the CLI maps them to exit codes.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Message shown when a read-only operator attempts a change.
pub const READ_ONLY_MESSAGE: &str =
    "Insufficient privileges to make the requested change (read only).";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Request errors ───────────────────────────────────────────────
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{READ_ONLY_MESSAGE}")]
    ReadOnly,

    #[error("Entity not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("Captive portal zone not found: {zone}")]
    ZoneNotFound { zone: String },

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Configuration store error: {message}")]
    Store { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    // ── Credential errors ────────────────────────────────────────────
    #[error("Password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_owned(),
            identifier: identifier.to_string(),
        }
    }

    /// Messages to show on a re-rendered form, if this error belongs there.
    pub fn form_messages(&self) -> Option<Vec<String>> {
        match self {
            Self::Validation(errors) => {
                Some(errors.messages().into_iter().map(str::to_owned).collect())
            }
            Self::ReadOnly => Some(vec![READ_ONLY_MESSAGE.to_owned()]),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_renders_exact_message() {
        assert_eq!(CoreError::ReadOnly.to_string(), READ_ONLY_MESSAGE);
        assert_eq!(
            CoreError::ReadOnly.form_messages(),
            Some(vec![READ_ONLY_MESSAGE.to_owned()])
        );
    }

    #[test]
    fn not_found_is_not_a_form_error() {
        assert!(CoreError::not_found("user", "x").form_messages().is_none());
    }
}
