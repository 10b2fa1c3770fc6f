use thiserror::Error;

/// Library-level failures that are surfaced to the caller as errors rather
/// than absorbed into the form's error map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    /// The acting user is missing a required permission. Terminal for the
    /// mount: no engine is built and no submit is possible.
    #[error("access denied: missing permission `{0}`")]
    PermissionDenied(String),

    /// A form handle was requested without a granted surrounding scope.
    /// This is a programming error and fails loudly instead of silently
    /// defaulting.
    #[error("form scope is not available")]
    ScopeUnavailable,

    /// A required-permission spec did not parse as `action:resource`.
    #[error("invalid permission spec `{0}`, expected `action:resource`")]
    InvalidPermissionSpec(String),
}

/// Rejection raised by a sanitizer before schema rules run, e.g. a secondary
/// semantic check such as email format. Displays as the bare message because
/// it is stored verbatim under the form's `general` error slot.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SanitizeError {
    pub message: String,
}

impl SanitizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
