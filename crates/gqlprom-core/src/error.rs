//! Shared error type across gqlprom crates.

use thiserror::Error;

/// Stable error codes (used by config tooling and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or out-of-range option.
    BadOption,
    /// Metrics endpoint enabled without an app to mount it on.
    MissingApp,
    /// Two label sources claim the same label name.
    LabelCollision,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Metrics registry rejected an instrument.
    Registry,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadOption => "BAD_OPTION",
            ErrorCode::MissingApp => "MISSING_APP",
            ErrorCode::LabelCollision => "LABEL_COLLISION",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Registry => "REGISTRY",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GqlPromError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum GqlPromError {
    #[error("bad option: {0}")]
    BadOption(String),
    #[error("app option is not defined; disable metrics_endpoint or pass an app")]
    MissingApp,
    #[error("label collision: {label} ({reason})")]
    LabelCollision { label: String, reason: &'static str },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("registry: {0}")]
    Registry(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GqlPromError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            GqlPromError::BadOption(_) => ErrorCode::BadOption,
            GqlPromError::MissingApp => ErrorCode::MissingApp,
            GqlPromError::LabelCollision { .. } => ErrorCode::LabelCollision,
            GqlPromError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            GqlPromError::Registry(_) => ErrorCode::Registry,
            GqlPromError::Internal(_) => ErrorCode::Internal,
        }
    }
}
