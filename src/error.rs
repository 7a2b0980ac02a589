//! Error types for the shim core.
//!
//! CHANGELOG:
//! - 08/26/2026 - Initial implementation

use thiserror::Error;

/// Errors surfaced by shim operations.
///
/// Lookups that simply match nothing are not errors: they return `None` or an
/// empty list so call sites stay simple. Every failure here surfaces exactly
/// once - no retry, no backoff.
#[derive(Debug, Error)]
pub enum ShimError {
    /// A requested facade capability was never resolved by the registry scan.
    /// Retrying without a fresh scan cannot help.
    #[error("capability '{0}' is unavailable (not resolved by the registry scan)")]
    CapabilityUnavailable(String),

    /// A stale metadata object failed its host-asynchronous refresh.
    #[error("stale refresh failed for '{id}': {reason}")]
    StaleData { id: String, reason: String },

    /// The host capture does not have the expected structure.
    #[error("malformed host snapshot: {0}")]
    MalformedSnapshot(String),

    /// Dispatch was given a method name no operation answers to.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A dispatch parameter was missing or had the wrong type.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ShimError>;
