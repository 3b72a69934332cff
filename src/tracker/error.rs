//! Error types for the tracker.
//!
//! [`TrackerError`] covers failures that end a tracking session before it
//! can run (permissions, precision, configuration). [`ProviderError`] wraps
//! runtime failures reported by the positioning provider.

use thiserror::Error;

use super::types::AuthorizationStatus;

/// Errors that stop the tracker from starting or continuing a session.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Permission is missing or was revoked.
    #[error(
        "Location tracker needs `authorizedAlways` or `authorizedWhenInUse` status, got {0}"
    )]
    AuthorizationFail(AuthorizationStatus),

    /// Only approximate positions are available.
    #[error("Region monitoring doesn't work with reduced precision")]
    ReducedPrecision,

    /// A configuration value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration JSON could not be read or written.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Failure codes a positioning provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// No fix is available yet; the provider keeps trying.
    LocationUnknown,
    /// The user denied access while updates were running.
    Denied,
    /// A network-assisted lookup failed.
    Network,
    /// The provider could not monitor a region.
    RegionMonitoringFailure,
    /// Region monitoring is not permitted for this app.
    RegionMonitoringDenied,
    /// A platform code this crate does not map.
    Other(i64),
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocationUnknown => f.write_str("location unknown"),
            Self::Denied => f.write_str("denied"),
            Self::Network => f.write_str("network"),
            Self::RegionMonitoringFailure => f.write_str("region monitoring failure"),
            Self::RegionMonitoringDenied => f.write_str("region monitoring denied"),
            Self::Other(code) => write!(f, "code {code}"),
        }
    }
}

/// A failure reported by the positioning provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provider error ({code}): {message}")]
pub struct ProviderError {
    /// What went wrong
    pub code: ProviderErrorCode,
    /// Provider-supplied description
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the provider recovers from this failure on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.code, ProviderErrorCode::LocationUnknown)
    }
}
