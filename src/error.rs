//! Error types for Drover
//!
//! All modules use `DroverResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Drover operations
pub type DroverResult<T> = Result<T, DroverError>;

/// All errors that can occur in Drover
#[derive(Error, Debug)]
pub enum DroverError {
    // Fingerprint errors
    #[error("Fingerprint input unavailable: {path}")]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fingerprint collision: cache entry {fingerprint} already holds a different payload")]
    FingerprintCollision { fingerprint: String },

    // Cache store errors
    #[error("Cache store unavailable: {context}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry {fingerprint}: {reason}")]
    StoreCorrupt { fingerprint: String, reason: String },

    // Remote import errors
    #[error("Invalid remote reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("No version of '{name}' satisfies '{constraint}'")]
    UnresolvableReference { name: String, constraint: String },

    #[error("Registry '{origin}' unreachable: {reason}")]
    OriginUnreachable { origin: String, reason: String },

    #[error("Fetch of '{name}' failed: {reason}")]
    FetchFailed { name: String, reason: String },

    #[error("Fetch of '{name}' was canceled")]
    FetchCanceled { name: String },

    // Task errors
    #[error("Task '{task}' exited with code {code}")]
    TaskFailed { task: String, code: i32 },

    #[error("Task '{task}' terminated by signal")]
    TaskSignaled { task: String },

    #[error("Interrupted")]
    Interrupted,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DroverError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache store error with context
    pub fn store(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StoreUnavailable {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch failure for a package
    pub fn fetch_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Network-class errors that a caller may retry with backoff.
    ///
    /// Drover itself never retries; retry policy belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OriginUnreachable { .. } | Self::FetchFailed { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnresolvableReference { .. } => {
                Some("Check the version constraint against the registry's published versions")
            }
            Self::OriginUnreachable { .. } => {
                Some("Verify the registry path in [registries] of your drover config")
            }
            Self::FingerprintCollision { .. } => {
                Some("Mismatched fingerprint inputs; clear the cache with: drover cache clear --all")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DroverError::UnresolvableReference {
            name: "acme/toolkit".to_string(),
            constraint: "^2.0".to_string(),
        };
        assert!(err.to_string().contains("acme/toolkit"));
        assert!(err.to_string().contains("^2.0"));
    }

    #[test]
    fn error_hint() {
        let err = DroverError::OriginUnreachable {
            origin: "registry".to_string(),
            reason: "missing".to_string(),
        };
        assert!(err.hint().unwrap().contains("registry path"));
    }

    #[test]
    fn error_retryable() {
        let fetch = DroverError::fetch_failed("acme/toolkit", "connection reset");
        assert!(fetch.is_retryable());

        let collision = DroverError::FingerprintCollision {
            fingerprint: "abc".to_string(),
        };
        assert!(!collision.is_retryable());

        let canceled = DroverError::FetchCanceled {
            name: "acme/toolkit".to_string(),
        };
        assert!(!canceled.is_retryable());
    }
}
