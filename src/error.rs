// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for provider clients and the surrounding service.
//!
//! [`ProviderClientError`] is the only error a caller of
//! [`ProviderClient::run`](crate::provider::ProviderClient::run) has to handle.
//! Transport, decoding and runtime failures are folded into it at the client
//! boundary. [`Error`] covers configuration loading and the CLI.

use std::fmt;

/// Result type alias for configuration and registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Service-level error types.
#[derive(Debug)]
pub enum Error {
    /// Configuration error (including malformed provider payloads)
    Config(String),
    /// Provider client error
    Provider(ProviderClientError),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Provider(e) => write!(f, "Provider error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Provider(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProviderClientError> for Error {
    fn from(e: ProviderClientError) -> Self {
        Error::Provider(e)
    }
}

impl From<serde_yml::Error> for Error {
    fn from(e: serde_yml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// The single failure surfaced by a provider client.
///
/// Variants only classify the message; every variant carries a human-readable
/// description and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderClientError {
    /// An optional backend capability (simulator or runtime) is not available
    DependencyUnavailable(String),
    /// The backend name could not be resolved
    BackendNotFound(String),
    /// No usable credential for a remote backend
    MissingCredentials(String),
    /// The request itself is invalid (zero shots, circuit too wide, ...)
    InvalidRequest(String),
    /// Circuit submission or execution failed downstream
    ExecutionFailed(String),
    /// The backend did not answer within the configured bound
    Timeout(String),
    /// Connection-level failure talking to a remote service
    Transport(String),
}

impl ProviderClientError {
    /// Stable machine-readable code for boundary layers.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderClientError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            ProviderClientError::BackendNotFound(_) => "BACKEND_NOT_FOUND",
            ProviderClientError::MissingCredentials(_) => "MISSING_CREDENTIALS",
            ProviderClientError::InvalidRequest(_) => "INVALID_REQUEST",
            ProviderClientError::ExecutionFailed(_) => "EXECUTION_FAILED",
            ProviderClientError::Timeout(_) => "TIMEOUT",
            ProviderClientError::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// The bare message, without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            ProviderClientError::DependencyUnavailable(msg)
            | ProviderClientError::BackendNotFound(msg)
            | ProviderClientError::MissingCredentials(msg)
            | ProviderClientError::InvalidRequest(msg)
            | ProviderClientError::ExecutionFailed(msg)
            | ProviderClientError::Timeout(msg)
            | ProviderClientError::Transport(msg) => msg,
        }
    }
}

impl fmt::Display for ProviderClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderClientError::DependencyUnavailable(msg) => {
                write!(f, "Dependency unavailable: {}", msg)
            }
            ProviderClientError::BackendNotFound(name) => write!(f, "Backend not found: {}", name),
            ProviderClientError::MissingCredentials(msg) => {
                write!(f, "Missing credentials: {}", msg)
            }
            ProviderClientError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderClientError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            ProviderClientError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderClientError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderClientError {}
