//! Error types for measurements.

use thiserror::Error;

/// Errors raised by the cluster resource API.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Kubernetes API request failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors that abort a measurement or a scenario.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// A result slot exists but does not hold a valid record
    #[error("Result file {path} is corrupted: {source}")]
    CacheCorruption {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The alerts API answered with a non-success status
    #[error("Request {url} failed with status {status}: {body}")]
    AlertQuery {
        url: String,
        status: u16,
        body: String,
    },

    /// HTTP transport failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The alert watcher task panicked or was cancelled
    #[error("Alert watcher aborted: {0}")]
    WatcherAborted(String),

    /// Cluster API failure
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Nothing matched the daemon selector
    #[error("No deployments found for selector {selector}")]
    NoTargets { selector: String },

    /// Downscaled monitors were still listed after the measurement
    #[error("Downscaled monitors {stopped:?} were not replaced")]
    Postcondition { stopped: Vec<String> },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MeasureError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
