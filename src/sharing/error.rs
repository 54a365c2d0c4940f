//! Error type for the sharing client.

use std::path::PathBuf;

/// Result alias used by every sharing-client call.
pub type Result<T> = std::result::Result<T, SharingError>;

/// Errors raised while talking to a sharing server or decoding its payloads.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SharingError {
    /// Transport-level failure (DNS, TLS, timeout, ...).
    #[error("HTTP error for {url}: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// Malformed JSON in a response or in embedded metadata.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet decoding failure.
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow decoding failure.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Reading a local file failed.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The profile file is unusable.
    #[error("Invalid profile: {message}")]
    Profile {
        /// What is wrong with it.
        message: String,
    },

    /// A file id that is not part of the table's current snapshot.
    #[error("File '{id}' not found in table '{table}'")]
    FileNotFound {
        /// The requested file id.
        id: String,
        /// The table that was searched.
        table: String,
    },

    /// The server sent something this client does not understand.
    #[error("Unsupported response: {message}")]
    Unsupported {
        /// Description of the problem.
        message: String,
    },
}

impl SharingError {
    pub(crate) fn profile(message: impl Into<String>) -> Self {
        Self::Profile {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_file_not_found() {
        let err = SharingError::FileNotFound {
            id: "abc".to_string(),
            table: "boston".to_string(),
        };
        assert_eq!(err.to_string(), "File 'abc' not found in table 'boston'");
    }

    #[test]
    fn display_status_includes_body() {
        let err = SharingError::Status {
            url: "https://x/shares".to_string(),
            status: 403,
            body: "forbidden".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
    }
}
