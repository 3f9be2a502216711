//! Error types for clusterkit

use std::path::PathBuf;
use thiserror::Error;

/// Result type for clusterkit operations
pub type Result<T> = std::result::Result<T, ClusterError>;

/// clusterkit error types
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("{action} {}: {source}", path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hosts line, expected <username>@<host> [locality] [vpcId], got {0:?}")]
    InvalidHostsLine(String),

    #[error("{0}")]
    NodeSelection(String),

    #[error("Invalid cluster name: {0:?}")]
    InvalidClusterName(String),

    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClusterError {
    /// Wrap an IO error with the path it happened on
    pub fn file(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClusterError::File {
            action,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_hosts_line_quotes_line() {
        let err = ClusterError::InvalidHostsLine("a@b@c".to_string());
        assert_eq!(
            err.to_string(),
            "invalid hosts line, expected <username>@<host> [locality] [vpcId], got \"a@b@c\""
        );
    }

    #[test]
    fn test_file_error_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ClusterError::file("could not read", "/tmp/hosts/demo", io);
        assert_eq!(err.to_string(), "could not read /tmp/hosts/demo: gone");
    }
}
