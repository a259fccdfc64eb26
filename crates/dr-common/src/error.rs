use std::path::PathBuf;

/// Convenient Result alias.
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors that stop the relay from starting or serving.
///
/// Per-connection transport failures and per-message decode failures are
/// contained where they happen and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_message() {
        let err = RelayError::Bind {
            addr: "127.0.0.1:8080".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to bind listener on 127.0.0.1:8080: address in use"
        );
    }
}
