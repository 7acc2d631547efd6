//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use geolayer::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
    /// A file did not parse as a GeoJSON feature collection
    Parse { path: String, message: String },
    /// The overlay service rejected a command
    Service(ServiceError),
}

impl CliError {
    /// Exit the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1);
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => {
                write!(f, "Failed to initialize logging: {}", msg)
            }
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read {}: {}", path, error)
            }
            CliError::Parse { path, message } => {
                write!(f, "{} is not a GeoJSON feature collection: {}", path, message)
            }
            CliError::Service(e) => {
                write!(f, "Overlay service error: {}", e)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = CliError::Parse {
            path: "bad.json".to_string(),
            message: "expected object".to_string(),
        };
        assert!(err.to_string().contains("bad.json"));
        assert!(err.to_string().contains("expected object"));
    }
}
