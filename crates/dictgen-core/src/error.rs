//! Error types and handling for dictionary generation
//!
//! Only whole-run failures live here. A single entry failing is an
//! [`EntryError`](crate::entry::EntryError) and is reported per entry.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dictionary generation
#[derive(Debug, Error)]
pub enum DictgenError {
    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be serialized
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Serialization,
}

impl DictgenError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DictgenError::ConfigError { .. } => ErrorKind::Config,
            DictgenError::IoError { .. } => ErrorKind::Io,
            DictgenError::SerializationError { .. } => ErrorKind::Serialization,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let config = DictgenError::config_error("bad");
        assert_eq!(config.kind(), ErrorKind::Config);
        assert_eq!(config.to_string(), "Configuration error: bad");

        let serialization = DictgenError::serialization_error("no");
        assert_eq!(serialization.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DictgenError::io_error("dictgen.toml", source);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.to_string(), "IO error for path 'dictgen.toml': gone");
    }
}
