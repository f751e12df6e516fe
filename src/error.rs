//! Structured error types for config resolution and loading.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::format::ConfigFormat;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Filesystem errors
    FileNotFound,
    IoError,

    // Content errors
    ParseError,

    // Code config errors
    ModuleNotFound,
    ModuleError,
    NoModuleLoader,
}

/// Failure of a module loader to produce a value for a code config.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModuleError {
    /// The module file is gone or cannot be located.
    #[error("module not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The module was found but evaluating it failed.
    #[error("{0}")]
    Failed(String),
}

/// Failure of a data-format parser, keeping the underlying parser error.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Json5(#[from] json5::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Errors surfaced by [`ConfigResolver`](crate::ConfigResolver).
///
/// I/O and parser errors are held behind an `Arc` so the whole enum stays
/// `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to parse {} as {format}: {source}", path.display())]
    Parse {
        path: PathBuf,
        format: ConfigFormat,
        #[source]
        source: Arc<ParseError>,
    },

    #[error("no module loader installed for code config {}", path.display())]
    NoModuleLoader { path: PathBuf },

    #[error("failed to load module {}: {source}", path.display())]
    Module {
        path: PathBuf,
        #[source]
        source: ModuleError,
    },
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(err),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, format: ConfigFormat, err: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            format,
            source: Arc::new(err),
        }
    }

    /// True for the "file vanished" class: an I/O not-found or a module that
    /// could not be located.
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            ConfigError::Module { source, .. } => matches!(source, ModuleError::NotFound(_)),
            _ => false,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Io { .. } if self.is_not_found() => ErrorCode::FileNotFound,
            ConfigError::Io { .. } => ErrorCode::IoError,
            ConfigError::Parse { .. } => ErrorCode::ParseError,
            ConfigError::NoModuleLoader { .. } => ErrorCode::NoModuleLoader,
            ConfigError::Module {
                source: ModuleError::NotFound(_),
                ..
            } => ErrorCode::ModuleNotFound,
            ConfigError::Module { .. } => ErrorCode::ModuleError,
        }
    }

    /// The path this error concerns.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::NoModuleLoader { path }
            | ConfigError::Module { path, .. } => path,
        }
    }
}

/// Result type for resolver operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
