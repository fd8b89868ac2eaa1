//! Generator Error Types
//!
//! ## Error Categories
//!
//! - Input errors (header or config cannot be read, bad markers): fatal
//! - Output errors (directory or file cannot be written): fatal
//! - Formatting errors: recovered by the emitter, never surfaced as
//!   `CodegenError`
//!
//! Unknown C types and empty parse results are not errors at all; they are
//! logged and counted in the generation report.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for generator operations
pub type CodegenResult<T> = Result<T, CodegenError>;

/// Fatal generator errors
#[derive(Error, Debug)]
pub enum CodegenError {
    /// The C header could not be opened or read
    #[error("failed to read header {}: {source}", .path.display())]
    ReadHeader {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be opened or read
    #[error("failed to read config file {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys
    #[error("invalid config file {}: {source}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// An export or call marker cannot be used to build the prototype pattern
    #[error("invalid {role} marker '{marker}': {reason}")]
    InvalidMarker {
        role: &'static str,
        marker: String,
        reason: String,
    },

    /// The prototype pattern built from the markers failed to compile
    #[error("invalid prototype pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The output directory could not be created
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A generated file could not be written
    #[error("failed to write {}: {source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The header declared no exported functions and the caller asked for that to fail
    #[error("no exported functions found in {}", .path.display())]
    NoFunctions { path: PathBuf },
}

/// Errors from the best-effort source formatter
#[derive(Error, Debug)]
pub enum FormatError {
    /// The formatter process could not be started or talked to
    #[error("failed to run rustfmt: {0}")]
    Io(#[from] io::Error),

    /// The formatter rejected the generated source
    #[error("rustfmt rejected the generated source: {0}")]
    Rejected(String),
}
