//! Runtime error types

use thiserror::Error;

/// Result type for symbol resolution
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised while populating a generated function table
#[derive(Error, Debug)]
pub enum LoadError {
    /// The loaded library does not export a symbol the header declares
    #[error("failed to resolve native symbol `{name}`: {source}")]
    MissingSymbol {
        /// Exact exported name that was looked up
        name: String,
        /// Underlying loader error
        #[source]
        source: libloading::Error,
    },
}

impl LoadError {
    /// Name of the symbol involved in the failure
    pub fn symbol(&self) -> &str {
        match self {
            LoadError::MissingSymbol { name, .. } => name,
        }
    }
}
