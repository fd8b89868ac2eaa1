//! Header reader

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CodegenError, CodegenResult};

/// Load the raw text of a C header.
///
/// Invalid UTF-8 sequences (for example Latin-1 comments) are replaced
/// rather than rejected; declarations themselves are always ASCII.
pub fn read_header(path: &Path) -> CodegenResult<String> {
    let bytes = fs::read(path).map_err(|source| CodegenError::ReadHeader {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
