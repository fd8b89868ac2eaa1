//! Best-effort source formatting
//!
//! Generation never fails because of formatting: if the formatter cannot run
//! or rejects the text, the unformatted rendering is written instead and a
//! warning is logged.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::warn;

use crate::error::FormatError;

/// Formats generated Rust source
pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Pipes source through the `rustfmt` binary
#[derive(Debug, Clone)]
pub struct Rustfmt {
    program: String,
    edition: String,
}

impl Rustfmt {
    pub fn new() -> Self {
        Self {
            program: "rustfmt".to_string(),
            edition: "2021".to_string(),
        }
    }

    /// Use a different rustfmt executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for Rustfmt {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFormatter for Rustfmt {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.program)
            .args(["--edition", self.edition.as_str(), "--emit", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(source.as_bytes())?,
            None => {
                return Err(FormatError::Rejected(
                    "failed to open rustfmt stdin for writing".to_string(),
                ))
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(FormatError::Rejected(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Leaves source untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFormat;

impl SourceFormatter for NoFormat {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Outcome of formatting one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    /// False when the unformatted rendering was kept
    pub formatted: bool,
}

/// Format `source`, falling back to the raw text on any formatter error
pub fn format_or_raw(formatter: &dyn SourceFormatter, source: String, file: &str) -> Formatted {
    match formatter.format(&source) {
        Ok(text) => Formatted {
            text,
            formatted: true,
        },
        Err(e) => {
            warn!("Failed to format {}, writing unformatted source: {}", file, e);
            Formatted {
                text: source,
                formatted: false,
            }
        }
    }
}
