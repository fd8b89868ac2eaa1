//! Generator configuration
//!
//! Options come from three layers, lowest precedence first: built-in
//! defaults (the ONNX Runtime GenAI header conventions), an optional TOML
//! file, and explicit command-line flags.
//!
//! ```toml
//! # hdrbind.toml
//! package = "genai"
//! export_marker = "OGA_EXPORT"
//! call_marker = "OGA_API_CALL"
//! strip_prefix = "Oga"
//! api_file = "api.rs"
//! funcs_file = "funcs.rs"
//! runtime_crate = "hdrbind_runtime"
//! format = true
//! require_functions = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CodegenError, CodegenResult};

pub const DEFAULT_EXPORT_MARKER: &str = "OGA_EXPORT";
pub const DEFAULT_CALL_MARKER: &str = "OGA_API_CALL";
pub const DEFAULT_STRIP_PREFIX: &str = "Oga";
pub const DEFAULT_API_FILE: &str = "api.rs";
pub const DEFAULT_FUNCS_FILE: &str = "funcs.rs";
pub const DEFAULT_RUNTIME_CRATE: &str = "hdrbind_runtime";

/// Package name used when the output directory has no usable base name
pub const FALLBACK_PACKAGE: &str = "bindings";

/// The two macro tokens that bracket every exported prototype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    /// Token before the return type (`OGA_EXPORT`)
    pub export: String,
    /// Token between the return type and the name (`OGA_API_CALL`)
    pub call: String,
}

impl Markers {
    pub fn new(export: impl Into<String>, call: impl Into<String>) -> Self {
        Self {
            export: export.into(),
            call: call.into(),
        }
    }

    /// Check whether these are the built-in markers
    pub fn is_default(&self) -> bool {
        self.export == DEFAULT_EXPORT_MARKER && self.call == DEFAULT_CALL_MARKER
    }

    /// Reject markers that cannot appear as a single header token
    pub fn validate(&self) -> CodegenResult<()> {
        validate_marker("export", &self.export)?;
        validate_marker("call", &self.call)
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_MARKER, DEFAULT_CALL_MARKER)
    }
}

fn validate_marker(role: &'static str, marker: &str) -> CodegenResult<()> {
    let reason = if marker.is_empty() {
        "must not be empty"
    } else if marker.chars().any(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };
    Err(CodegenError::InvalidMarker {
        role,
        marker: marker.to_string(),
        reason: reason.to_string(),
    })
}

/// Everything one generator run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// C header to read
    pub header: PathBuf,
    /// Directory receiving the generated files
    pub out_dir: PathBuf,
    /// Package/module name; defaults to the output directory's base name
    pub package: Option<String>,
    /// Prototype markers
    pub markers: Markers,
    /// Literal prefix removed from native names
    pub strip_prefix: String,
    /// File name of the public signature artifact
    pub api_file: String,
    /// File name of the symbol table artifact
    pub funcs_file: String,
    /// Path of the runtime support crate in generated `use` items
    pub runtime_crate: String,
    /// Run the generated source through rustfmt
    pub format: bool,
    /// Fail when the header yields no functions
    pub require_functions: bool,
}

impl GenerateOptions {
    /// Options with default conventions for one header and output directory
    pub fn new(header: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            header: header.into(),
            out_dir: out_dir.into(),
            package: None,
            markers: Markers::default(),
            strip_prefix: DEFAULT_STRIP_PREFIX.to_string(),
            api_file: DEFAULT_API_FILE.to_string(),
            funcs_file: DEFAULT_FUNCS_FILE.to_string(),
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            format: true,
            require_functions: false,
        }
    }

    /// Effective package name
    pub fn package_name(&self) -> String {
        if let Some(package) = &self.package {
            return package.clone();
        }
        self.out_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_PACKAGE.to_string())
    }

    /// Overlay the values present in a config file
    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(package) = file.package {
            self.package = Some(package);
        }
        if let Some(export) = file.export_marker {
            self.markers.export = export;
        }
        if let Some(call) = file.call_marker {
            self.markers.call = call;
        }
        if let Some(prefix) = file.strip_prefix {
            self.strip_prefix = prefix;
        }
        if let Some(api_file) = file.api_file {
            self.api_file = api_file;
        }
        if let Some(funcs_file) = file.funcs_file {
            self.funcs_file = funcs_file;
        }
        if let Some(runtime_crate) = file.runtime_crate {
            self.runtime_crate = runtime_crate;
        }
        if let Some(format) = file.format {
            self.format = format;
        }
        if let Some(require_functions) = file.require_functions {
            self.require_functions = require_functions;
        }
    }
}

/// Contents of an `hdrbind.toml` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub package: Option<String>,
    pub export_marker: Option<String>,
    pub call_marker: Option<String>,
    pub strip_prefix: Option<String>,
    pub api_file: Option<String>,
    pub funcs_file: Option<String>,
    pub runtime_crate: Option<String>,
    pub format: Option<bool>,
    pub require_functions: Option<bool>,
}

impl ConfigFile {
    /// Read and parse a config file
    pub fn load(path: &Path) -> CodegenResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| CodegenError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse config text; `path` is only used for error reporting
    pub fn parse(text: &str, path: &Path) -> CodegenResult<Self> {
        toml::from_str(text).map_err(|source| CodegenError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}
