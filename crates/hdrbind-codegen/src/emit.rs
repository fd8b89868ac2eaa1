//! Code Emitter
//!
//! Renders the two generated artifacts from one [`GeneratorConfig`]:
//!
//! - **api** (`api.rs`): one `Handle<Kind>` alias per opaque type and the
//!   `Api` trait with one method per exported function
//! - **funcs** (`funcs.rs`): the `Funcs` table of resolved function
//!   pointers, its `load` routine, and `impl Api for Funcs` forwarding every
//!   call unchanged
//!
//! Both files are meant to live side by side in one module directory;
//! `funcs.rs` imports the handles and the trait from its sibling. Runtime
//! items are always spelled with a full path (`::hdrbind_runtime::Handle`)
//! so a handle alias can never be shadowed by, or shadow, a runtime import.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::GenerateOptions;
use crate::error::{CodegenError, CodegenResult};
use crate::extract::Function;
use crate::format::{format_or_raw, NoFormat, Rustfmt, SourceFormatter};
use crate::naming::{rust_ident, to_snake_case};
use crate::params::Param;
use crate::types::{OpaqueTypes, RustType};

const LINT_ALLOWS: &str =
    "#![allow(non_snake_case, clippy::missing_safety_doc, clippy::too_many_arguments)]";

/// Sole input of the emitter
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Header the declarations came from
    pub header_path: PathBuf,
    /// Package/module name recorded in the generated docs
    pub package_name: String,
    /// Opaque handle types, iterated in name order
    pub opaque_types: OpaqueTypes,
    /// Exported functions in header order
    pub functions: Vec<Function>,
}

impl GeneratorConfig {
    /// Header file name as shown in generated comments.
    ///
    /// Only the final component is used so output does not depend on the
    /// directory the generator was run from.
    pub fn header_name(&self) -> String {
        self.header_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.header_path.display().to_string())
    }
}

/// A written artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub path: PathBuf,
    /// False when formatting failed and the raw rendering was written
    pub formatted: bool,
}

/// Both written artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFiles {
    pub api: EmittedFile,
    pub funcs: EmittedFile,
}

/// Renders and writes generated bindings
pub struct Emitter {
    formatter: Box<dyn SourceFormatter>,
    api_file: String,
    funcs_file: String,
    runtime_crate: String,
}

impl Emitter {
    /// Create an emitter using the file names and formatter choice in `options`
    pub fn new(options: &GenerateOptions) -> Self {
        let formatter: Box<dyn SourceFormatter> = if options.format {
            Box::new(Rustfmt::new())
        } else {
            Box::new(NoFormat)
        };
        Self {
            formatter,
            api_file: options.api_file.clone(),
            funcs_file: options.funcs_file.clone(),
            runtime_crate: options.runtime_crate.clone(),
        }
    }

    /// Replace the formatter
    pub fn with_formatter(mut self, formatter: Box<dyn SourceFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Render the public signature artifact
    pub fn render_api(&self, config: &GeneratorConfig) -> String {
        ApiFile {
            config,
            runtime: runtime_path(&self.runtime_crate),
        }
        .to_string()
    }

    /// Render the symbol table artifact
    pub fn render_funcs(&self, config: &GeneratorConfig) -> String {
        FuncsFile {
            config,
            runtime: runtime_path(&self.runtime_crate),
            api_module: module_name(&self.api_file),
        }
        .to_string()
    }

    /// Render, format and write both artifacts into `out_dir`
    pub fn emit(&self, config: &GeneratorConfig, out_dir: &Path) -> CodegenResult<EmittedFiles> {
        fs::create_dir_all(out_dir).map_err(|source| CodegenError::CreateOutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let api = self.write_artifact(out_dir, &self.api_file, self.render_api(config))?;
        let funcs = self.write_artifact(out_dir, &self.funcs_file, self.render_funcs(config))?;

        Ok(EmittedFiles { api, funcs })
    }

    fn write_artifact(&self, out_dir: &Path, file: &str, source: String) -> CodegenResult<EmittedFile> {
        let path = out_dir.join(file);
        let output = format_or_raw(self.formatter.as_ref(), source, file);

        fs::write(&path, output.text.as_bytes()).map_err(|source| CodegenError::WriteOutput {
            path: path.clone(),
            source,
        })?;
        info!("Generated {}", path.display());

        Ok(EmittedFile {
            path,
            formatted: output.formatted,
        })
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("api_file", &self.api_file)
            .field("funcs_file", &self.funcs_file)
            .field("runtime_crate", &self.runtime_crate)
            .finish_non_exhaustive()
    }
}

/// Path prefix for runtime items. A bare crate name is anchored at the
/// extern prelude (`::hdrbind_runtime`); relative paths are kept as given.
fn runtime_path(runtime_crate: &str) -> String {
    let relative = ["crate", "self", "super"]
        .iter()
        .any(|root| runtime_crate == *root || runtime_crate.starts_with(&format!("{}::", root)));
    if relative || runtime_crate.starts_with("::") {
        runtime_crate.to_string()
    } else {
        format!("::{}", runtime_crate)
    }
}

/// Module name for a generated file (`api.rs` → `api`)
fn module_name(file: &str) -> String {
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    rust_ident(&stem)
}

// ============================================================================
// Artifact A: handles and the Api trait
// ============================================================================

struct ApiFile<'a> {
    config: &'a GeneratorConfig,
    runtime: String,
}

impl fmt::Display for ApiFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config;
        write_banner(f, "Native API surface", config)?;
        write_ffi_imports(f, &config.functions)?;

        for opaque in config.opaque_types.iter() {
            let kind = opaque.kind_name();
            writeln!(f, "/// Marker for the `{}` handle kind.", opaque.native_name)?;
            writeln!(f, "pub enum {} {{}}", kind)?;
            writeln!(f)?;
            writeln!(f, "/// Opaque handle to a native `{}`.", opaque.native_name)?;
            writeln!(
                f,
                "pub type {} = {}::Handle<{}>;",
                opaque.mapped_name, self.runtime, kind
            )?;
            writeln!(f)?;
        }

        writeln!(f, "/// Functions exported by `{}`.", config.header_name())?;
        if config.functions.is_empty() {
            return writeln!(f, "pub trait Api {{}}");
        }

        writeln!(f, "pub trait Api {{")?;
        for (i, func) in config.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "    /// Calls `{}`.", func.native_name)?;
            writeln!(f, "    {};", MethodSignature(func))?;
        }
        writeln!(f, "}}")
    }
}

// ============================================================================
// Artifact B: resolved symbol table and forwarding impl
// ============================================================================

struct FuncsFile<'a> {
    config: &'a GeneratorConfig,
    runtime: String,
    api_module: String,
}

impl fmt::Display for FuncsFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config;
        let fields = field_names(&config.functions);

        write_banner(f, "Native symbol table", config)?;
        write_ffi_imports(f, &config.functions)?;
        writeln!(f, "use super::{}::*;", self.api_module)?;
        writeln!(f)?;

        writeln!(f, "/// Function pointers resolved from the native library.")?;
        writeln!(f, "pub struct Funcs {{")?;
        for (func, field) in config.functions.iter().zip(&fields) {
            writeln!(f, "    {}: {},", field, FnPointerType(func))?;
        }
        writeln!(f, "}}")?;
        writeln!(f)?;

        let library = if config.functions.is_empty() {
            "_library"
        } else {
            "library"
        };
        writeln!(f, "impl Funcs {{")?;
        writeln!(f, "    /// Resolve every exported symbol from `library`.")?;
        writeln!(f, "    ///")?;
        writeln!(f, "    /// # Safety")?;
        writeln!(f, "    ///")?;
        writeln!(
            f,
            "    /// `library` must be the library described by `{}`, and it must stay",
            config.header_name()
        )?;
        writeln!(f, "    /// loaded for as long as the returned table is used.")?;
        writeln!(
            f,
            "    pub unsafe fn load({}: &{rt}::Library) -> {rt}::LoadResult<Self> {{",
            library,
            rt = self.runtime
        )?;
        writeln!(f, "        Ok(Self {{")?;
        for (func, field) in config.functions.iter().zip(&fields) {
            writeln!(
                f,
                "            {}: unsafe {{ {}::resolve(library, \"{}\")? }},",
                field, self.runtime, func.native_name
            )?;
        }
        writeln!(f, "        }})")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}")?;
        writeln!(f)?;

        if config.functions.is_empty() {
            return writeln!(f, "impl Api for Funcs {{}}");
        }

        writeln!(f, "impl Api for Funcs {{")?;
        for (i, (func, field)) in config.functions.iter().zip(&fields).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "    {} {{", MethodSignature(func))?;
            let args: Vec<_> = param_idents(&func.params);
            writeln!(f, "        unsafe {{ (self.{})({}) }}", field, args.join(", "))?;
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

fn write_banner(f: &mut fmt::Formatter<'_>, title: &str, config: &GeneratorConfig) -> fmt::Result {
    writeln!(f, "//! {} for `{}`.", title, config.package_name)?;
    writeln!(f, "//!")?;
    writeln!(
        f,
        "//! Code generated by hdrbind from `{}`. DO NOT EDIT.",
        config.header_name()
    )?;
    writeln!(f)?;
    writeln!(f, "{}", LINT_ALLOWS)?;
    writeln!(f)
}

fn write_ffi_imports(f: &mut fmt::Formatter<'_>, functions: &[Function]) -> fmt::Result {
    let types = || {
        functions.iter().flat_map(|func| {
            std::iter::once(&func.mapped_return_type).chain(func.params.iter().map(|p| &p.mapped_type))
        })
    };

    let mut names = Vec::new();
    if types().any(RustType::uses_c_char) {
        names.push("c_char");
    }
    if types().any(RustType::uses_c_void) {
        names.push("c_void");
    }

    match names.as_slice() {
        [] => Ok(()),
        [one] => {
            writeln!(f, "use std::ffi::{};", one)?;
            writeln!(f)
        }
        _ => {
            writeln!(f, "use std::ffi::{{{}}};", names.join(", "))?;
            writeln!(f)
        }
    }
}

/// Struct field name per function, unique within the table
fn field_names(functions: &[Function]) -> Vec<String> {
    let mut seen = HashSet::new();
    functions
        .iter()
        .map(|func| {
            let base = to_snake_case(&func.generated_name);
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            rust_ident(&candidate)
        })
        .collect()
}

/// Rust parameter names, unique within one function
fn param_idents(params: &[Param]) -> Vec<String> {
    let mut seen = HashSet::new();
    params
        .iter()
        .map(|param| {
            let base = rust_ident(&param.name);
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// `unsafe fn Name(&self, a: A, b: B) -> R`
struct MethodSignature<'a>(&'a Function);

impl fmt::Display for MethodSignature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.0;
        write!(f, "unsafe fn {}(&self", rust_ident(&func.generated_name))?;
        for (param, ident) in func.params.iter().zip(param_idents(&func.params)) {
            write!(f, ", {}: {}", ident, param.mapped_type)?;
        }
        write!(f, ")")?;
        write_return(f, &func.mapped_return_type)
    }
}

/// `unsafe extern "C" fn(A, B) -> R`
struct FnPointerType<'a>(&'a Function);

impl fmt::Display for FnPointerType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.0;
        write!(f, "unsafe extern \"C\" fn(")?;
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.mapped_type)?;
        }
        write!(f, ")")?;
        write_return(f, &func.mapped_return_type)
    }
}

fn write_return(f: &mut fmt::Formatter<'_>, ty: &RustType) -> fmt::Result {
    if ty.is_unit() {
        Ok(())
    } else {
        write!(f, " -> {}", ty)
    }
}
