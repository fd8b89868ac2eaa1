//! hdrbind binding generator
//!
//! Reads a C header that exports its API through marker macros and writes
//! two Rust source files:
//!
//! - `api.rs`: one `hdrbind_runtime::Handle` alias per opaque type and an
//!   `Api` trait with one method per exported function
//! - `funcs.rs`: a `Funcs` table of function pointers resolved from the
//!   loaded library, implementing `Api` by forwarding every call
//!
//! # Pipeline
//!
//! ```text
//! read_header → DeclarationSource::extract → GeneratorConfig → Emitter::emit
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hdrbind_codegen::{generate, GenerateOptions};
//!
//! let options = GenerateOptions::new("include/ort_genai_c.h", "src/genai");
//! let report = generate(&options)?;
//! println!("{} functions", report.function_count);
//! # Ok::<(), hdrbind_codegen::CodegenError>(())
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod format;
pub mod naming;
pub mod params;
pub mod reader;
pub mod types;

use std::path::PathBuf;

use tracing::{info, warn};

pub use config::{ConfigFile, GenerateOptions, Markers};
pub use emit::{EmittedFile, EmittedFiles, Emitter, GeneratorConfig};
pub use error::{CodegenError, CodegenResult, FormatError};
pub use extract::{Declarations, DeclarationSource, Function, PatternExtractor};
pub use format::{NoFormat, Rustfmt, SourceFormatter};
pub use params::Param;
pub use types::{CType, OpaqueType, OpaqueTypes, Primitive, RustType, TypeMapper};

/// Summary of one generator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub package_name: String,
    pub opaque_type_count: usize,
    pub function_count: usize,
    /// `typedef struct` declarations that were not opaque handles
    pub skipped_typedefs: usize,
    /// Prototypes dropped because their generated name was already taken
    pub duplicate_functions: usize,
    /// C base types that fell back to `usize`
    pub unmapped_types: Vec<String>,
    /// Export-marked declarations the extractor could not match
    pub unmatched_prototypes: usize,
    pub api: EmittedFile,
    pub funcs: EmittedFile,
}

impl GenerationReport {
    /// Paths of the written files
    pub fn written_files(&self) -> [&PathBuf; 2] {
        [&self.api.path, &self.funcs.path]
    }
}

/// Wires the reader, an extractor and an emitter together
pub struct Generator {
    options: GenerateOptions,
    source: Box<dyn DeclarationSource>,
    emitter: Emitter,
}

impl Generator {
    /// Create a generator using the pattern extractor and the formatter
    /// selected in `options`
    pub fn new(options: GenerateOptions) -> CodegenResult<Self> {
        let source = PatternExtractor::new(&options.markers, options.strip_prefix.clone())?;
        let emitter = Emitter::new(&options);
        Ok(Self {
            options,
            source: Box::new(source),
            emitter,
        })
    }

    /// Replace the declaration source
    pub fn with_source(mut self, source: Box<dyn DeclarationSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the formatter
    pub fn with_formatter(mut self, formatter: Box<dyn SourceFormatter>) -> Self {
        self.emitter = self.emitter.with_formatter(formatter);
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Run the whole pipeline once
    pub fn run(&self) -> CodegenResult<GenerationReport> {
        let options = &self.options;
        let header = reader::read_header(&options.header)?;

        let declarations = self.source.extract(&header);
        let opaque_type_count = declarations.opaque_types.len();
        let function_count = declarations.functions.len();

        info!(
            "Found {} opaque type(s) and {} function(s) in {}",
            opaque_type_count,
            function_count,
            options.header.display()
        );
        if opaque_type_count == 0 || function_count == 0 {
            warn!(
                "Header {} yielded {} opaque type(s) and {} function(s); check the markers",
                options.header.display(),
                opaque_type_count,
                function_count
            );
        }
        if function_count == 0 && options.require_functions {
            return Err(CodegenError::NoFunctions {
                path: options.header.clone(),
            });
        }
        if declarations.unmatched_prototypes > 0 {
            warn!(
                "{} exported declaration(s) in {} were not recognized as prototypes and were skipped",
                declarations.unmatched_prototypes,
                options.header.display()
            );
        }
        if !declarations.unmapped_types.is_empty() {
            warn!(
                "{} C type(s) fell back to usize: {}",
                declarations.unmapped_types.len(),
                declarations.unmapped_types.join(", ")
            );
        }

        let Declarations {
            opaque_types,
            functions,
            skipped_typedefs,
            duplicate_functions,
            unmapped_types,
            unmatched_prototypes,
        } = declarations;

        let config = GeneratorConfig {
            header_path: options.header.clone(),
            package_name: options.package_name(),
            opaque_types,
            functions,
        };

        let EmittedFiles { api, funcs } = self.emitter.emit(&config, &options.out_dir)?;

        Ok(GenerationReport {
            package_name: config.package_name,
            opaque_type_count,
            function_count,
            skipped_typedefs,
            duplicate_functions,
            unmapped_types,
            unmatched_prototypes,
            api,
            funcs,
        })
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("options", &self.options)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

/// Generate bindings with the default extractor
pub fn generate(options: &GenerateOptions) -> CodegenResult<GenerationReport> {
    Generator::new(options.clone())?.run()
}
