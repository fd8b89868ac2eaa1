//! Declaration Extractor
//!
//! Pulls opaque handle typedefs and exported function prototypes out of a C
//! header. This is a pattern matcher for one narrow declaration grammar, not
//! a C parser:
//!
//! ```c
//! typedef struct OgaModel OgaModel;
//! OGA_EXPORT OgaResult* OGA_API_CALL OgaCreateModel(const char* config_path, OgaModel** out);
//! ```
//!
//! Comments and preprocessor lines are dropped and all whitespace is
//! collapsed before matching, so prototypes may span several lines.
//!
//! ## Known fragility
//!
//! The parameter capture stops at the first `)`. A prototype whose parameter
//! list embeds a function-pointer type is therefore cut short or skipped.
//! Every export marker the pattern could not consume is logged with a
//! warning and counted in [`Declarations::unmatched_prototypes`]. Callers
//! that need such prototypes should swap in another [`DeclarationSource`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, debug_span, warn};

use crate::config::Markers;
use crate::error::{CodegenError, CodegenResult};
use crate::naming::generated_name;
use crate::params::{parse_params, Param};
use crate::types::{CType, OpaqueTypes, RustType, TypeMapper};

/// `typedef struct <Tag> <Alias> ;`
static TYPEDEF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"typedef\s+struct\s+(\w+)\s+(\w+)\s*;").expect("typedef pattern is valid")
});

/// Prototype pattern for the default `OGA_EXPORT` / `OGA_API_CALL` markers
static DEFAULT_FUNCTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&function_pattern_source(&Markers::default())).expect("function pattern is valid")
});

/// `<Export> <ReturnType> <Call> <Name> ( <Params> ) ;`
fn function_pattern_source(markers: &Markers) -> String {
    format!(
        r"\b{}\s+([^;{{}}()]+?)\s+{}\s+(\w+)\s*\(([^)]*)\)\s*;",
        regex::escape(&markers.export),
        regex::escape(&markers.call),
    )
}

// ============================================================================
// Declarations
// ============================================================================

/// An exported C function
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Exact exported symbol name
    pub native_name: String,
    /// Parsed return type
    pub return_type: CType,
    /// Rust return type (`Unit` for `void`)
    pub mapped_return_type: RustType,
    /// Parameters in declaration order
    pub params: Vec<Param>,
    /// Method name in generated code
    pub generated_name: String,
}

/// Everything extracted from one header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    /// Opaque handle types, sorted by name
    pub opaque_types: OpaqueTypes,
    /// Functions in header order
    pub functions: Vec<Function>,
    /// `typedef struct` declarations whose tag differs from the alias
    pub skipped_typedefs: usize,
    /// Prototypes dropped because their generated name was already taken
    pub duplicate_functions: usize,
    /// Base types that fell back to `usize`, sorted
    pub unmapped_types: Vec<String>,
    /// Export-marked declarations the prototype rule could not match
    pub unmatched_prototypes: usize,
}

/// Text in, structured declarations out.
///
/// The type mapper and emitter only see [`Declarations`], so a
/// tokenizer-based parser can replace the pattern extractor without touching
/// them.
pub trait DeclarationSource {
    fn extract(&self, header: &str) -> Declarations;
}

// ============================================================================
// Pattern Extractor
// ============================================================================

/// Regex-based extractor for marker-wrapped prototypes
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    function_pattern: Cow<'static, Regex>,
    export_marker: String,
    strip_prefix: String,
}

impl PatternExtractor {
    /// Create an extractor for the given markers and name prefix
    pub fn new(markers: &Markers, strip_prefix: impl Into<String>) -> CodegenResult<Self> {
        markers.validate()?;

        let function_pattern = if markers.is_default() {
            Cow::Borrowed(&*DEFAULT_FUNCTION_PATTERN)
        } else {
            let pattern = function_pattern_source(markers);
            let regex = Regex::new(&pattern)
                .map_err(|source| CodegenError::InvalidPattern { pattern, source })?;
            Cow::Owned(regex)
        };

        Ok(Self {
            function_pattern,
            export_marker: markers.export.clone(),
            strip_prefix: strip_prefix.into(),
        })
    }

    /// Extract the opaque handle typedefs from normalized text
    fn extract_opaque_types(&self, text: &str) -> (OpaqueTypes, usize) {
        let mut aliases = Vec::new();
        let mut skipped = 0;

        for caps in TYPEDEF_PATTERN.captures_iter(text) {
            let (Some(tag), Some(alias)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if tag.as_str() == alias.as_str() {
                aliases.push(alias.as_str());
            } else {
                debug!(
                    "Skipping typedef struct {} {}: not an opaque handle",
                    tag.as_str(),
                    alias.as_str()
                );
                skipped += 1;
            }
        }

        (OpaqueTypes::with_handle_names(aliases), skipped)
    }

    /// Extract the exported prototypes from normalized text
    fn extract_functions(
        &self,
        text: &str,
        mapper: &TypeMapper<'_>,
    ) -> (Vec<Function>, usize, HashSet<usize>) {
        let mut by_generated_name: IndexMap<String, Function> = IndexMap::new();
        let mut duplicates = 0;
        let mut matched_at = HashSet::new();

        for caps in self.function_pattern.captures_iter(text) {
            if let Some(whole) = caps.get(0) {
                matched_at.insert(whole.start());
            }
            let native_name = &caps[2];
            let _span = debug_span!("function", name = native_name).entered();

            let return_type = CType::parse(caps[1].trim());
            let mapped_return_type = mapper.map(&return_type);
            let params = parse_params(caps[3].trim(), mapper);
            let generated = generated_name(native_name, &self.strip_prefix);

            debug!("Found {} with {} parameter(s)", native_name, params.len());

            match by_generated_name.entry(generated) {
                Entry::Occupied(existing) => {
                    warn!(
                        "Skipping {}: generated name {} already used by {}",
                        native_name,
                        existing.key(),
                        existing.get().native_name
                    );
                    duplicates += 1;
                }
                Entry::Vacant(slot) => {
                    let generated_name = slot.key().clone();
                    slot.insert(Function {
                        native_name: native_name.to_string(),
                        return_type,
                        mapped_return_type,
                        params,
                        generated_name,
                    });
                }
            }
        }

        (by_generated_name.into_values().collect(), duplicates, matched_at)
    }

    /// Count export markers that do not begin a matched prototype, warning
    /// once for each
    fn count_unmatched(&self, text: &str, matched_at: &HashSet<usize>) -> usize {
        let marker = self.export_marker.as_str();
        let mut unmatched = 0;

        for (start, _) in text.match_indices(marker) {
            let before = text[..start].chars().next_back();
            let after = text[start + marker.len()..].chars().next();
            if before.map_or(false, is_ident_char) || after.map_or(false, is_ident_char) {
                continue;
            }
            if matched_at.contains(&start) {
                continue;
            }
            warn!(
                "Skipping exported declaration the prototype rule cannot match: {}",
                declaration_excerpt(&text[start..])
            );
            unmatched += 1;
        }

        unmatched
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Text up to and including the first `;`, shortened for log lines
fn declaration_excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 120;

    let end = text.find(';').map_or(text.len(), |i| i + 1);
    let declaration = &text[..end];
    if declaration.chars().count() <= MAX_CHARS {
        declaration.to_string()
    } else {
        let mut short: String = declaration.chars().take(MAX_CHARS).collect();
        short.push_str("...");
        short
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self {
            function_pattern: Cow::Borrowed(&*DEFAULT_FUNCTION_PATTERN),
            export_marker: crate::config::DEFAULT_EXPORT_MARKER.to_string(),
            strip_prefix: crate::config::DEFAULT_STRIP_PREFIX.to_string(),
        }
    }
}

impl DeclarationSource for PatternExtractor {
    fn extract(&self, header: &str) -> Declarations {
        let text = normalize_header(header);

        let (opaque_types, skipped_typedefs) = self.extract_opaque_types(&text);
        let mapper = TypeMapper::new(&opaque_types);
        let (functions, duplicate_functions, matched_at) = self.extract_functions(&text, &mapper);
        let unmatched_prototypes = self.count_unmatched(&text, &matched_at);
        let unmapped_types = mapper.unmapped_types();

        Declarations {
            opaque_types,
            functions,
            skipped_typedefs,
            duplicate_functions,
            unmapped_types,
            unmatched_prototypes,
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Strip comments and preprocessor lines, then collapse every whitespace run
/// (line breaks included) into a single space.
///
/// String and character literals are copied through untouched so `"//"`
/// inside a literal is not mistaken for a comment.
pub fn normalize_header(header: &str) -> String {
    let mut stripped = String::with_capacity(header.len());
    let mut chars = header.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().map_or(false, |&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                stripped.push(' ');
            }
            '#' if at_line_start => {
                // Directive runs to end of line, honouring `\` continuations.
                let mut prev = '\0';
                while let Some(&n) = chars.peek() {
                    if n == '\n' && prev != '\\' {
                        break;
                    }
                    if !n.is_whitespace() || n == '\n' {
                        prev = n;
                    }
                    chars.next();
                }
            }
            '"' | '\'' => {
                stripped.push(c);
                let mut escaped = false;
                for n in chars.by_ref() {
                    stripped.push(n);
                    if escaped {
                        escaped = false;
                    } else if n == '\\' {
                        escaped = true;
                    } else if n == c || n == '\n' {
                        break;
                    }
                }
                at_line_start = false;
                continue;
            }
            _ => stripped.push(c),
        }

        if c == '\n' {
            at_line_start = true;
        } else if !c.is_whitespace() {
            at_line_start = false;
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
