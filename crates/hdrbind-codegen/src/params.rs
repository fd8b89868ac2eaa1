//! Parameter list parsing
//!
//! Turns the raw text between a prototype's parentheses into typed
//! parameters. Handles:
//! - unnamed parameters (`OgaTokenizer*` with no identifier)
//! - function-pointer parameters (`void (*callback)(void*)`)
//! - `const` anywhere in the declaration and `*` with any spacing
//!
//! ## Limitations
//!
//! The list is split at commas outside parentheses, so a callback's own
//! parameter list stays in one piece here. The extractor's prototype pattern
//! still stops at the first `)`, so a prototype containing a callback
//! parameter can be cut short before it reaches this parser.

use crate::types::{CType, RustType, TypeMapper};

/// Base type assumed when a declaration carries no usable type word
const DEFAULT_BASE_TYPE: &str = "int";

/// A function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Declared name, or `arg{index}` for unnamed parameters. Never empty.
    pub name: String,
    /// Parsed C type
    pub c_type: CType,
    /// Rust type token
    pub mapped_type: RustType,
}

/// Placeholder name for the parameter at `index`
pub fn placeholder_name(index: usize) -> String {
    format!("arg{}", index)
}

/// Split a parameter list at commas that are not nested inside parentheses.
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

/// Parse a raw, comma-joined parameter list.
///
/// An empty list and `void` both yield no parameters. Empty segments (from a
/// trailing comma) are skipped and do not consume an index.
pub fn parse_params(list: &str, mapper: &TypeMapper<'_>) -> Vec<Param> {
    let normalized = list.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() || normalized == "void" {
        return Vec::new();
    }

    split_top_level(&normalized)
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .map(|(index, part)| parse_param(part, index, mapper))
        .collect()
}

/// Parse a single parameter declaration at position `index`.
pub fn parse_param(text: &str, index: usize, mapper: &TypeMapper<'_>) -> Param {
    let text = text.trim();

    if let Some(name) = function_pointer_name(text) {
        let name = if name.is_empty() {
            placeholder_name(index)
        } else {
            name
        };
        // Callbacks cross the boundary as plain pointer-sized values.
        return Param {
            name,
            c_type: CType::new("void", 1, false),
            mapped_type: RustType::PointerSized,
        };
    }

    let pointer_depth = text.matches('*').count();
    let without_stars = text.replace('*', " ");

    let mut is_const = false;
    let mut words = Vec::new();
    for word in without_stars.split_whitespace() {
        if word == "const" {
            is_const = true;
        } else {
            words.push(word);
        }
    }

    let (name, base_type) = match words.as_slice() {
        [] => (placeholder_name(index), DEFAULT_BASE_TYPE.to_string()),
        [only] if mapper.is_known_type(only) => (placeholder_name(index), only.to_string()),
        [only] => (only.to_string(), DEFAULT_BASE_TYPE.to_string()),
        [type_words @ .., last] => (last.to_string(), type_words.join(" ")),
    };

    let c_type = CType {
        base_type,
        pointer_depth,
        is_const,
    };
    let mapped_type = mapper.map(&c_type);

    Param {
        name,
        c_type,
        mapped_type,
    }
}

/// Name declared inside `(* name)`, if `text` is a function-pointer parameter
fn function_pointer_name(text: &str) -> Option<String> {
    let start = text.find("(*")? + 2;
    let rest = &text[start..];
    let inner = match rest.find(')') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let name = inner
        .split_whitespace()
        .filter(|w| *w != "const")
        .last()
        .unwrap_or("");
    Some(name.trim_start_matches('*').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OpaqueType, OpaqueTypes, Primitive};
    use pretty_assertions::assert_eq;

    fn known() -> OpaqueTypes {
        ["Model", "OgaModel", "OgaTokenizer", "OgaSequences"]
            .into_iter()
            .map(OpaqueType::new)
            .collect()
    }

    #[test]
    fn test_split_top_level_respects_parens() {
        let parts = split_top_level("int a, void (*cb)(int, char*), void* user");
        assert_eq!(parts, vec!["int a", " void (*cb)(int, char*)", " void* user"]);
    }

    #[test]
    fn test_empty_and_void_lists() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        assert!(parse_params("", &mapper).is_empty());
        assert!(parse_params("  void ", &mapper).is_empty());
    }

    #[test]
    fn test_named_params() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let params = parse_params("const char* path, Model** out", &mapper);

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "path");
        assert_eq!(params[0].c_type, CType::new("char", 1, true));
        assert_eq!(params[0].mapped_type.to_string(), "*const c_char");
        assert_eq!(params[1].name, "out");
        assert_eq!(params[1].c_type, CType::new("Model", 2, false));
        assert_eq!(params[1].mapped_type.to_string(), "*mut Model");
    }

    #[test]
    fn test_multiline_params_are_normalized() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let params = parse_params(
            "const OgaModel* model,\n                 OgaTokenizer** out",
            &mapper,
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].mapped_type, RustType::Handle("OgaModel".into()));
        assert_eq!(params[1].name, "out");
    }

    #[test]
    fn test_star_spacing_is_irrelevant() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let spaced = parse_param("Model * * out", 0, &mapper);
        let packed = parse_param("Model** out", 0, &mapper);
        assert_eq!(spaced.c_type.pointer_depth, 2);
        assert_eq!(spaced, packed);
    }

    #[test]
    fn test_unnamed_opaque_param() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("const OgaTokenizer*", 1, &mapper);
        assert_eq!(param.name, "arg1");
        assert_eq!(param.c_type, CType::new("OgaTokenizer", 1, true));
        assert_eq!(param.mapped_type, RustType::Handle("OgaTokenizer".into()));
    }

    #[test]
    fn test_unnamed_primitive_param() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("size_t", 0, &mapper);
        assert_eq!(param.name, "arg0");
        assert_eq!(param.mapped_type, RustType::Primitive(Primitive::Usize));
    }

    #[test]
    fn test_unnamed_params_get_distinct_names() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let params = parse_params("OgaModel*, OgaSequences*", &mapper);
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "arg1"]);
    }

    #[test]
    fn test_lone_identifier_is_a_name() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("count", 0, &mapper);
        assert_eq!(param.name, "count");
        assert_eq!(param.c_type.base_type, "int");
        assert_eq!(param.mapped_type.to_string(), "i32");
    }

    #[test]
    fn test_only_qualifiers_and_stars() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("const *", 3, &mapper);
        assert_eq!(param.name, "arg3");
        assert_eq!(param.c_type, CType::new("int", 1, true));
    }

    #[test]
    fn test_multi_word_base_type() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("unsigned long long value", 0, &mapper);
        assert_eq!(param.name, "value");
        assert_eq!(param.c_type.base_type, "unsigned long long");
        assert_eq!(param.mapped_type, RustType::PointerSized);
    }

    #[test]
    fn test_function_pointer_param() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let params = parse_params(
            "OgaModel* model, void (*callback)(const char* msg, void* user), void* user_data",
            &mapper,
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[1].name, "callback");
        assert_eq!(params[1].mapped_type, RustType::PointerSized);
        assert_eq!(params[2].name, "user_data");
        assert_eq!(params[2].mapped_type.to_string(), "*mut c_void");
    }

    #[test]
    fn test_truncated_function_pointer_param() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("void (*on_token", 0, &mapper);
        assert_eq!(param.name, "on_token");
        assert_eq!(param.mapped_type, RustType::PointerSized);
    }

    #[test]
    fn test_anonymous_function_pointer_param() {
        let opaque = known();
        let mapper = TypeMapper::new(&opaque);
        let param = parse_param("void (*)(int)", 2, &mapper);
        assert_eq!(param.name, "arg2");
    }
}
