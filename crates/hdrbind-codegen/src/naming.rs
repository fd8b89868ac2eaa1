//! Identifier transforms for generated code

/// Derive the generated method name from a native function name.
///
/// Removes `prefix` if the name starts with it (case-sensitive), then deletes
/// every underscore: `OgaCreate_Model` with prefix `Oga` becomes `CreateModel`.
/// A name that consists only of the prefix keeps its full spelling.
pub fn generated_name(native_name: &str, prefix: &str) -> String {
    let stripped = native_name.strip_prefix(prefix).unwrap_or(native_name);
    let name = if stripped.is_empty() {
        native_name
    } else {
        stripped
    };
    name.replace('_', "")
}

/// Convert CamelCase to snake_case.
///
/// Runs of capitals are kept together, so `GetOutputID` becomes
/// `get_output_id` rather than `get_output_i_d`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let after_lower = prev.map_or(false, |p| p.is_lowercase() || p.is_ascii_digit());
            let ends_acronym = prev.map_or(false, |p| p.is_uppercase())
                && next.map_or(false, |n| n.is_lowercase());
            if after_lower || ends_acronym {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

// Keywords that cannot be raw identifiers.
const RESERVED_PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Make a C identifier usable as a Rust identifier.
///
/// Keywords become raw identifiers (`type` → `r#type`); path keywords,
/// which cannot be raw, get a trailing underscore. A name that starts with
/// a digit (`2D` after prefix stripping) gets a leading underscore.
pub fn rust_ident(name: &str) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else if RESERVED_PATH_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}
