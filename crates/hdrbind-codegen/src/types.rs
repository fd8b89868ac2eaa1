//! C Type Mapping
//!
//! Converts the flat C type descriptors produced by the extractor into the
//! Rust type tokens written by the emitter.
//!
//! ## Mapping Rules (in priority order)
//!
//! 1. `void` → no value (return types only)
//! 2. `void*` → `*mut c_void`, `void**` and deeper → `*mut *mut c_void`
//! 3. Fixed-width primitives → `bool`, `i32`, `u64`, ... plus one pointer per `*`
//! 4. `char` → `c_char`; `char*` is a C string, `char**` a string array,
//!    deeper indirection falls back to `usize`
//! 5. Opaque types → the handle itself for `T` and `T*`, `*mut T` for `T**`,
//!    `usize` beyond that
//! 6. Anything else → `usize`, with a warning
//!
//! The innermost pointer is `*const` when the C type is const-qualified;
//! every outer level is `*mut`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use tracing::warn;

use crate::naming::rust_ident;

// ============================================================================
// C Type Descriptor
// ============================================================================

/// A flattened C type: base name, pointer depth and const qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CType {
    /// Base type name with qualifiers and `*` removed (e.g. `char`, `OgaModel`)
    pub base_type: String,
    /// Number of `*` tokens
    pub pointer_depth: usize,
    /// Whether a `const` keyword appeared anywhere in the declaration
    pub is_const: bool,
}

impl CType {
    /// Create a new type descriptor
    pub fn new(base_type: impl Into<String>, pointer_depth: usize, is_const: bool) -> Self {
        Self {
            base_type: base_type.into(),
            pointer_depth,
            is_const,
        }
    }

    /// Parse a declarator-free type such as `const char*` or `OgaResult *`.
    ///
    /// Every `const` keyword is removed and every `*` is counted, so spacing
    /// around the stars does not matter.
    pub fn parse(text: &str) -> Self {
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

        Self {
            base_type: words.join(" "),
            pointer_depth,
            is_const,
        }
    }

    /// Check for `void` with no indirection
    pub fn is_void(&self) -> bool {
        self.base_type == "void" && self.pointer_depth == 0
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            write!(f, "const ")?;
        }
        write!(f, "{}", self.base_type)?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        Ok(())
    }
}

// ============================================================================
// Primitive Table
// ============================================================================

/// Fixed-width scalar types the mapper understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    /// C `char`, rendered as `c_char`
    CChar,
}

impl Primitive {
    /// Look up a C scalar type name. `char` and `void` have their own rules
    /// and are not part of this table.
    pub fn from_c_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "bool" => Primitive::Bool,
            "int32_t" | "int" => Primitive::I32,
            "int64_t" => Primitive::I64,
            "uint8_t" => Primitive::U8,
            "uint16_t" => Primitive::U16,
            "uint32_t" => Primitive::U32,
            "uint64_t" => Primitive::U64,
            "size_t" => Primitive::Usize,
            "float" => Primitive::F32,
            "double" => Primitive::F64,
            _ => return None,
        };
        Some(primitive)
    }

    /// Rust spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::CChar => "c_char",
        }
    }
}

/// Check if a word names a built-in C type (primitive, `char` or `void`)
pub fn is_builtin_c_type(word: &str) -> bool {
    word == "char" || word == "void" || Primitive::from_c_name(word).is_some()
}

// ============================================================================
// Rust Type Tokens
// ============================================================================

/// Rust type token emitted for a C type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RustType {
    /// No value (`void` return)
    Unit,
    /// `c_void`, only ever the pointee of a pointer
    CVoid,
    /// Generic pointer-sized integer (`usize`): unknown types, callbacks and
    /// indirection deeper than the rules cover
    PointerSized,
    /// Fixed-width scalar
    Primitive(Primitive),
    /// Raw pointer
    Pointer {
        pointee: Box<RustType>,
        mutable: bool,
    },
    /// Opaque handle value, by mapped name
    Handle(String),
}

impl RustType {
    /// Wrap `inner` in `depth` raw pointers. Only the innermost pointer
    /// carries the const qualifier.
    pub fn pointer_to(inner: RustType, depth: usize, is_const: bool) -> RustType {
        let mut ty = inner;
        for level in 0..depth {
            ty = RustType::Pointer {
                pointee: Box::new(ty),
                mutable: !(level == 0 && is_const),
            };
        }
        ty
    }

    /// Check if this is the no-value token
    pub fn is_unit(&self) -> bool {
        matches!(self, RustType::Unit)
    }

    /// Innermost non-pointer type
    pub fn innermost(&self) -> &RustType {
        match self {
            RustType::Pointer { pointee, .. } => pointee.innermost(),
            other => other,
        }
    }

    /// Check whether rendering this type needs `std::ffi::c_char`
    pub fn uses_c_char(&self) -> bool {
        matches!(self.innermost(), RustType::Primitive(Primitive::CChar))
    }

    /// Check whether rendering this type needs `std::ffi::c_void`
    pub fn uses_c_void(&self) -> bool {
        matches!(self.innermost(), RustType::CVoid)
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RustType::Unit => write!(f, "()"),
            RustType::CVoid => write!(f, "c_void"),
            RustType::PointerSized => write!(f, "usize"),
            RustType::Primitive(p) => write!(f, "{}", p.as_str()),
            RustType::Pointer { pointee, mutable: true } => write!(f, "*mut {}", pointee),
            RustType::Pointer { pointee, mutable: false } => write!(f, "*const {}", pointee),
            RustType::Handle(name) => write!(f, "{}", name),
        }
    }
}

// ============================================================================
// Opaque Types
// ============================================================================

/// An opaque handle type declared as `typedef struct Foo Foo;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpaqueType {
    /// Name used by the C header
    pub native_name: String,
    /// Name of the generated handle alias
    pub mapped_name: String,
}

impl OpaqueType {
    /// Opaque type whose generated alias keeps the native name
    pub fn new(native_name: impl Into<String>) -> Self {
        let native_name = native_name.into();
        Self {
            mapped_name: native_name.clone(),
            native_name,
        }
    }

    /// Name of the uninhabited marker enum for this handle kind
    pub fn kind_name(&self) -> String {
        format!("{}Kind", self.mapped_name)
    }
}

/// Set of opaque types keyed by native name.
///
/// Iteration is always in name order so generated output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueTypes {
    by_name: BTreeMap<String, OpaqueType>,
}

impl OpaqueTypes {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an opaque type. Returns false if the native name was already present.
    pub fn insert(&mut self, opaque: OpaqueType) -> bool {
        if self.by_name.contains_key(&opaque.native_name) {
            return false;
        }
        self.by_name.insert(opaque.native_name.clone(), opaque);
        true
    }

    /// Look up by native name
    pub fn get(&self, native_name: &str) -> Option<&OpaqueType> {
        self.by_name.get(native_name)
    }

    /// Check whether a native name is an opaque type
    pub fn contains(&self, native_name: &str) -> bool {
        self.by_name.contains_key(native_name)
    }

    /// Iterate in native-name order
    pub fn iter(&self) -> impl Iterator<Item = &OpaqueType> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Names generated files declare or import besides the handle aliases
pub const GENERATED_ITEM_NAMES: &[&str] = &["Api", "Funcs", "c_char", "c_void"];

impl OpaqueTypes {
    /// Build the set from native typedef names, choosing alias names that
    /// cannot clash in generated code.
    ///
    /// An alias that would collide with a [`GENERATED_ITEM_NAMES`] entry, a
    /// Rust keyword, or another handle's `<Name>Kind` marker gets `Handle`
    /// appended until it is free. Names are assigned in sorted order, so
    /// `Foo` keeps its name and a later `FooKind` becomes `FooKindHandle`.
    pub fn with_handle_names<'a>(native_names: impl IntoIterator<Item = &'a str>) -> Self {
        let native_names: BTreeSet<&str> = native_names.into_iter().collect();
        let mut taken: HashSet<String> =
            GENERATED_ITEM_NAMES.iter().map(|name| name.to_string()).collect();
        let mut set = OpaqueTypes::new();

        for native in native_names {
            let mut mapped = native.to_string();
            while taken.contains(&mapped)
                || taken.contains(&format!("{}Kind", mapped))
                || rust_ident(&mapped) != mapped
            {
                mapped.push_str("Handle");
            }
            if mapped != native {
                warn!("Opaque type {} clashes with a generated name, emitting it as {}", native, mapped);
            }

            let opaque = OpaqueType {
                native_name: native.to_string(),
                mapped_name: mapped,
            };
            taken.insert(opaque.kind_name());
            taken.insert(opaque.mapped_name.clone());
            set.insert(opaque);
        }
        set
    }
}

impl FromIterator<OpaqueType> for OpaqueTypes {
    fn from_iter<I: IntoIterator<Item = OpaqueType>>(iter: I) -> Self {
        let mut set = OpaqueTypes::new();
        for opaque in iter {
            set.insert(opaque);
        }
        set
    }
}

// ============================================================================
// Type Mapper
// ============================================================================

/// Maps C types to Rust type tokens against a fixed set of opaque types.
///
/// Every unrecognized base type is logged once per occurrence and recorded,
/// so a run can report which types fell back to `usize`.
#[derive(Debug)]
pub struct TypeMapper<'a> {
    opaque_types: &'a OpaqueTypes,
    unmapped: RefCell<BTreeSet<String>>,
}

impl<'a> TypeMapper<'a> {
    /// Create a mapper over the opaque types discovered in a header
    pub fn new(opaque_types: &'a OpaqueTypes) -> Self {
        Self {
            opaque_types,
            unmapped: RefCell::new(BTreeSet::new()),
        }
    }

    /// Opaque types this mapper resolves against
    pub fn opaque_types(&self) -> &OpaqueTypes {
        self.opaque_types
    }

    /// Check whether a single word names a type rather than a parameter
    pub fn is_known_type(&self, word: &str) -> bool {
        is_builtin_c_type(word) || self.opaque_types.contains(word)
    }

    /// Base type names that fell back to `usize`, sorted
    pub fn unmapped_types(&self) -> Vec<String> {
        self.unmapped.borrow().iter().cloned().collect()
    }

    /// Map a C type to its Rust token. Total: every input yields a token.
    pub fn map(&self, c_type: &CType) -> RustType {
        let depth = c_type.pointer_depth;
        let base = c_type.base_type.as_str();

        if base == "void" {
            return match depth {
                0 => RustType::Unit,
                1 => RustType::pointer_to(RustType::CVoid, 1, c_type.is_const),
                _ => RustType::pointer_to(RustType::CVoid, 2, c_type.is_const),
            };
        }

        if let Some(primitive) = Primitive::from_c_name(base) {
            return RustType::pointer_to(RustType::Primitive(primitive), depth, c_type.is_const);
        }

        if base == "char" {
            return match depth {
                0..=2 => RustType::pointer_to(
                    RustType::Primitive(Primitive::CChar),
                    depth,
                    c_type.is_const,
                ),
                _ => RustType::PointerSized,
            };
        }

        if let Some(opaque) = self.opaque_types.get(base) {
            let handle = RustType::Handle(opaque.mapped_name.clone());
            // A single native pointer to an opaque struct is the handle value itself.
            return match depth {
                0 | 1 => handle,
                2 => RustType::pointer_to(handle, 1, false),
                _ => RustType::PointerSized,
            };
        }

        warn!(c_type = %c_type, "unrecognized C type, mapping to usize");
        self.unmapped.borrow_mut().insert(base.to_string());
        RustType::PointerSized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(names: &[&str]) -> OpaqueTypes {
        names.iter().map(|n| OpaqueType::new(*n)).collect()
    }

    fn map(text: &str, known: &OpaqueTypes) -> String {
        TypeMapper::new(known).map(&CType::parse(text)).to_string()
    }

    #[test]
    fn test_parse_const_pointer() {
        let ty = CType::parse("const char*");
        assert_eq!(ty, CType::new("char", 1, true));
    }

    #[test]
    fn test_parse_trailing_const() {
        let ty = CType::parse("char * const");
        assert_eq!(ty, CType::new("char", 1, true));
    }

    #[test]
    fn test_pointer_depth_ignores_spacing() {
        assert_eq!(CType::parse("Model * *"), CType::parse("Model**"));
        assert_eq!(CType::parse("Model * *").pointer_depth, 2);
    }

    #[test]
    fn test_ctype_display() {
        assert_eq!(CType::new("char", 2, true).to_string(), "const char**");
        assert_eq!(CType::new("OgaResult", 1, false).to_string(), "OgaResult*");
    }

    #[test]
    fn test_void_rules() {
        let none = OpaqueTypes::new();
        assert_eq!(TypeMapper::new(&none).map(&CType::parse("void")), RustType::Unit);
        assert_eq!(map("void*", &none), "*mut c_void");
        assert_eq!(map("const void*", &none), "*const c_void");
        assert_eq!(map("void**", &none), "*mut *mut c_void");
        assert_eq!(map("void***", &none), "*mut *mut c_void");
    }

    #[test]
    fn test_primitive_rules() {
        let none = OpaqueTypes::new();
        assert_eq!(map("bool", &none), "bool");
        assert_eq!(map("int", &none), "i32");
        assert_eq!(map("int32_t", &none), "i32");
        assert_eq!(map("int64_t", &none), "i64");
        assert_eq!(map("uint8_t", &none), "u8");
        assert_eq!(map("uint16_t", &none), "u16");
        assert_eq!(map("uint32_t", &none), "u32");
        assert_eq!(map("uint64_t", &none), "u64");
        assert_eq!(map("size_t", &none), "usize");
        assert_eq!(map("float", &none), "f32");
        assert_eq!(map("double", &none), "f64");
    }

    #[test]
    fn test_primitive_pointers() {
        let none = OpaqueTypes::new();
        assert_eq!(map("const int32_t*", &none), "*const i32");
        assert_eq!(map("size_t*", &none), "*mut usize");
        assert_eq!(map("const int64_t**", &none), "*mut *const i64");
        assert_eq!(map("float***", &none), "*mut *mut *mut f32");
    }

    #[test]
    fn test_char_rules() {
        let none = OpaqueTypes::new();
        assert_eq!(map("char", &none), "c_char");
        assert_eq!(map("const char*", &none), "*const c_char");
        assert_eq!(map("char*", &none), "*mut c_char");
        assert_eq!(map("const char**", &none), "*mut *const c_char");
        assert_eq!(map("char***", &none), "usize");
    }

    #[test]
    fn test_opaque_rules() {
        let known = opaque(&["OgaModel"]);
        assert_eq!(map("OgaModel", &known), "OgaModel");
        assert_eq!(map("const OgaModel*", &known), "OgaModel");
        assert_eq!(map("OgaModel**", &known), "*mut OgaModel");
        assert_eq!(map("OgaModel***", &known), "usize");
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let known = opaque(&["OgaModel"]);
        let mapper = TypeMapper::new(&known);
        assert_eq!(mapper.map(&CType::parse("OgaElementType")), RustType::PointerSized);
        assert_eq!(mapper.map(&CType::parse("struct Foo*")), RustType::PointerSized);
        assert_eq!(mapper.map(&CType::parse("OgaElementType*")), RustType::PointerSized);
        assert_eq!(
            mapper.unmapped_types(),
            vec!["OgaElementType".to_string(), "struct Foo".to_string()]
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let known = opaque(&["OgaTokenizer"]);
        let first = map("const OgaTokenizer * *", &known);
        let second = map("const OgaTokenizer**", &known);
        assert_eq!(first, second);
        assert_eq!(first, "*mut OgaTokenizer");
    }

    #[test]
    fn test_opaque_set_is_sorted_and_deduplicated() {
        let mut set = opaque(&["Zeta", "Alpha"]);
        assert!(!set.insert(OpaqueType::new("Alpha")));
        let names: Vec<_> = set.iter().map(|o| o.native_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_known_type_words() {
        let known = opaque(&["OgaModel"]);
        let mapper = TypeMapper::new(&known);
        assert!(mapper.is_known_type("OgaModel"));
        assert!(mapper.is_known_type("size_t"));
        assert!(mapper.is_known_type("char"));
        assert!(!mapper.is_known_type("model"));
    }

    #[test]
    fn test_import_detection() {
        let none = OpaqueTypes::new();
        let mapper = TypeMapper::new(&none);
        assert!(mapper.map(&CType::parse("const char**")).uses_c_char());
        assert!(mapper.map(&CType::parse("void*")).uses_c_void());
        assert!(!mapper.map(&CType::parse("int32_t*")).uses_c_char());
    }

    #[test]
    fn test_handle_names_avoid_generated_items() {
        let set = OpaqueTypes::with_handle_names(["Api", "Funcs", "c_void", "Model"]);
        let mapped: Vec<_> = ["Api", "Funcs", "c_void", "Model"]
            .iter()
            .map(|n| set.get(n).unwrap().mapped_name.as_str())
            .collect();
        assert_eq!(mapped, vec!["ApiHandle", "FuncsHandle", "c_voidHandle", "Model"]);
    }

    #[test]
    fn test_handle_names_avoid_marker_enums() {
        let set = OpaqueTypes::with_handle_names(["FooKind", "Foo"]);
        assert_eq!(set.get("Foo").unwrap().mapped_name, "Foo");
        assert_eq!(set.get("FooKind").unwrap().mapped_name, "FooKindHandle");
        assert_eq!(set.get("FooKind").unwrap().kind_name(), "FooKindHandleKind");
    }

    #[test]
    fn test_handle_names_avoid_keywords() {
        let set = OpaqueTypes::with_handle_names(["type", "Self"]);
        assert_eq!(set.get("type").unwrap().mapped_name, "typeHandle");
        assert_eq!(set.get("Self").unwrap().mapped_name, "SelfHandle");
    }

    #[test]
    fn test_renamed_handle_is_used_by_mapper() {
        let set = OpaqueTypes::with_handle_names(["Api"]);
        let mapper = TypeMapper::new(&set);
        assert_eq!(mapper.map(&CType::parse("Api**")).to_string(), "*mut ApiHandle");
    }
}
