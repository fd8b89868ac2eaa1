//! Opaque Handle Type
//!
//! Every opaque struct declared by a native header (`typedef struct Foo Foo;`)
//! becomes a `Handle<FooKind>` in generated code. The runtime representation
//! is a single pointer-sized integer where zero means "absent", matching how
//! the native library hands out `Foo*` values.
//!
//! The kind parameter is an uninhabited marker enum emitted once per opaque
//! type, so a `Handle<ModelKind>` cannot be passed where a
//! `Handle<TokenizerKind>` is expected even though both are `usize` at the
//! ABI boundary.
//!
//! ## Example
//!
//! ```
//! use hdrbind_runtime::Handle;
//!
//! pub enum ModelKind {}
//! pub type Model = Handle<ModelKind>;
//!
//! let mut model = Model::null();
//! assert!(model.is_null());
//!
//! // Out-parameter slot for `OgaCreateModel(const char*, OgaModel**)`
//! let slot: *mut Model = model.out_ptr();
//! unsafe { slot.write(Model::from_raw(0x1000)) };
//! assert_eq!(model.as_raw(), 0x1000);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Raw handle representation shared by every handle kind.
pub type RawHandle = usize;

/// Typed opaque handle to a native resource.
///
/// `#[repr(transparent)]` over [`RawHandle`], so it can be passed by value
/// wherever the C API expects `Foo*`, and `*mut Handle<K>` can be passed
/// wherever it expects `Foo**`.
#[repr(transparent)]
pub struct Handle<K> {
    raw: RawHandle,
    // fn() -> K keeps the handle Send + Sync and Copy regardless of K.
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    /// The absent handle.
    pub const NULL: Self = Self::from_raw(0);

    /// Create a handle from its raw value
    pub const fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Create the absent handle
    pub const fn null() -> Self {
        Self::NULL
    }

    /// Get the raw value
    pub const fn as_raw(&self) -> RawHandle {
        self.raw
    }

    /// Check whether the handle is absent (zero)
    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// `None` for the absent handle, `Some(self)` otherwise
    pub fn non_null(self) -> Option<Self> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    /// Pointer to this handle, for out-parameters that populate it.
    pub fn out_ptr(&mut self) -> *mut Self {
        self as *mut Self
    }

    /// Take the handle, leaving the absent handle in its place.
    ///
    /// Useful in `Drop` implementations so a released handle is never
    /// released twice.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::NULL)
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Handle<K> {}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({:#x})", kind_name::<K>(), self.raw)
    }
}

impl<K> fmt::Pointer for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&(self.raw as *const ()), f)
    }
}

/// Last path segment of the marker type name
fn kind_name<K>() -> &'static str {
    let full = std::any::type_name::<K>();
    full.rsplit("::").next().unwrap_or(full)
}
