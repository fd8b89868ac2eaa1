//! Runtime support for hdrbind-generated bindings
//!
//! Generated `api.rs` files declare one `Handle<Kind>` alias per opaque
//! native type; generated `funcs.rs` files call [`resolve`] once per
//! exported function when the function table is loaded.
//!
//! Loading the shared library itself is left to the caller; `Library` is
//! re-exported so generated code and callers agree on the type.

pub mod error;
pub mod handle;
pub mod symbol;

pub use error::{LoadError, LoadResult};
pub use handle::{Handle, RawHandle};
pub use libloading::Library;
pub use symbol::resolve;
