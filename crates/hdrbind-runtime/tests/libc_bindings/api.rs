//! Native API surface for `libc_bindings`.
//!
//! Code generated by hdrbind from `libc_subset.h`. DO NOT EDIT.

#![allow(non_snake_case, clippy::missing_safety_doc, clippy::too_many_arguments)]

use std::ffi::c_char;

/// Marker for the `FILE` handle kind.
pub enum FILEKind {}

/// Opaque handle to a native `FILE`.
pub type FILE = ::hdrbind_runtime::Handle<FILEKind>;

/// Functions exported by `libc_subset.h`.
pub trait Api {
    /// Calls `strlen`.
    unsafe fn strlen(&self, s: *const c_char) -> usize;

    /// Calls `fopen`.
    unsafe fn fopen(&self, path: *const c_char, mode: *const c_char) -> FILE;

    /// Calls `fclose`.
    unsafe fn fclose(&self, stream: FILE) -> i32;
}
