//! Native symbol table for `libc_bindings`.
//!
//! Code generated by hdrbind from `libc_subset.h`. DO NOT EDIT.

#![allow(non_snake_case, clippy::missing_safety_doc, clippy::too_many_arguments)]

use std::ffi::c_char;

use super::api::*;

/// Function pointers resolved from the native library.
pub struct Funcs {
    strlen: unsafe extern "C" fn(*const c_char) -> usize,
    fopen: unsafe extern "C" fn(*const c_char, *const c_char) -> FILE,
    fclose: unsafe extern "C" fn(FILE) -> i32,
}

impl Funcs {
    /// Resolve every exported symbol from `library`.
    ///
    /// # Safety
    ///
    /// `library` must be the library described by `libc_subset.h`, and it must stay
    /// loaded for as long as the returned table is used.
    pub unsafe fn load(library: &::hdrbind_runtime::Library) -> ::hdrbind_runtime::LoadResult<Self> {
        Ok(Self {
            strlen: unsafe { ::hdrbind_runtime::resolve(library, "strlen")? },
            fopen: unsafe { ::hdrbind_runtime::resolve(library, "fopen")? },
            fclose: unsafe { ::hdrbind_runtime::resolve(library, "fclose")? },
        })
    }
}

impl Api for Funcs {
    unsafe fn strlen(&self, s: *const c_char) -> usize {
        unsafe { (self.strlen)(s) }
    }

    unsafe fn fopen(&self, path: *const c_char, mode: *const c_char) -> FILE {
        unsafe { (self.fopen)(path, mode) }
    }

    unsafe fn fclose(&self, stream: FILE) -> i32 {
        unsafe { (self.fclose)(stream) }
    }
}
