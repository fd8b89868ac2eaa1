//! Native symbol resolution used by generated `Funcs::load` routines.

use libloading::Library;

use crate::error::{LoadError, LoadResult};

/// Resolve the exported symbol `name` from `library` as a value of type `F`.
///
/// `F` is the `unsafe extern "C" fn(..) -> ..` type of the field being
/// populated. The returned value is copied out of the symbol, so it stays
/// valid only as long as `library` remains loaded.
///
/// # Safety
///
/// `F` must match the native symbol's actual signature, and the caller must
/// keep `library` loaded for as long as the returned value is used.
pub unsafe fn resolve<F: Copy>(library: &Library, name: &str) -> LoadResult<F> {
    let symbol = library
        .get::<F>(name.as_bytes())
        .map_err(|source| LoadError::MissingSymbol {
            name: name.to_string(),
            source,
        })?;
    Ok(*symbol)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::c_char;

    fn this_process() -> Library {
        libloading::os::unix::Library::this().into()
    }

    #[test]
    fn test_resolve_libc_symbol() {
        let library = this_process();
        let strlen: unsafe extern "C" fn(*const c_char) -> usize =
            unsafe { resolve(&library, "strlen") }.unwrap();
        let text = b"hdrbind\0";
        assert_eq!(unsafe { strlen(text.as_ptr().cast()) }, 7);
    }

    #[test]
    fn test_missing_symbol_names_export() {
        let library = this_process();
        let result: LoadResult<unsafe extern "C" fn()> =
            unsafe { resolve(&library, "hdrbind_no_such_export") };
        match result {
            Err(LoadError::MissingSymbol { name, .. }) => {
                assert_eq!(name, "hdrbind_no_such_export");
            }
            Ok(_) => panic!("expected a missing symbol error"),
        }
    }
}
