use crate::{
    error::LoadError,
    runtime_loader::ModuleLoader,
    symbol::{HostResolver, SymbolResolver},
};
use core::{
    ffi::{c_char, c_void},
    ptr::{null_mut, NonNull},
};
use std::{ffi::CStr, ffi::OsStr, os::unix::ffi::OsStrExt, path::Path};

pub const MODLOAD_OK: i32 = 0;
pub const MODLOAD_EINVAL: i32 = 1;
pub const MODLOAD_EPANIC: i32 = 2;
pub const MODLOAD_EIO: i32 = 3;
pub const MODLOAD_ERANGE: i32 = 4;

fn error_code(error: &LoadError) -> i32 {
    match error {
        LoadError::EntryOutOfBounds { .. } => MODLOAD_ERANGE,
        LoadError::Open(_)
        | LoadError::Stat(_)
        | LoadError::TooLarge(_)
        | LoadError::Map(_)
        | LoadError::Read(_)
        | LoadError::ShortRead { .. } => MODLOAD_EIO,
    }
}

/// C ABI wrapper over `ModuleLoader::run_file` with the host resolver.
///
/// On `MODLOAD_OK`, `*out_status` holds the raw value the module's entry
/// point returned. Any other return value means the entry point was not
/// called:
/// - `MODLOAD_EINVAL`: `path` or `out_status` is null, or `path` is empty.
/// - `MODLOAD_EIO`: the file could not be opened, sized, mapped or read.
/// - `MODLOAD_ERANGE`: the file is too short to contain an entry point.
/// - `MODLOAD_EPANIC`: the loader panicked.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn modload_run_file(path: *const c_char, out_status: *mut i32) -> i32 {
    if path.is_null() || out_status.is_null() {
        return MODLOAD_EINVAL;
    }

    let path_bytes = CStr::from_ptr(path).to_bytes();
    if path_bytes.is_empty() {
        return MODLOAD_EINVAL;
    }
    let path = Path::new(OsStr::from_bytes(path_bytes));

    let result = std::panic::catch_unwind(|| unsafe { ModuleLoader::new().run_file(path) });

    match result {
        Ok(Ok(status)) => {
            *out_status = status.code();
            MODLOAD_OK
        }
        Ok(Err(error)) => error_code(&error),
        Err(_) => MODLOAD_EPANIC,
    }
}

/// Resolves `name` the way a module's load context does with the host
/// resolver. Returns null for unknown names and for a null `name`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn modload_resolve_symbol(name: *const c_char) -> *mut c_void {
    if name.is_null() {
        return null_mut();
    }
    HostResolver
        .resolve(CStr::from_ptr(name))
        .map_or(null_mut(), NonNull::as_ptr)
}
