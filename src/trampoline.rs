//! Turning an offset into a mapped module into a call.

use crate::{
    context::LoadContext,
    error::LoadError,
    module::MappedModule,
    symbol::{self, SymbolResolver},
};
use core::fmt;
use tracing::trace;

/// Byte offset of the entry point from the start of the module.
pub const ENTRY_OFFSET: usize = 0x1000;

/// Bytes that must exist at the entry point: one instruction.
#[cfg(target_arch = "x86_64")]
pub const MIN_ENTRY_SIZE: usize = 1;
#[cfg(target_arch = "aarch64")]
pub const MIN_ENTRY_SIZE: usize = 4;

/// Signature of a module entry point.
pub type EntryFn = unsafe extern "C" fn(context: *const LoadContext) -> i32;

/// What the entry point reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Success,
    Failure(i32),
}

impl EntryStatus {
    pub fn from_return_value(code: i32) -> Self {
        if code == 0 {
            EntryStatus::Success
        } else {
            EntryStatus::Failure(code)
        }
    }

    pub fn is_success(self) -> bool {
        self == EntryStatus::Success
    }

    /// The raw value the entry point returned.
    pub fn code(self) -> i32 {
        match self {
            EntryStatus::Success => 0,
            EntryStatus::Failure(code) => code,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryStatus::Success => "success",
            EntryStatus::Failure(_) => "failure",
        })
    }
}

/// Returns the entry point of `module`, refusing modules too short to hold
/// one.
///
/// Only the bounds are checked. Whatever bytes sit at [`ENTRY_OFFSET`] are
/// executed as-is.
pub fn entry_point(module: &MappedModule) -> Result<EntryFn, LoadError> {
    if module.len() < ENTRY_OFFSET + MIN_ENTRY_SIZE {
        return Err(LoadError::EntryOutOfBounds {
            offset: ENTRY_OFFSET,
            size: module.len(),
        });
    }

    let address = unsafe { module.base().add(ENTRY_OFFSET) };
    Ok(unsafe { core::mem::transmute::<*const u8, EntryFn>(address) })
}

/// Calls `entry` with a fresh [`LoadContext`] for `resolver`.
///
/// # Safety
///
/// `entry` must point at code that follows the C calling convention for
/// [`EntryFn`]. That code runs with the full privileges of this process and
/// may do anything, including never returning.
pub unsafe fn call(entry: EntryFn, resolver: &dyn SymbolResolver) -> EntryStatus {
    let _active = symbol::activate(resolver);
    let context = LoadContext::for_resolver(resolver);

    trace!(entry = ?(entry as *const ()), "calling module entry");
    let code = entry(&context);
    flush_c_stdio();
    trace!(code, "module entry returned");

    EntryStatus::from_return_value(code)
}

/// Bounds-checks and calls the entry point of `module`.
///
/// # Safety
///
/// See [`call`].
pub unsafe fn invoke(
    module: &MappedModule,
    resolver: &dyn SymbolResolver,
) -> Result<EntryStatus, LoadError> {
    let entry = entry_point(module)?;
    Ok(call(entry, resolver))
}

// Loaded code usually writes through the host's libc; push that out before
// the loader prints anything else.
unsafe fn flush_c_stdio() {
    unsafe extern "C" {
        fn fflush(stream: *mut core::ffi::c_void) -> i32;
    }
    let _ = fflush(core::ptr::null_mut());
}
