use core::ffi::c_void;

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "aarch64")]
use aarch64 as imp;
#[cfg(target_arch = "x86_64")]
use x86_64 as imp;

#[inline(always)]
pub(crate) unsafe fn read(fd: i32, buf: *mut c_void, len: usize) -> isize {
    imp::read(fd, buf, len)
}

/// Makes freshly written bytes in `[start, start + len)` visible to
/// instruction fetch.
#[inline(always)]
pub(crate) unsafe fn sync_instruction_cache(start: *const u8, len: usize) {
    imp::sync_instruction_cache(start, len)
}
