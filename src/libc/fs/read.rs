use crate::arch;
use crate::libc::errno::Errno;
use std::ffi::c_void;
use std::os::fd::AsRawFd;
use std::os::fd::BorrowedFd;

/// Raw `read(2)` on a borrowed descriptor. Returns the byte count, which may
/// be short, or the kernel's errno.
pub(crate) unsafe fn read(
    file_descriptor: BorrowedFd<'_>,
    buffer_pointer: *mut c_void,
    buffer_length_in_bytes: usize,
) -> Result<usize, Errno> {
    Errno::from_syscall_result(arch::read(
        file_descriptor.as_raw_fd(),
        buffer_pointer,
        buffer_length_in_bytes,
    ))
}
