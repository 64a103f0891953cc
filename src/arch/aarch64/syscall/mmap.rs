use core::arch::asm;

// Protection flags:
pub const PROT_READ: usize = 0x1;
pub const PROT_WRITE: usize = 0x2;
pub const PROT_EXEC: usize = 0x4;

// MAP flags:
pub const MAP_PRIVATE: usize = 0x2;

/// Raw `mmap(2)`. Returns the mapped address, or `-errno` on failure.
#[inline(always)]
pub unsafe fn mmap(
    pointer: *mut u8,
    size: usize,
    protection_flags: usize,
    map_flags: usize,
    file_descriptor: isize,
    file_offset: usize,
) -> isize {
    const MMAP: usize = 222;

    let result: isize;
    asm!(
        "svc 0",
        in("x8") MMAP,
        inlateout("x0") pointer => result,
        in("x1") size,
        in("x2") protection_flags,
        in("x3") map_flags,
        in("x4") file_descriptor,
        in("x5") file_offset,
        options(nostack)
    );
    result
}

#[inline(always)]
pub unsafe fn munmap(pointer: *mut u8, size: usize) -> isize {
    const MUNMAP: usize = 215;

    let result: isize;
    asm!(
        "svc 0",
        in("x8") MUNMAP,
        inlateout("x0") pointer => result,
        in("x1") size,
        options(nostack)
    );
    result
}
