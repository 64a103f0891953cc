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
    const MMAP: usize = 9;

    let result: isize;
    asm!(
        "syscall",
        inlateout("rax") MMAP => result,
        in("rdi") pointer,
        in("rsi") size,
        in("rdx") protection_flags,
        in("r10") map_flags,
        in("r8") file_descriptor,
        in("r9") file_offset,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack),
    );
    result
}

#[inline(always)]
pub unsafe fn munmap(pointer: *mut u8, size: usize) -> isize {
    const MUNMAP: usize = 11;

    let result: isize;
    asm!(
        "syscall",
        inlateout("rax") MUNMAP => result,
        in("rdi") pointer,
        in("rsi") size,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack),
    );
    result
}
