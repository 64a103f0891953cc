use core::{arch::asm, ffi::c_void};

#[inline(always)]
pub(crate) unsafe fn read(fd: i32, buf: *mut c_void, len: usize) -> isize {
    const READ: usize = 0;
    let rc: isize;
    asm!(
        "syscall",
        inlateout("rax") READ => rc,
        in("rdi") fd as isize,
        in("rsi") buf,
        in("rdx") len,
        lateout("rcx") _,
        lateout("r11") _,
        options(nostack, preserves_flags),
    );
    rc
}

// x86 keeps instruction fetch coherent with data writes.
#[inline(always)]
pub(crate) unsafe fn sync_instruction_cache(_start: *const u8, _len: usize) {}
