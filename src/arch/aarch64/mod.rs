use core::{arch::asm, ffi::c_void};

#[inline(always)]
unsafe fn syscall3(number: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let rc: isize;
    asm!(
        "svc 0",
        in("x8") number,
        in("x0") arg0,
        in("x1") arg1,
        in("x2") arg2,
        lateout("x0") rc,
        options(nostack),
    );
    rc
}

#[inline(always)]
pub(crate) unsafe fn read(fd: i32, buf: *mut c_void, len: usize) -> isize {
    const READ: usize = 63;
    syscall3(READ, fd as isize as usize, buf as usize, len)
}

/// Cleans the data cache and invalidates the instruction cache to the point
/// of unification, one cache line at a time, using the line sizes from
/// `CTR_EL0`.
#[inline(never)]
pub(crate) unsafe fn sync_instruction_cache(start: *const u8, len: usize) {
    if len == 0 {
        return;
    }

    let ctr: usize;
    asm!(
        "mrs {}, ctr_el0",
        out(reg) ctr,
        options(nomem, nostack, preserves_flags),
    );
    let dcache_line = 4usize << ((ctr >> 16) & 0xf);
    let icache_line = 4usize << (ctr & 0xf);

    let begin = start as usize;
    let end = begin + len;

    let mut line = begin & !(dcache_line - 1);
    while line < end {
        asm!("dc cvau, {}", in(reg) line, options(nostack, preserves_flags));
        line += dcache_line;
    }
    asm!("dsb ish", options(nostack, preserves_flags));

    let mut line = begin & !(icache_line - 1);
    while line < end {
        asm!("ic ivau, {}", in(reg) line, options(nostack, preserves_flags));
        line += icache_line;
    }
    asm!("dsb ish", "isb", options(nostack, preserves_flags));
}
