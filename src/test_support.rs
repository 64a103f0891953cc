use crate::trampoline::ENTRY_OFFSET;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// A module file in the temporary directory, removed on drop.
pub(crate) struct TempModule {
    path: PathBuf,
}

impl TempModule {
    pub(crate) fn new(label: &str, contents: &[u8]) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "modload-unit-{}-{}-{}.bin",
            std::process::id(),
            id,
            label
        ));
        fs::write(&path, contents).unwrap();
        Self { path }
    }

    /// A module with `code` placed at the entry offset.
    pub(crate) fn with_entry(label: &str, code: &[u8]) -> Self {
        let mut contents = vec![0u8; ENTRY_OFFSET];
        contents.extend_from_slice(code);
        Self::new(label, &contents)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempModule {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64 {
    /// `mov eax, code; ret`
    pub(crate) fn return_module(code: i32) -> Vec<u8> {
        let mut bytes = vec![0xb8];
        bytes.extend_from_slice(&code.to_le_bytes());
        bytes.push(0xc3);
        bytes
    }

    /// Calls `context->dlsym(RTLD_DEFAULT, name)` and returns 0 when the
    /// symbol resolved, 1 otherwise.
    pub(crate) fn lookup_module(name: &str) -> Vec<u8> {
        let mut bytes = vec![
            0x53, //             push rbx (realigns the stack)
            0x48, 0x8b, 0x07, // mov rax, [rdi]
            0x31, 0xff, //       xor edi, edi
            0x48, 0x8d, 0x35, 0x0e, 0x00, 0x00, 0x00, // lea rsi, [rip + 14]
            0xff, 0xd0, //       call rax
            0x31, 0xc9, //       xor ecx, ecx
            0x48, 0x85, 0xc0, // test rax, rax
            0x0f, 0x94, 0xc1, // sete cl
            0x89, 0xc8, //       mov eax, ecx
            0x5b, //             pop rbx
            0xc3, //             ret
        ];
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
        bytes
    }
}
