#![allow(dead_code)]

use modload::ENTRY_OFFSET;
use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct ModuleFile {
    path: PathBuf,
}

impl ModuleFile {
    pub fn new(label: &str, contents: &[u8]) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "modload-it-{}-{}-{}.bin",
            std::process::id(),
            id,
            label
        ));
        fs::write(&path, contents).unwrap();
        Self { path }
    }

    pub fn with_entry(label: &str, code: &[u8]) -> Self {
        let mut contents = vec![0u8; ENTRY_OFFSET];
        contents.extend_from_slice(code);
        Self::new(label, &contents)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ModuleFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub fn modload() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_modload"));
    command.env_remove("MODLOAD_LOG").env_remove("MODLOAD_ALLOW_SYMBOLS");
    command
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[cfg(target_arch = "x86_64")]
pub mod x86_64 {
    /// `mov eax, code; ret`
    pub fn return_module(code: i32) -> Vec<u8> {
        let mut bytes = vec![0xb8];
        bytes.extend_from_slice(&code.to_le_bytes());
        bytes.push(0xc3);
        bytes
    }

    /// Returns 0 when `context->dlsym(RTLD_DEFAULT, name)` is non-null.
    pub fn lookup_module(name: &str) -> Vec<u8> {
        let mut bytes = vec![
            0x53, //             push rbx
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

    /// Resolves `puts` through the context and prints `message` with it.
    /// Returns 1 if `puts` did not resolve.
    pub fn hello_module(message: &str) -> Vec<u8> {
        let mut bytes = vec![
            0x53, //             push rbx
            0x48, 0x8b, 0x07, // mov rax, [rdi]
            0x31, 0xff, //       xor edi, edi
            0x48, 0x8d, 0x35, 0x1b, 0x00, 0x00, 0x00, // lea rsi, [rip + 27] ; "puts"
            0xff, 0xd0, //       call rax
            0x48, 0x85, 0xc0, // test rax, rax
            0x74, 0x0d, //       jz fail
            0x48, 0x8d, 0x3d, 0x12, 0x00, 0x00, 0x00, // lea rdi, [rip + 18] ; message
            0xff, 0xd0, //       call rax
            0x31, 0xc0, //       xor eax, eax
            0x5b, //             pop rbx
            0xc3, //             ret
            0xb8, 0x01, 0x00, 0x00, 0x00, // fail: mov eax, 1
            0x5b, //             pop rbx
            0xc3, //             ret
        ];
        bytes.extend_from_slice(b"puts\0");
        bytes.extend_from_slice(message.as_bytes());
        bytes.push(0);
        bytes
    }
}
