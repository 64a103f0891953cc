//! Maps a raw native-code module into executable memory and calls into it at
//! a fixed offset.
//!
//! A module is an opaque file whose byte `0x1000` starts a function with the
//! C signature `int entry(module_init_ctx_t *ctx)`. The context carries one
//! capability: a `dlsym`-compatible routine for resolving symbols among the
//! libraries already loaded into the host process.

#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
)))]
compile_error!("modload supports Linux on x86_64 and aarch64 only");

pub(crate) mod arch;
#[cfg_attr(target_arch = "x86_64", path = "arch/x86_64/syscall/mod.rs")]
#[cfg_attr(target_arch = "aarch64", path = "arch/aarch64/syscall/mod.rs")]
pub mod syscall;

pub mod cli;
pub mod config;
pub mod runtime_loader;
pub mod symbol;
pub mod trampoline;

mod c_api;
mod context;
mod error;
mod libc;
mod module;

#[cfg(test)]
mod test_support;

pub use c_api::{
    modload_resolve_symbol, modload_run_file, MODLOAD_EINVAL, MODLOAD_EIO, MODLOAD_EPANIC,
    MODLOAD_ERANGE, MODLOAD_OK,
};
pub use config::LoaderConfig;
pub use context::LoadContext;
pub use error::LoadError;
pub use module::{FileOpener, HostFilesystem, MappedModule};
pub use runtime_loader::ModuleLoader;
pub use symbol::{AllowlistResolver, HostResolver, SymbolResolver};
pub use trampoline::{EntryStatus, ENTRY_OFFSET};
