use crate::symbol::{dispatch_dlsym, DlsymFn, SymbolResolver};

/// The structure loaded code receives a pointer to.
///
/// Its layout is a contract with module authors: a single function pointer
/// slot holding a `dlsym`-compatible routine.
///
/// ```c
/// typedef struct module_init_ctx {
///     void *(*dlsym)(void *handle, const char *symbol);
/// } module_init_ctx_t;
/// ```
#[repr(C)]
pub struct LoadContext {
    pub dlsym: DlsymFn,
}

impl LoadContext {
    /// Builds the context for `resolver`.
    ///
    /// Resolvers that are not backed by a native routine are reached through
    /// a thread-local dispatch, so the caller must keep the resolver active
    /// (see `symbol::activate`) for as long as loaded code may call back.
    pub fn for_resolver(resolver: &dyn SymbolResolver) -> Self {
        Self {
            dlsym: resolver.native_entry().unwrap_or(dispatch_dlsym),
        }
    }
}
