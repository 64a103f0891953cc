use crate::{
    config::LoaderConfig,
    error::LoadError,
    module::{FileOpener, HostFilesystem, MappedModule},
    symbol::{AllowlistResolver, HostResolver, SymbolResolver},
    trampoline::{self, EntryStatus, ENTRY_OFFSET},
};
use std::path::Path;
use tracing::debug;

/// High-level loader entrypoints.
///
/// `ModuleLoader` maps a module file, fills it, and calls its entry point
/// with a [`LoadContext`](crate::LoadContext) backed by its resolver.
pub struct ModuleLoader {
    resolver: Box<dyn SymbolResolver>,
}

impl ModuleLoader {
    /// Create a `ModuleLoader` that lets loaded code resolve any symbol in
    /// the host process.
    pub fn new() -> Self {
        Self::with_resolver(HostResolver)
    }

    /// Create a `ModuleLoader` whose loaded code resolves symbols through
    /// `resolver`.
    pub fn with_resolver(resolver: impl SymbolResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Create a `ModuleLoader` from configuration: an allow list when one is
    /// configured, the host resolver otherwise.
    pub fn with_config(config: &LoaderConfig) -> Self {
        match &config.allowed_symbols {
            Some(allowed) => {
                debug!(symbols = allowed.len(), "restricting symbol resolution");
                Self::with_resolver(AllowlistResolver::from_set(allowed.clone(), HostResolver))
            }
            None => Self::new(),
        }
    }

    pub fn resolver(&self) -> &dyn SymbolResolver {
        self.resolver.as_ref()
    }

    /// Maps and populates the module at `path`.
    pub fn load(&self, path: &Path) -> Result<MappedModule, LoadError> {
        self.load_with(&HostFilesystem, path)
    }

    pub fn load_with<O: FileOpener + ?Sized>(
        &self,
        opener: &O,
        path: &Path,
    ) -> Result<MappedModule, LoadError> {
        let start_time = std::time::Instant::now();
        let module = MappedModule::load_with(opener, path)?;
        debug!(
            path = %path.display(),
            size = module.len(),
            elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
            "module loaded"
        );
        Ok(module)
    }

    /// Calls the entry point of `module`.
    ///
    /// # Safety
    ///
    /// This transfers execution to the module's code; see
    /// [`trampoline::call`].
    pub unsafe fn execute(&self, module: MappedModule) -> Result<EntryStatus, LoadError> {
        self.execute_with(module, |_| {})
    }

    /// Same as `execute`, running `before_jump` with the entry offset once the
    /// entry point has passed its bounds check and right before control
    /// leaves the loader.
    ///
    /// The module is never unmapped once entered: loaded code may hand out
    /// pointers into its own region that outlive the call.
    ///
    /// # Safety
    ///
    /// See [`ModuleLoader::execute`].
    pub unsafe fn execute_with<F>(
        &self,
        module: MappedModule,
        before_jump: F,
    ) -> Result<EntryStatus, LoadError>
    where
        F: FnOnce(usize),
    {
        let entry = trampoline::entry_point(&module)?;
        debug!(
            base = ?module.base(),
            entry = ?(entry as *const ()),
            "jumping to module entry"
        );
        before_jump(ENTRY_OFFSET);

        let status = trampoline::call(entry, self.resolver());
        module.leak();

        debug!(code = status.code(), %status, "module entry returned");
        Ok(status)
    }

    /// Loads `path` and calls its entry point.
    ///
    /// # Safety
    ///
    /// See [`ModuleLoader::execute`].
    pub unsafe fn run_file(&self, path: &Path) -> Result<EntryStatus, LoadError> {
        let module = self.load(path)?;
        self.execute(module)
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempModule;
    use std::cell::Cell;

    #[test]
    fn config_without_allow_list_uses_the_host_resolver() {
        let loader = ModuleLoader::with_config(&LoaderConfig::default());
        assert!(loader.resolver().native_entry().is_some());
        assert!(loader.resolver().resolve(c"puts").is_some());
    }

    #[test]
    fn config_with_allow_list_restricts_resolution() {
        let config = LoaderConfig {
            allowed_symbols: Some(crate::config::parse_symbol_list("malloc")),
            ..LoaderConfig::default()
        };
        let loader = ModuleLoader::with_config(&config);
        assert!(loader.resolver().native_entry().is_none());
        assert!(loader.resolver().resolve(c"malloc").is_some());
        assert!(loader.resolver().resolve(c"puts").is_none());
    }

    #[test]
    fn undersized_module_never_reaches_the_jump() {
        let file = TempModule::new("undersized", &[0xc3; 64]);
        let loader = ModuleLoader::new();
        let module = loader.load(file.path()).unwrap();

        let jumped = Cell::new(false);
        let error = unsafe { loader.execute_with(module, |_| jumped.set(true)) }.unwrap_err();
        assert!(matches!(error, LoadError::EntryOutOfBounds { size: 64, .. }));
        assert!(!jumped.get());
    }

    #[test]
    fn run_file_reports_open_failures() {
        let error = unsafe { ModuleLoader::new().run_file(Path::new("/nonexistent/module")) }
            .unwrap_err();
        assert_eq!(error.operation(), "open");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn run_file_calls_the_entry_point() {
        use crate::test_support::x86_64::return_module;

        let ok = TempModule::with_entry("run-ok", &return_module(0));
        let failing = TempModule::with_entry("run-fail", &return_module(42));
        let loader = ModuleLoader::new();

        assert_eq!(unsafe { loader.run_file(ok.path()) }.unwrap(), EntryStatus::Success);
        assert_eq!(
            unsafe { loader.run_file(failing.path()) }.unwrap(),
            EntryStatus::Failure(42)
        );
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn before_jump_sees_the_entry_offset() {
        use crate::test_support::x86_64::return_module;

        let file = TempModule::with_entry("announce", &return_module(0));
        let loader = ModuleLoader::new();
        let module = loader.load(file.path()).unwrap();

        let announced = Cell::new(None);
        let status = unsafe { loader.execute_with(module, |offset| announced.set(Some(offset))) };
        assert_eq!(status.unwrap(), EntryStatus::Success);
        assert_eq!(announced.get(), Some(ENTRY_OFFSET));
    }
}
