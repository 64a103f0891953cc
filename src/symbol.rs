//! Symbol resolution, the one capability handed to loaded code.

use core::{
    cell::Cell,
    ffi::{c_char, c_void},
    marker::PhantomData,
    ptr::{null_mut, NonNull},
};
use memchr::memchr;
use rustc_hash::FxHashSet;
use smartstring::alias::String as SmartString;
use std::ffi::CStr;
use tracing::trace;

/// `dlsym`-compatible lookup routine: `(handle, name) -> address or NULL`.
pub type DlsymFn = unsafe extern "C" fn(handle: *mut c_void, name: *const c_char) -> *mut c_void;

/// The "default/global" lookup scope.
pub const RTLD_DEFAULT: *mut c_void = null_mut();

unsafe extern "C" {
    fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
}

/// Resolves symbol names to addresses on behalf of loaded code.
pub trait SymbolResolver {
    fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>>;

    /// A C routine loaded code may call directly instead of going through
    /// the dispatch shim. Only resolvers that are a thin veneer over such a
    /// routine return `Some`.
    fn native_entry(&self) -> Option<DlsymFn> {
        None
    }
}

/// Looks names up among the libraries loaded into the host process.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostResolver;

impl SymbolResolver for HostResolver {
    fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>> {
        NonNull::new(unsafe { dlsym(RTLD_DEFAULT, name.as_ptr()) })
    }

    fn native_entry(&self) -> Option<DlsymFn> {
        Some(dlsym)
    }
}

/// Forwards lookups to `inner` only for names on an allow list.
///
/// A versioned request (`name@VERSION`) is matched by its base name.
#[derive(Debug, Clone)]
pub struct AllowlistResolver<R = HostResolver> {
    allowed: FxHashSet<SmartString>,
    inner: R,
}

impl<R: SymbolResolver> AllowlistResolver<R> {
    pub fn new<I, S>(names: I, inner: R) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = names
            .into_iter()
            .map(|name| SmartString::from(strip_version_suffix(name.as_ref())))
            .collect();
        Self { allowed, inner }
    }

    pub fn from_set(allowed: FxHashSet<SmartString>, inner: R) -> Self {
        Self { allowed, inner }
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(strip_version_suffix(name))
    }
}

impl<R: SymbolResolver> SymbolResolver for AllowlistResolver<R> {
    fn resolve(&self, name: &CStr) -> Option<NonNull<c_void>> {
        let requested = name.to_str().ok()?;
        if !self.is_allowed(requested) {
            trace!(symbol = requested, "symbol not on allow list");
            return None;
        }

        self.inner.resolve(name).or_else(|| {
            let base_name = strip_version_suffix(requested);
            if base_name.len() == requested.len() {
                return None;
            }
            let base_name = std::ffi::CString::new(base_name).ok()?;
            self.inner.resolve(&base_name)
        })
    }
}

#[inline(always)]
pub(crate) fn strip_version_suffix(name: &str) -> &str {
    if let Some(idx) = memchr(b'@', name.as_bytes()) {
        &name[..idx]
    } else {
        name
    }
}

thread_local! {
    static ACTIVE_RESOLVER: Cell<Option<*const (dyn SymbolResolver + 'static)>> =
        const { Cell::new(None) };
}

/// Restores the previously active resolver when dropped.
pub(crate) struct ActiveResolverGuard<'a> {
    previous: Option<*const (dyn SymbolResolver + 'static)>,
    _resolver: PhantomData<&'a dyn SymbolResolver>,
}

impl Drop for ActiveResolverGuard<'_> {
    fn drop(&mut self) {
        ACTIVE_RESOLVER.with(|active| active.set(self.previous));
    }
}

/// Routes [`dispatch_dlsym`] on this thread to `resolver` until the guard is
/// dropped.
pub(crate) fn activate<'a>(resolver: &'a (dyn SymbolResolver + 'a)) -> ActiveResolverGuard<'a> {
    let resolver: *const (dyn SymbolResolver + 'a) = resolver;
    // The guard borrows `resolver` and clears the slot when dropped.
    let resolver: *const (dyn SymbolResolver + 'static) = unsafe { core::mem::transmute(resolver) };
    let previous = ACTIVE_RESOLVER.with(|active| active.replace(Some(resolver)));
    ActiveResolverGuard {
        previous,
        _resolver: PhantomData,
    }
}

/// `dlsym`-shaped entry for resolvers without a native routine. The handle is
/// ignored: every lookup goes through the active resolver.
pub(crate) unsafe extern "C" fn dispatch_dlsym(
    handle: *mut c_void,
    name: *const c_char,
) -> *mut c_void {
    if name.is_null() {
        return null_mut();
    }
    let name = unsafe { CStr::from_ptr(name) };

    let resolved = ACTIVE_RESOLVER.with(|active| {
        let resolver = active.get()?;
        unsafe { (*resolver).resolve(name) }
    });
    trace!(symbol = ?name, ?handle, resolved = ?resolved, "dlsym");

    resolved.map_or(null_mut(), NonNull::as_ptr)
}
