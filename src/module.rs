//! Acquiring a module file as an executable mapping and filling it with the
//! file's bytes.

use crate::{
    arch,
    error::LoadError,
    libc::{errno::Errno, fs::read},
    syscall::mmap::{mmap, munmap, MAP_PRIVATE, PROT_EXEC, PROT_READ, PROT_WRITE},
};
use std::{
    fs::File,
    io,
    os::fd::{AsFd, AsRawFd},
    path::Path,
    ptr::{null_mut, NonNull},
};
use tracing::{debug, trace, warn};

/// The filesystem operation the loader starts with.
///
/// Everything after `open` works on the returned descriptor, so replacing
/// this is enough to observe or redirect file access.
pub trait FileOpener {
    fn open(&self, path: &Path) -> io::Result<File>;
}

/// Opens paths read-only on the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFilesystem;

impl FileOpener for HostFilesystem {
    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }
}

/// A readable, writable and executable private mapping of a module file.
///
/// The region is exactly as long as the file was when it was mapped. Dropping
/// a `MappedModule` unmaps it and closes the descriptor.
pub struct MappedModule {
    base: NonNull<u8>,
    len: usize,
    file: File,
}

impl MappedModule {
    /// Opens `path`, reads its size and maps it. The region is not populated
    /// yet; see [`MappedModule::populate`].
    pub fn acquire(path: &Path) -> Result<Self, LoadError> {
        Self::acquire_with(&HostFilesystem, path)
    }

    pub fn acquire_with<O: FileOpener + ?Sized>(
        opener: &O,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let file = opener.open(path).map_err(LoadError::Open)?;

        let file_len = file.metadata().map_err(LoadError::Stat)?.len();
        let len = usize::try_from(file_len).map_err(|_| LoadError::TooLarge(file_len))?;

        let mapped = unsafe {
            mmap(
                null_mut(),
                len,
                PROT_READ | PROT_WRITE | PROT_EXEC,
                MAP_PRIVATE,
                file.as_raw_fd() as isize,
                0,
            )
        };
        let address = Errno::from_syscall_result(mapped)
            .map_err(|errno| LoadError::Map(errno.into()))?;
        let base = NonNull::new(address as *mut u8)
            .ok_or_else(|| LoadError::Map(Errno::INVAL.into()))?;

        debug!(path = %path.display(), size = len, base = ?base, "mapped module");
        Ok(Self { base, len, file })
    }

    /// Copies the file's contents into the region.
    ///
    /// Interrupted and partial reads are resumed until the whole file has
    /// been read. Reaching end of file early is an error.
    pub fn populate(&mut self) -> Result<(), LoadError> {
        let mut filled = 0usize;

        while filled < self.len {
            let result = unsafe {
                read::read(
                    self.file.as_fd(),
                    self.base.as_ptr().add(filled).cast(),
                    self.len - filled,
                )
            };
            match result {
                Ok(0) => {
                    warn!(read = filled, expected = self.len, "module truncated while reading");
                    return Err(LoadError::ShortRead {
                        read: filled,
                        expected: self.len,
                    });
                }
                Ok(count) => {
                    trace!(count, "read module chunk");
                    filled += count;
                }
                Err(Errno::INTR) => continue,
                Err(errno) => return Err(LoadError::Read(errno.into())),
            }
        }

        unsafe { arch::sync_instruction_cache(self.base.as_ptr(), self.len) };
        Ok(())
    }

    /// Acquires and populates `path` in one step.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::load_with(&HostFilesystem, path)
    }

    pub fn load_with<O: FileOpener + ?Sized>(opener: &O, path: &Path) -> Result<Self, LoadError> {
        let mut module = Self::acquire_with(opener, path)?;
        module.populate()?;
        Ok(module)
    }

    pub fn base(&self) -> *const u8 {
        self.base.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }

    /// Keeps the mapping and its descriptor alive until the process exits.
    pub(crate) fn leak(self) {
        core::mem::forget(self);
    }
}

impl Drop for MappedModule {
    fn drop(&mut self) {
        let rc = unsafe { munmap(self.base.as_ptr(), self.len) };
        if let Err(errno) = Errno::from_syscall_result(rc) {
            warn!(%errno, base = ?self.base, "failed to unmap module");
        }
    }
}

impl core::fmt::Debug for MappedModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MappedModule")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}
