use std::{fmt::Display, io};

/// Largest value the kernel reports as `-errno` from a raw syscall.
const MAX_ERRNO: isize = 4095;

#[repr(transparent)]
#[doc(alias = "errno")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Errno(pub(crate) u32);

impl Errno {
    pub const INTR: Self = Self(4);
    pub const INVAL: Self = Self(22);

    /// Splits a raw syscall return value into its result or the `-errno` the
    /// kernel encoded in it.
    pub fn from_syscall_result(rc: isize) -> Result<usize, Errno> {
        if (-MAX_ERRNO..0).contains(&rc) {
            Err(Errno(rc.unsigned_abs() as u32))
        } else {
            Ok(rc as usize)
        }
    }

    pub fn raw(self) -> i32 {
        self.0 as i32
    }
}

impl From<Errno> for io::Error {
    fn from(errno: Errno) -> Self {
        io::Error::from_raw_os_error(errno.raw())
    }
}

impl Display for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", io::Error::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::Errno;
    use std::io;

    #[test]
    fn decodes_negative_errno() {
        assert_eq!(Errno::from_syscall_result(-22), Err(Errno::INVAL));
        assert_eq!(Errno::from_syscall_result(-4), Err(Errno::INTR));
    }

    #[test]
    fn passes_results_through() {
        assert_eq!(Errno::from_syscall_result(0), Ok(0));
        assert_eq!(Errno::from_syscall_result(4096), Ok(4096));
        // Values below -4095 are addresses or counts, never errors.
        assert_eq!(
            Errno::from_syscall_result(-4096),
            Ok((-4096isize) as usize)
        );
    }

    #[test]
    fn converts_into_io_error() {
        let error: io::Error = Errno::INTR.into();
        assert_eq!(error.raw_os_error(), Some(4));
        assert_eq!(Errno::INVAL.to_string(), error_text(22));
    }

    fn error_text(code: i32) -> String {
        io::Error::from_raw_os_error(code).to_string()
    }
}
