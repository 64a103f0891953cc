//! The `modload <file>` command: argument check, stdout contract, exit codes.

use crate::{module::FileOpener, runtime_loader::ModuleLoader};
use std::{
    ffi::OsString,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

const DEFAULT_PROGRAM_NAME: &str = "modload";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("Usage: {program} <file>")]
    WrongArgumentCount { program: String },
}

/// Extracts the module path from `args` (`argv[0]` included).
pub fn module_path(args: &[OsString]) -> Result<PathBuf, UsageError> {
    match args {
        [_, path] => Ok(PathBuf::from(path)),
        _ => Err(UsageError::WrongArgumentCount {
            program: args
                .first()
                .map(|program| program.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_owned()),
        }),
    }
}

/// Runs the command and returns the process exit code.
///
/// Usage and progress lines go to `out`, failures to `err`. The exit code is
/// [`EXIT_SUCCESS`] whenever the entry point was called, whatever it
/// returned.
///
/// # Safety
///
/// Executes the module's code inside this process.
pub unsafe fn run<O, W, E>(
    args: &[OsString],
    opener: &O,
    loader: &ModuleLoader,
    out: &mut W,
    err: &mut E,
) -> i32
where
    O: FileOpener + ?Sized,
    W: Write,
    E: Write,
{
    let path = match module_path(args) {
        Ok(path) => path,
        Err(usage) => {
            let _ = writeln!(out, "{usage}");
            let _ = out.flush();
            return EXIT_FAILURE;
        }
    };

    run_path(&path, opener, loader, out, err)
}

unsafe fn run_path<O, W, E>(
    path: &Path,
    opener: &O,
    loader: &ModuleLoader,
    out: &mut W,
    err: &mut E,
) -> i32
where
    O: FileOpener + ?Sized,
    W: Write,
    E: Write,
{
    let result = loader.load_with(opener, path).and_then(|module| {
        loader.execute_with(module, |offset| {
            let _ = writeln!(out, "jumping to {offset:#x}");
            let _ = out.flush();
        })
    });

    match result {
        Ok(status) => {
            let _ = writeln!(out, "{status}");
            let _ = out.flush();
            EXIT_SUCCESS
        }
        Err(error) => {
            debug!(operation = error.operation(), "load failed");
            let _ = writeln!(err, "{error}");
            let _ = err.flush();
            EXIT_FAILURE
        }
    }
}
