use std::{ffi::OsString, io, process};

use modload::{cli, HostFilesystem, LoaderConfig, ModuleLoader};
use smallvec::SmallVec;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = LoaderConfig::from_env();
    init_tracing(&config.log_filter);

    let args: SmallVec<[OsString; 2]> = std::env::args_os().collect();
    let loader = ModuleLoader::with_config(&config);

    let code = unsafe {
        cli::run(
            &args,
            &HostFilesystem,
            &loader,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )
    };
    process::exit(code);
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(modload::config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
