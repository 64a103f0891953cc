use crate::symbol::strip_version_suffix;
use rustc_hash::FxHashSet;
use smartstring::alias::String as SmartString;

/// Tracing filter directive for the command line tool.
pub const LOG_ENV: &str = "MODLOAD_LOG";
/// Comma-separated symbol names loaded code may resolve.
pub const ALLOW_SYMBOLS_ENV: &str = "MODLOAD_ALLOW_SYMBOLS";

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// When set, loaded code can only resolve these names.
    pub allowed_symbols: Option<FxHashSet<SmartString>>,
    pub log_filter: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allowed_symbols: None,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).filter(|value| !value.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(symbols) = lookup(ALLOW_SYMBOLS_ENV) {
            config.allowed_symbols = Some(parse_symbol_list(&symbols));
        }
        config
    }
}

/// Splits a comma-separated list, dropping blanks and version suffixes.
///
/// An empty list is a valid configuration: nothing resolves.
pub fn parse_symbol_list(value: &str) -> FxHashSet<SmartString> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| SmartString::from(strip_version_suffix(name)))
        .collect()
}
