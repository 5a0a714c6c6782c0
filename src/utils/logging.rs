use env_logger::{Builder, Env, DEFAULT_FILTER_ENV};
use log::LevelFilter;
use std::env;

/// Initialise the global logger. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbosity: u8) {
    let rust_log_set = env::var_os(DEFAULT_FILTER_ENV).is_some();

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter(verbosity)));
    builder.format_timestamp_secs().format_module_path(true);
    if let Some(level) = crate_override(verbosity, rust_log_set) {
        builder.filter_module("ekyc", level);
    }
    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = builder.try_init();
}

fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Extra level for this crate's own modules; never applied over `RUST_LOG`.
fn crate_override(verbosity: u8, rust_log_set: bool) -> Option<LevelFilter> {
    if verbosity > 1 && !rust_log_set {
        Some(LevelFilter::Trace)
    } else {
        None
    }
}
