use once_cell::sync::Lazy;

/// Enables debug-level logging when set to any value
pub const DEBUG_ENV: &str = "RATECARD_DEBUG";

/// Global debug mode flag, initialized once at startup
pub static DEBUG_MODE: Lazy<bool> = Lazy::new(|| std::env::var(DEBUG_ENV).is_ok());

/// Default log filter: `debug` in debug mode, `warn` otherwise
pub fn default_filter(debug_mode: bool) -> &'static str {
    if debug_mode {
        "debug"
    } else {
        "warn"
    }
}

/// Install the env_logger backend. `RUST_LOG` takes precedence over the
/// debug flag. Calling this more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or(default_filter(*DEBUG_MODE));
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
