use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing subscriber with compact output on stdout.
/// - Respects `RUST_LOG` if set
/// - Falls back to `default_filter` (callers pass `debug` when debug mode is on)
pub fn init_logging_default(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_filter},tower_http=info,axum=info")));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, otherwise uses `default_filter`
/// - Writes to stdout for consistent container logging behavior
pub fn init_logging_json(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the initializer by format name; anything other than `json` is compact.
pub fn init_logging(format: &str, debug: bool) {
    let level = if debug { "debug" } else { "info" };
    if format.eq_ignore_ascii_case("json") {
        init_logging_json(level);
    } else {
        init_logging_default(level);
    }
}
