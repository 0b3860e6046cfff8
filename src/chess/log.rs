use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directive, e.g. `warn` or
/// `chess_study=debug`.
pub const LOG_ENV: &str = "CHESS_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

static INIT: Once = Once::new();

fn filter_from(raw: Option<&str>) -> EnvFilter {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the stderr subscriber. Library code only emits `tracing` events;
/// binaries call this once at startup. Repeated calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV).ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter_from(raw.as_deref()))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
