use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "contextgrab=warn";

/// Installs a stderr logger filtered by `RUST_LOG`. Safe to call twice.
pub fn initialize_logger() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
