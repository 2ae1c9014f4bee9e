use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the global tracing subscriber
///
/// If RUST_LOG is not set, a default filter is used: `debug` for the pipeline crates
/// in debug builds, `info` otherwise.
pub fn setup_logging() {
    let default_directive = if cfg!(debug_assertions) {
        "info,track_flow_lib=debug,track_flow=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();

    if std::env::var("RUST_LOG").is_err() {
        tracing::info!("RUST_LOG not set, using default filter: {}", default_directive);
    }
}
