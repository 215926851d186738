use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_FILTER: &str = "info,filestorage=debug,filestorage_core=debug,tower_http=info";

/// Installs the global `fmt` subscriber. `RUST_LOG` overrides the default filter.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt().with_env_filter(filter).with_target(true).init();
}
