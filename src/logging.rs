use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "puck_metrics=info";

/// Console logging to stderr so stdout stays machine-readable. `RUST_LOG` overrides the default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
