use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber. An explicit `level` wins over `RUST_LOG`;
/// with neither, only warnings are shown.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace('-', "_")
        ))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))
}
