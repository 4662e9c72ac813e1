//! CLI command implementations

pub mod analyze;
pub mod usage;

use anyhow::{Context, Result};
use schemalens_config::{ConfigLoader, LensConfig};
use schemalens_provider::Dialect;
use schemalens_session::{ConnectInfo, SessionRegistry};

use crate::GlobalOptions;

/// Load configuration for the current directory with CLI overrides applied.
pub fn load_config(global: &GlobalOptions) -> Result<LensConfig> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let overrides = global.to_config_overrides();

    ConfigLoader::new()
        .load(&working_dir, Some(&overrides))
        .context("Failed to load configuration")
}

/// Resolve the dialect from config and open a session against the target.
pub async fn connect(
    registry: &SessionRegistry,
    target: &str,
    config: &LensConfig,
) -> Result<ConnectInfo> {
    let dialect: Dialect = config
        .connection
        .dialect
        .parse()
        .with_context(|| format!("Unknown dialect '{}'", config.connection.dialect))?;

    registry
        .connect(target, dialect)
        .await
        .with_context(|| format!("Failed to connect to '{target}'"))
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
