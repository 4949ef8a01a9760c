//! Tracing subscriber setup for the binary

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,qdmsync=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter. `QDM_LOG_FORMAT=json` switches
/// to one JSON object per line. Logs go to stderr so progress output on
/// stdout stays readable.
pub fn init() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("QDM_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|e| anyhow!("failed to initialise logging: {e}"))
}
