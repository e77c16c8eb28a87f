use anyhow::Context;
use std::path::Path;
use wingo_core::HarnessConfig;

/// Defaults, config file and `WINGO_*` environment, in that order.
/// Command-line flags are applied on top by the caller.
pub fn load(path: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    let config = HarnessConfig::load(path);

    match path {
        Some(path) => config.with_context(|| format!("loading {}", path.display())),
        None => Ok(config?),
    }
}
