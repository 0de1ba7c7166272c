use fcn_quote_core::EngineConfig;
use tracing::debug;

use crate::input;

/// Engine configuration from `path`, or the defaults when no file is given.
pub fn load(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config: EngineConfig = match path {
        Some(p) => input::file::read_structured(p)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    debug!(?config, "engine configuration loaded");
    Ok(config)
}
