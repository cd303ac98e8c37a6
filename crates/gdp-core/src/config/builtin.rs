use crate::config::schema::AnalyzerConfig;
use crate::error::GdpError;

pub const DEFAULT_CONFIG_JSON: &str = include_str!("../../../../config/default.json");

/// Load the builtin configuration shipped with the crate.
pub fn default_config() -> Result<AnalyzerConfig, GdpError> {
    crate::config::parse_config_str(DEFAULT_CONFIG_JSON)
}
