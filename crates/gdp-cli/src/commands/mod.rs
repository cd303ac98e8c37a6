pub mod analyze;
pub mod config;
pub mod scope;

use gdp_core::config::builtin::default_config;
use gdp_core::config::{load_config, AnalyzerConfig};
use gdp_core::error::GdpError;
use std::path::Path;

/// Custom config when a path is given, otherwise the builtin default.
pub fn resolve_config(path: Option<&Path>) -> Result<AnalyzerConfig, GdpError> {
    match path {
        Some(p) => load_config(p),
        None => default_config(),
    }
}
