pub mod builtin;
pub mod schema;

use crate::error::GdpError;
pub use schema::AnalyzerConfig;
use std::path::Path;

/// Load a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<AnalyzerConfig, GdpError> {
    let content = std::fs::read_to_string(path).map_err(|e| GdpError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string read from `source`.
pub fn parse_config(json: &str, source: &Path) -> Result<AnalyzerConfig, GdpError> {
    let config: AnalyzerConfig = serde_json::from_str(json).map_err(|e| GdpError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Parse a configuration from a JSON string (no file path context).
pub fn parse_config_str(json: &str) -> Result<AnalyzerConfig, GdpError> {
    let config: AnalyzerConfig = serde_json::from_str(json).map_err(GdpError::Json)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is usable.
pub fn validate_config(config: &AnalyzerConfig) -> Result<(), GdpError> {
    if config.columns.identifier.iter().all(|k| k.trim().is_empty()) {
        return Err(GdpError::ConfigInvalid(
            "columns.identifier must list at least one keyword".into(),
        ));
    }

    if config
        .columns
        .departure_center
        .iter()
        .all(|k| k.trim().is_empty())
    {
        return Err(GdpError::ConfigInvalid(
            "columns.departure_center must list at least one keyword".into(),
        ));
    }

    for (i, c) in config.annotation.color.iter().enumerate() {
        if !(0.0..=1.0).contains(c) {
            return Err(GdpError::ConfigInvalid(format!(
                "annotation.color[{}] = {} is outside 0..=1",
                i, c
            )));
        }
    }

    if !(0.0..=1.0).contains(&config.annotation.opacity) {
        return Err(GdpError::ConfigInvalid(format!(
            "annotation.opacity = {} is outside 0..=1",
            config.annotation.opacity
        )));
    }

    if config.fallback.min_tokens == 0 {
        return Err(GdpError::ConfigInvalid(
            "fallback.min_tokens must be at least 1".into(),
        ));
    }

    if config.ocr.dpi == 0 {
        return Err(GdpError::ConfigInvalid("ocr.dpi must be positive".into()));
    }

    if config.ocr.language.trim().is_empty() {
        return Err(GdpError::ConfigInvalid(
            "ocr.language must not be empty".into(),
        ));
    }

    Ok(())
}
