use gdp_core::config::builtin::DEFAULT_CONFIG_JSON;
use gdp_core::config::load_config;
use gdp_core::error::GdpError;
use std::path::Path;

pub fn show() -> Result<(), GdpError> {
    println!("{}", DEFAULT_CONFIG_JSON.trim_end());
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), GdpError> {
    let config = load_config(path)?;
    println!("Config is valid: {}", path.display());
    println!(
        "  {} identifier, {} departure-center, {} delay keyword(s)",
        config.columns.identifier.len(),
        config.columns.departure_center.len(),
        config.columns.delay.len()
    );
    println!(
        "  table strategy: {:?}, OCR: {}",
        config.table.strategy,
        if config.ocr.enabled { "on" } else { "off" }
    );
    if !config.scope.denylist.is_empty() {
        println!("  denylist: {}", config.scope.denylist.join(", "));
    }
    Ok(())
}
