use gdp_core::error::GdpError;
use gdp_core::extraction::pdftotext::PdftotextExtractor;
use gdp_core::extraction::NoProgress;
use std::path::Path;

use crate::output;

pub fn run(
    advisory_file: &Path,
    output_format: &str,
    config_file: Option<&Path>,
) -> Result<(), GdpError> {
    let config = super::resolve_config(config_file)?;
    if !PdftotextExtractor::is_available() {
        return Err(GdpError::PdftotextNotFound);
    }

    let advisory = std::fs::read(advisory_file)?;
    let extractor = PdftotextExtractor::from_settings(&config.ocr);
    let scope = gdp_core::analyze_scope(&advisory, &extractor, &config, &NoProgress)?;

    match output_format {
        "json" => output::json::print(&scope)?,
        _ => output::table::print_scope(&scope),
    }
    Ok(())
}
