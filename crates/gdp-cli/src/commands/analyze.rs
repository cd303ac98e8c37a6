use gdp_core::error::GdpError;
use gdp_core::extraction::pdftotext::PdftotextExtractor;
use gdp_core::extraction::{PageProgress, TextSource};
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    advisory_file: &Path,
    arrivals_file: &Path,
    output_format: &str,
    out_file: Option<PathBuf>,
    config_file: Option<&Path>,
    no_ocr: bool,
) -> Result<(), GdpError> {
    let mut config = super::resolve_config(config_file)?;
    if no_ocr {
        config.ocr.enabled = false;
    }

    if !PdftotextExtractor::is_available() {
        return Err(GdpError::PdftotextNotFound);
    }

    let advisory = std::fs::read(advisory_file)?;
    let arrivals = std::fs::read(arrivals_file)?;
    let extractor = PdftotextExtractor::from_settings(&config.ocr);

    // Only scanned pages are slow enough to be worth a progress line.
    let progress = |p: PageProgress| {
        if p.source == TextSource::Ocr {
            eprintln!("  OCR page {}/{}", p.page_number, p.page_count);
        }
    };

    let result = gdp_core::analyze(&advisory, &arrivals, &extractor, &config, &progress)?;

    match output_format {
        "json" => output::json::print(&result)?,
        _ => output::table::print(&result),
    }

    if let Some(path) = out_file {
        std::fs::write(&path, &result.annotated_pdf)?;
        eprintln!(
            "Highlighted {} flight(s), written to {}",
            result.impacted_count(),
            path.display()
        );
    }

    Ok(())
}
