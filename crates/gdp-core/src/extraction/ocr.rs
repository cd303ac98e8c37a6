use crate::config::schema::OcrSettings;
use crate::error::GdpError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Turns one page of a PDF on disk into plain text.
pub trait PageRecognizer: Send + Sync {
    fn recognize(&self, pdf_path: &Path, page_number: usize) -> Result<String, GdpError>;

    fn name(&self) -> &str;
}

/// OCR backend: rasterise with `pdftoppm`, recognise with `tesseract`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn new(settings: &OcrSettings) -> Self {
        TesseractOcr {
            language: settings.language.clone(),
            dpi: settings.dpi,
        }
    }

    /// Check that both `pdftoppm` and `tesseract` can be spawned.
    pub fn is_available() -> bool {
        command_available("pdftoppm", "-v") && command_available("tesseract", "--version")
    }
}

impl PageRecognizer for TesseractOcr {
    fn recognize(&self, pdf_path: &Path, page_number: usize) -> Result<String, GdpError> {
        // The directory and the rendered image are removed when `dir` drops.
        let dir = tempfile::tempdir().map_err(|e| GdpError::Ocr(e.to_string()))?;
        let prefix = dir.path().join(format!("p{page_number}"));
        let image = prefix.with_extension("png");

        let page = page_number.to_string();
        let render = Command::new("pdftoppm")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| GdpError::Ocr(format!("pdftoppm could not start: {e}")))?;

        if !render.status.success() {
            return Err(GdpError::Ocr(format!(
                "pdftoppm exited with {} on page {}: {}",
                render.status.code().unwrap_or(-1),
                page_number,
                String::from_utf8_lossy(&render.stderr).trim()
            )));
        }
        if !image.exists() {
            return Err(GdpError::Ocr(format!(
                "pdftoppm produced no image for page {page_number}"
            )));
        }

        debug!(page = page_number, dpi = self.dpi, "running tesseract");
        // --psm 6: a single uniform block, which keeps table rows on one line.
        let out = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("6")
            .output()
            .map_err(|e| GdpError::Ocr(format!("tesseract could not start: {e}")))?;

        if !out.status.success() {
            return Err(GdpError::Ocr(format!(
                "tesseract exited with {} on page {}",
                out.status.code().unwrap_or(-1),
                page_number
            )));
        }

        let text = String::from_utf8_lossy(&out.stdout).to_string();
        if text.trim().is_empty() {
            return Err(GdpError::Ocr(format!(
                "tesseract found no text on page {page_number}"
            )));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

fn command_available(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .output()
        .map(|o| o.status.success() || !o.stderr.is_empty())
        .unwrap_or(false)
}
