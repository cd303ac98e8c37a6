pub mod ocr;
pub mod pdftotext;
pub mod table;

use crate::error::GdpError;
use serde::Serialize;

/// Axis-aligned box in PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// One word of the page's visual text with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct WordBox {
    pub text: String,
    pub bbox: BBox,
}

/// How a page's text was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "reason")]
pub enum TextSource {
    /// Native text layer.
    TextLayer,
    /// Rasterised and recognised.
    Ocr,
    /// Neither worked; the page carries no text.
    Unavailable(String),
}

/// Content extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    /// Layout-preserving text lines.
    pub lines: Vec<String>,
    /// Word boxes for visual search. Empty for OCR pages.
    pub words: Vec<WordBox>,
    /// Page size in points (width, height), when known.
    pub size: Option<(f32, f32)>,
    pub source: TextSource,
}

impl PageContent {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn non_whitespace_chars(&self) -> usize {
        self.lines
            .iter()
            .flat_map(|l| l.chars())
            .filter(|c| !c.is_whitespace())
            .count()
    }
}

/// Per-page progress event, emitted once per extracted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProgress {
    pub page_number: usize,
    pub page_count: usize,
    pub source: TextSource,
}

/// Receiver for extraction progress.
pub trait ProgressSink {
    fn page_done(&self, progress: PageProgress);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn page_done(&self, _progress: PageProgress) {}
}

impl<F> ProgressSink for F
where
    F: Fn(PageProgress),
{
    fn page_done(&self, progress: PageProgress) {
        self(progress)
    }
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(
        &self,
        pdf_bytes: &[u8],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<PageContent>, GdpError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Reject buffers that cannot be a PDF before any backend sees them.
///
/// Like most readers, tolerates leading garbage before the `%PDF-` marker
/// within the first kilobyte.
pub fn ensure_pdf(bytes: &[u8], what: &str) -> Result<(), GdpError> {
    if bytes.is_empty() {
        return Err(GdpError::Input(format!("{what} document is empty")));
    }
    let head = &bytes[..bytes.len().min(1024)];
    if !head.windows(5).any(|w| w == b"%PDF-") {
        return Err(GdpError::Input(format!(
            "{what} document is not a PDF (missing %PDF- header)"
        )));
    }
    Ok(())
}
