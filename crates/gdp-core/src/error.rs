use std::fmt;
use std::path::PathBuf;

/// Which of the two input documents a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Advisory,
    Arrivals,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Advisory => write!(f, "advisory"),
            DocumentKind::Arrivals => write!(f, "arrivals"),
        }
    }
}

/// Pipeline stage a run failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Annotate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract => write!(f, "text extraction"),
            Stage::Annotate => write!(f, "annotation"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GdpError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("annotation failed: {0}")]
    Annotation(String),

    #[error("PDF object error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("{document} document, {stage}: {source}")]
    Stage {
        document: DocumentKind,
        stage: Stage,
        #[source]
        source: Box<GdpError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GdpError {
    /// Wrap an error with the document and stage it was raised in.
    ///
    /// Input errors pass through unchanged so callers can still tell
    /// invalid input apart from run failures.
    pub fn in_stage(self, document: DocumentKind, stage: Stage) -> GdpError {
        match self {
            GdpError::Input(_) | GdpError::Stage { .. } => self,
            other => GdpError::Stage {
                document,
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, GdpError::Input(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wraps_with_context() {
        let err = GdpError::PdftotextNotFound.in_stage(DocumentKind::Arrivals, Stage::Extract);
        let msg = err.to_string();
        assert!(msg.starts_with("arrivals document, text extraction:"));
        assert!(msg.contains("pdftotext not found"));
    }

    #[test]
    fn input_errors_are_not_wrapped() {
        let err = GdpError::Input("empty".into()).in_stage(DocumentKind::Advisory, Stage::Extract);
        assert!(err.is_input_error());
    }
}
