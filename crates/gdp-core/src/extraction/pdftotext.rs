use crate::config::schema::OcrSettings;
use crate::error::GdpError;
use crate::extraction::ocr::{PageRecognizer, TesseractOcr};
use crate::extraction::{
    BBox, PageContent, PageProgress, PdfExtractor, ProgressSink, TextSource, WordBox,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` to preserve whitespace alignment of tables
/// and `pdftotext -bbox-layout` for word positions. Pages without a usable
/// text layer are handed to an OCR recognizer when one is configured.
pub struct PdftotextExtractor {
    recognizer: Option<Box<dyn PageRecognizer>>,
    min_text_chars: usize,
}

impl PdftotextExtractor {
    /// Build from OCR settings, enabling tesseract when requested and installed.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        let recognizer: Option<Box<dyn PageRecognizer>> =
            if settings.enabled && TesseractOcr::is_available() {
                Some(Box::new(TesseractOcr::new(settings)))
            } else {
                if settings.enabled {
                    warn!("OCR requested but pdftoppm/tesseract are unavailable");
                }
                None
            };
        PdftotextExtractor {
            recognizer,
            min_text_chars: settings.min_text_chars,
        }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(
        &self,
        pdf_bytes: &[u8],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<PageContent>, GdpError> {
        // Write PDF bytes to a temp file; removed when `tmpfile` drops.
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| GdpError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| GdpError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let text = run_pdftotext(&tmp_path, "-layout")?;
        let xml = run_pdftotext(&tmp_path, "-bbox-layout")?;
        let bbox_pages = parse_bbox_xml(&xml)?;

        let mut pages = build_pages(&text, bbox_pages);
        let page_count = pages.len();
        info!(pages = page_count, "extracted text layer");

        for page in &mut pages {
            if page.non_whitespace_chars() < self.min_text_chars {
                recover_scanned_page(
                    page,
                    &tmp_path,
                    self.recognizer.as_deref(),
                );
            }
            progress.page_done(PageProgress {
                page_number: page.page_number,
                page_count,
                source: page.source.clone(),
            });
        }

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn run_pdftotext(pdf_path: &Path, mode: &str) -> Result<String, GdpError> {
    let output = Command::new("pdftotext")
        .arg(mode)
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GdpError::PdftotextNotFound
            } else {
                GdpError::Extraction(format!("pdftotext {} failed: {}", mode, e))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(GdpError::PdftotextFailed { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Replace the text of a page that has (almost) no text layer.
///
/// OCR failures stay local to the page: it is marked unavailable with the
/// reason and the run carries on.
fn recover_scanned_page(
    page: &mut PageContent,
    pdf_path: &Path,
    recognizer: Option<&dyn PageRecognizer>,
) {
    let Some(recognizer) = recognizer else {
        if page.non_whitespace_chars() == 0 {
            page.source = TextSource::Unavailable("no text layer and OCR is disabled".into());
        }
        return;
    };

    debug!(page = page.page_number, backend = recognizer.name(), "page looks scanned, running OCR");
    match recognizer.recognize(pdf_path, page.page_number) {
        Ok(text) => {
            page.lines = text.lines().map(|l| l.to_string()).collect();
            page.words.clear();
            page.source = TextSource::Ocr;
        }
        Err(e) => {
            warn!(page = page.page_number, error = %e, "OCR failed, page skipped");
            page.source = TextSource::Unavailable(e.to_string());
        }
    }
}

/// Word boxes and size of one page from `-bbox-layout` output.
#[derive(Debug, Clone, Default)]
struct BBoxPage {
    width: Option<f32>,
    height: Option<f32>,
    words: Vec<WordBox>,
}

/// Pair the layout text pages with their bbox pages.
///
/// The bbox document is authoritative for the page count: pdftotext ends
/// every page, including the last, with a form feed.
fn build_pages(text: &str, bbox_pages: Vec<BBoxPage>) -> Vec<PageContent> {
    let mut text_pages: Vec<&str> = text.split('\x0c').collect();
    if text_pages.last().is_some_and(|p| p.trim().is_empty()) && text_pages.len() > 1 {
        text_pages.pop();
    }
    let page_count = bbox_pages.len().max(text_pages.len());
    let mut bbox_iter = bbox_pages.into_iter();

    (0..page_count)
        .map(|i| {
            let bbox = bbox_iter.next().unwrap_or_default();
            let lines = text_pages
                .get(i)
                .map(|t| t.lines().map(|l| l.to_string()).collect())
                .unwrap_or_default();
            PageContent {
                page_number: i + 1,
                lines,
                words: bbox.words,
                size: bbox.width.zip(bbox.height),
                source: TextSource::TextLayer,
            }
        })
        .collect()
}

fn parse_bbox_xml(xml: &str) -> Result<Vec<BBoxPage>, GdpError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<BBoxPage> = Vec::new();
    let mut current_word: Option<(BBox, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| GdpError::Extraction(format!("bad -bbox-layout output: {e}")))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"page" => {
                pages.push(BBoxPage {
                    width: attr_f32(&e, b"width"),
                    height: attr_f32(&e, b"height"),
                    words: Vec::new(),
                });
            }
            Event::Start(e) if e.name().as_ref() == b"word" => {
                current_word = parse_bbox(&e).map(|b| (b, String::new()));
            }
            Event::Text(t) => {
                if let Some((_, text)) = current_word.as_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| GdpError::Extraction(format!("bad word text: {e}")))?;
                    text.push_str(&unescaped);
                }
            }
            Event::End(e) if e.name().as_ref() == b"word" => {
                if let (Some((bbox, text)), Some(page)) = (current_word.take(), pages.last_mut()) {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        page.words.push(WordBox { text, bbox });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn attr_f32(tag: &BytesStart<'_>, name: &[u8]) -> Option<f32> {
    tag.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok()?.parse().ok())
}

fn parse_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    Some(BBox {
        x_min: attr_f32(tag, b"xMin")?,
        y_min: attr_f32(tag, b"yMin")?,
        x_max: attr_f32(tag, b"xMax")?,
        y_max: attr_f32(tag, b"yMax")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BBOX_XML: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="ATCSCC"/>
</head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <flow>
      <block xMin="36.0" yMin="70.0" xMax="300.0" yMax="82.0">
        <line xMin="36.0" yMin="70.0" xMax="300.0" yMax="82.0">
          <word xMin="36.0" yMin="70.0" xMax="72.5" yMax="82.0">ACA123</word>
          <word xMin="120.0" yMin="70.0" xMax="150.0" yMax="82.0">KZNY</word>
          <word xMin="200.0" yMin="70.0" xMax="230.0" yMax="82.0">A&amp;B</word>
        </line>
      </block>
    </flow>
  </page>
  <page width="612.000000" height="792.000000">
  </page>
</doc>
</body>
</html>"#;

    struct FakeOcr(Result<&'static str, &'static str>);

    impl PageRecognizer for FakeOcr {
        fn recognize(&self, _pdf_path: &Path, _page_number: usize) -> Result<String, GdpError> {
            self.0
                .map(|s| s.to_string())
                .map_err(|e| GdpError::Ocr(e.to_string()))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn blank_page() -> PageContent {
        PageContent {
            page_number: 2,
            lines: vec!["".into()],
            words: vec![],
            size: None,
            source: TextSource::TextLayer,
        }
    }

    #[test]
    fn test_parse_bbox_xml_words() {
        let pages = parse_bbox_xml(BBOX_XML).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].height, Some(792.0));
        assert_eq!(pages[0].words.len(), 3);
        assert_eq!(pages[0].words[0].text, "ACA123");
        assert_eq!(pages[0].words[0].bbox.x_max, 72.5);
        assert_eq!(pages[0].words[2].text, "A&B");
        assert!(pages[1].words.is_empty());
    }

    #[test]
    fn test_build_pages_keeps_blank_scanned_page() {
        let text = "ACA123   KZNY\n\x0c\x0c";
        let bbox = parse_bbox_xml(BBOX_XML).unwrap();
        let pages = build_pages(text, bbox);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].size, Some((612.0, 792.0)));
        assert_eq!(pages[1].non_whitespace_chars(), 0);
    }

    #[test]
    fn test_scanned_page_without_ocr_is_unavailable() {
        let mut page = blank_page();
        recover_scanned_page(&mut page, Path::new("x.pdf"), None);
        assert!(matches!(page.source, TextSource::Unavailable(_)));
    }

    #[test]
    fn test_scanned_page_uses_ocr_text() {
        let mut page = blank_page();
        let ocr = FakeOcr(Ok("ACA123 KZNY 1500 45\nDAL77 KBOS 1510 5"));
        recover_scanned_page(&mut page, Path::new("x.pdf"), Some(&ocr));
        assert_eq!(page.source, TextSource::Ocr);
        assert_eq!(page.lines.len(), 2);
    }

    #[test]
    fn test_ocr_failure_marks_page_unavailable() {
        let mut page = blank_page();
        let ocr = FakeOcr(Err("tesseract exited with 1"));
        recover_scanned_page(&mut page, Path::new("x.pdf"), Some(&ocr));
        match page.source {
            TextSource::Unavailable(reason) => assert!(reason.contains("tesseract")),
            other => panic!("unexpected source {other:?}"),
        }
    }
}
