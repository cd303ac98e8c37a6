use crate::config::schema::AnnotationSettings;
use crate::error::GdpError;
use crate::extraction::{BBox, PageContent, WordBox};
use crate::model::{Diagnostic, DiagnosticKind, ImpactedRow};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A box to highlight on a page, in extractor coordinates (top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightMark {
    pub page_number: usize,
    pub bbox: BBox,
    /// Page size reported by the extractor, used when the PDF page has no MediaBox.
    pub page_size: Option<(f32, f32)>,
}

/// Every place `needle` appears among the page's words.
///
/// Comparison ignores case and surrounding punctuation. A multi-word
/// needle must match consecutive words; the union of their boxes is
/// returned.
pub fn find_text_boxes(words: &[WordBox], needle: &str) -> Vec<BBox> {
    let parts: Vec<String> = needle.split_whitespace().map(normalize_word).collect();
    if parts.is_empty() || parts.iter().any(String::is_empty) {
        return Vec::new();
    }
    let normalized: Vec<String> = words.iter().map(|w| normalize_word(&w.text)).collect();

    normalized
        .windows(parts.len())
        .enumerate()
        .filter(|(_, window)| *window == parts.as_slice())
        .filter_map(|(i, _)| {
            words[i..i + parts.len()]
                .iter()
                .map(|w| w.bbox)
                .reduce(|a, b| a.union(&b))
        })
        .collect()
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_uppercase()
}

/// Locate every impacted flight on its page.
///
/// Flights with no visual match are reported as annotation misses and
/// otherwise ignored.
pub fn plan_highlights(
    pages: &[PageContent],
    rows: &[ImpactedRow],
) -> (Vec<HighlightMark>, Vec<Diagnostic>) {
    let mut marks = Vec::new();
    let mut misses = Vec::new();

    for row in rows {
        let page = pages.iter().find(|p| p.page_number == row.page_number);
        let boxes = page
            .map(|p| find_text_boxes(&p.words, &row.flight_id))
            .unwrap_or_default();

        if boxes.is_empty() {
            debug!(flight = %row.flight_id, page = row.page_number, "flight not found visually");
            misses.push(Diagnostic::new(
                DiagnosticKind::AnnotationMiss,
                Some(row.page_number),
                format!(
                    "{} not found on page {}, not highlighted",
                    row.flight_id, row.page_number
                ),
            ));
            continue;
        }

        let page_size = page.and_then(|p| p.size);
        marks.extend(boxes.into_iter().map(|bbox| HighlightMark {
            page_number: row.page_number,
            bbox,
            page_size,
        }));
    }

    (marks, misses)
}

/// Write highlight annotations into a copy of the document.
///
/// With no marks the input bytes are returned untouched. Nothing but the
/// pages' annotation arrays and the new annotation objects is changed.
pub fn apply_highlights(
    pdf_bytes: &[u8],
    marks: &[HighlightMark],
    settings: &AnnotationSettings,
) -> Result<Vec<u8>, GdpError> {
    if marks.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut doc = Document::load_mem(pdf_bytes)?;
    let pages = doc.get_pages();

    let mut by_page: BTreeMap<usize, Vec<&HighlightMark>> = BTreeMap::new();
    for mark in marks {
        by_page.entry(mark.page_number).or_default().push(mark);
    }

    for (page_number, page_marks) in by_page {
        let page_id = u32::try_from(page_number)
            .ok()
            .and_then(|n| pages.get(&n).copied())
            .ok_or_else(|| {
                GdpError::Annotation(format!("page {page_number} does not exist in the document"))
            })?;

        let geometry = match page_geometry(&doc, page_id) {
            Some(geometry) => geometry,
            None => {
                let size = page_marks.iter().find_map(|m| m.page_size).ok_or_else(|| {
                    GdpError::Annotation(format!("page {page_number} has no MediaBox"))
                })?;
                PageGeometry::from_size(size, page_rotation(&doc, page_id))
            }
        };

        let annot_ids: Vec<ObjectId> = page_marks
            .iter()
            .map(|m| add_highlight(&mut doc, page_id, &geometry.to_pdf_rect(&m.bbox), settings))
            .collect();
        append_annots(&mut doc, page_id, &annot_ids)?;
        debug!(page = page_number, count = annot_ids.len(), "highlights added");
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    info!(marks = marks.len(), "annotated arrivals document");
    Ok(out)
}

/// Visible area of a page and how it is turned for display.
///
/// pdftotext reports boxes relative to the top-left corner of the
/// displayed page: the CropBox (MediaBox when absent) after /Rotate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageGeometry {
    visible: [f32; 4],
    /// Clockwise quarter turns in degrees: 0, 90, 180 or 270.
    rotate: i64,
}

impl PageGeometry {
    /// Box built from the extractor's displayed page size.
    fn from_size((width, height): (f32, f32), rotate: i64) -> Self {
        let (w, h) = if rotate % 180 == 0 { (width, height) } else { (height, width) };
        PageGeometry {
            visible: [0.0, 0.0, w, h],
            rotate,
        }
    }

    /// Map a displayed point (top-left origin) into user space.
    fn to_user_space(&self, x: f32, y: f32) -> (f32, f32) {
        let [llx, lly, urx, ury] = self.visible;
        match self.rotate {
            90 => (llx + y, lly + x),
            180 => (urx - x, lly + y),
            270 => (urx - y, ury - x),
            _ => (llx + x, ury - y),
        }
    }

    /// User-space rectangle covering a top-left-origin box.
    fn to_pdf_rect(&self, bbox: &BBox) -> [f32; 4] {
        let (ax, ay) = self.to_user_space(bbox.x_min, bbox.y_min);
        let (bx, by) = self.to_user_space(bbox.x_max, bbox.y_max);
        [ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)]
    }
}

fn add_highlight(
    doc: &mut Document,
    page_id: ObjectId,
    rect: &[f32; 4],
    settings: &AnnotationSettings,
) -> ObjectId {
    let [x0, y0, x1, y1] = *rect;
    let (w, h) = (x1 - x0, y1 - y0);
    let [r, g, b] = settings.color;

    let appearance = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), w.into(), h.into()],
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    "GS0" => dictionary! {
                        "Type" => "ExtGState",
                        "BM" => "Multiply",
                        "CA" => settings.opacity,
                        "ca" => settings.opacity,
                    },
                },
            },
        },
        format!("q /GS0 gs {r} {g} {b} rg 0 0 {w} {h} re f Q").into_bytes(),
    );
    let appearance_id = doc.add_object(appearance);

    let annot = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![x0.into(), y0.into(), x1.into(), y1.into()],
        "QuadPoints" => vec![
            x0.into(), y1.into(), x1.into(), y1.into(),
            x0.into(), y0.into(), x1.into(), y0.into(),
        ],
        "C" => vec![r.into(), g.into(), b.into()],
        "CA" => settings.opacity,
        "F" => 4,
        "P" => page_id,
        "AP" => dictionary! { "N" => appearance_id },
    };
    doc.add_object(annot)
}

/// Append annotation references to the page's /Annots, which may be
/// missing, an inline array or a reference to an array.
fn append_annots(doc: &mut Document, page_id: ObjectId, ids: &[ObjectId]) -> Result<(), GdpError> {
    let refs = ids.iter().map(|id| Object::Reference(*id));
    let existing = doc.get_object(page_id)?.as_dict()?.get(b"Annots").ok().cloned();

    match existing {
        Some(Object::Reference(array_id)) => {
            doc.get_object_mut(array_id)?.as_array_mut()?.extend(refs);
        }
        Some(Object::Array(mut annots)) => {
            annots.extend(refs);
            page_dict_mut(doc, page_id)?.set("Annots", annots);
        }
        _ => {
            page_dict_mut(doc, page_id)?.set("Annots", refs.collect::<Vec<_>>());
        }
    }
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, GdpError> {
    Ok(doc.get_object_mut(page_id)?.as_dict_mut()?)
}

/// CropBox (or MediaBox) and rotation of a page.
fn page_geometry(doc: &Document, page_id: ObjectId) -> Option<PageGeometry> {
    let visible = [&b"CropBox"[..], &b"MediaBox"[..]]
        .into_iter()
        .find_map(|key| inherited(doc, page_id, key).and_then(|obj| rectangle(doc, obj)))?;
    Some(PageGeometry {
        visible,
        rotate: page_rotation(doc, page_id),
    })
}

fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj)?.as_i64().ok())
        .map(|deg| deg.rem_euclid(360))
        .filter(|deg| deg % 90 == 0)
        .unwrap_or(0)
}

/// A page attribute, following /Parent for inherited values.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_object(page_id).ok()?.as_dict().ok()?;
    // Bounded walk up the page tree.
    for _ in 0..32 {
        if let Ok(obj) = node.get(key) {
            return Some(obj);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

fn rectangle(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let values: Vec<f32> = resolve(doc, obj)?
        .as_array()
        .ok()?
        .iter()
        .filter_map(number)
        .collect();
    match values.as_slice() {
        [a, b, c, d] => Some([a.min(*c), b.min(*d), a.max(*c), b.max(*d)]),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
