use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An airspace region identifier (FIR / ARTCC code) such as `ZNY` or `CZEG`.
///
/// Always uppercase, starts with `C` or `Z`, 3 or 4 characters long.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeCode(String);

impl ScopeCode {
    /// Normalize and validate a raw token. Returns None for anything that
    /// is not a well-formed region code.
    pub fn parse(raw: &str) -> Option<ScopeCode> {
        let code = raw.trim().to_uppercase();
        let mut chars = code.chars();
        let first = chars.next()?;
        if first != 'C' && first != 'Z' {
            return None;
        }
        if !(3..=4).contains(&code.len()) {
            return None;
        }
        if !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return None;
        }
        Some(ScopeCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ScopeCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ScopeCode::parse(&value).ok_or_else(|| format!("'{value}' is not a region code"))
    }
}

impl From<ScopeCode> for String {
    fn from(code: ScopeCode) -> Self {
        code.0
    }
}

/// The set of region codes a GDP applies to. Sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepScope(BTreeSet<ScopeCode>);

impl DepScope {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopeCode> {
        self.0.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.0.iter().map(ScopeCode::as_str).collect()
    }

    /// First scope code contained in `text` (already uppercased by the caller).
    pub fn find_in(&self, text: &str) -> Option<&ScopeCode> {
        self.0.iter().find(|code| text.contains(code.as_str()))
    }
}

impl FromIterator<ScopeCode> for DepScope {
    fn from_iter<I: IntoIterator<Item = ScopeCode>>(iter: I) -> Self {
        DepScope(iter.into_iter().collect())
    }
}

impl fmt::Display for DepScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.codes().join(" "))
    }
}

/// Effective time range of the program, as printed in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum TimeWindow {
    Detected(String),
    NotDetected,
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Detected(s) => f.write_str(s),
            TimeWindow::NotDetected => f.write_str("not detected"),
        }
    }
}

/// Rows x cells recovered from one page. Row 0 is the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    pub page_number: usize,
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Semantic columns of an arrivals table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identifier,
    DepartureCenter,
    Delay,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Identifier => write!(f, "identifier"),
            ColumnRole::DepartureCenter => write!(f, "departure center"),
            ColumnRole::Delay => write!(f, "delay"),
        }
    }
}

/// Column index per role; `None` when the header has no matching cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub identifier: Option<usize>,
    pub departure_center: Option<usize>,
    pub delay: Option<usize>,
}

impl ColumnMap {
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Identifier => self.identifier,
            ColumnRole::DepartureCenter => self.departure_center,
            ColumnRole::Delay => self.delay,
        }
    }

    /// Indices of the two roles a page cannot be processed without.
    ///
    /// Both roles must resolve to different cells; a single cell naming
    /// both (a title line, or a single-spaced OCR header) is not a header.
    pub fn required(&self) -> Option<(usize, usize)> {
        let (id, dep) = (self.identifier?, self.departure_center?);
        (id != dep).then_some((id, dep))
    }

    /// Largest resolved index; rows must be longer than this to be read.
    pub fn max_index(&self) -> Option<usize> {
        [self.identifier, self.departure_center, self.delay]
            .into_iter()
            .flatten()
            .max()
    }
}

/// Where an impacted row was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    /// A structured table cell.
    Table,
    /// Raw OCR line heuristic; lower confidence.
    OcrLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactedRow {
    /// ACID / callsign.
    pub flight_id: String,
    /// Departure-center text as it appeared in the document.
    pub departure_center: String,
    /// Program delay in minutes (0 when unparsable).
    pub delay_minutes: u32,
    pub page_number: usize,
    pub source: RowSource,
}

/// Ordinal impact of a GDP on the analysed arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityRating {
    Nil,
    Low,
    Moderate,
    High,
}

impl fmt::Display for SeverityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityRating::Nil => write!(f, "NIL"),
            SeverityRating::Low => write!(f, "LOW"),
            SeverityRating::Moderate => write!(f, "MODERATE"),
            SeverityRating::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Critical,
    Important,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ScopeNotFound,
    PageSkipped,
    DelayParseFallback,
    AnnotationMiss,
    LowConfidence,
}

/// A non-fatal condition met during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    pub message: String,
    pub severity: DiagnosticSeverity,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, page_number: Option<usize>, message: impl Into<String>) -> Self {
        let severity = match kind {
            DiagnosticKind::ScopeNotFound => DiagnosticSeverity::Critical,
            DiagnosticKind::PageSkipped | DiagnosticKind::LowConfidence => {
                DiagnosticSeverity::Important
            }
            DiagnosticKind::DelayParseFallback | DiagnosticKind::AnnotationMiss => {
                DiagnosticSeverity::Info
            }
        };
        Diagnostic {
            kind,
            page_number,
            message: message.into(),
            severity,
        }
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub dep_scope: DepScope,
    pub time_window: TimeWindow,
    pub impacted: Vec<ImpactedRow>,
    pub total_delay: u64,
    /// Mean delay in minutes, rounded to one decimal place.
    pub mean_delay: Decimal,
    pub rating: SeverityRating,
    pub diagnostics: Vec<Diagnostic>,
    /// Arrivals document with highlight annotations applied.
    #[serde(skip)]
    pub annotated_pdf: Vec<u8>,
}

impl AnalysisResult {
    pub fn impacted_count(&self) -> usize {
        self.impacted.len()
    }

    /// True when the advisory yielded no region codes at all.
    pub fn scope_missing(&self) -> bool {
        self.dep_scope.is_empty()
    }

    /// True when any impacted row came from the OCR line heuristic.
    pub fn low_confidence(&self) -> bool {
        self.impacted.iter().any(|r| r.source == RowSource::OcrLine)
    }
}
