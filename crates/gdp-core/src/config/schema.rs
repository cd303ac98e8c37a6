use serde::{Deserialize, Serialize};

/// Tunables for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub scope: ScopeSettings,
    pub columns: ColumnKeywords,
    #[serde(default)]
    pub table: TableSettings,
    #[serde(default)]
    pub fallback: FallbackSettings,
    #[serde(default)]
    pub annotation: AnnotationSettings,
    #[serde(default)]
    pub ocr: OcrSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeSettings {
    /// Tokens that look like region codes but never are (time zones, program names).
    #[serde(default)]
    pub denylist: Vec<String>,
}

/// Header keywords per column role, matched against the uppercased,
/// whitespace-stripped header cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnKeywords {
    pub identifier: Vec<String>,
    pub departure_center: Vec<String>,
    #[serde(default)]
    pub delay: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStrategy {
    /// Assign cells to header columns by horizontal overlap.
    #[default]
    Aligned,
    /// Split lines on runs of two or more spaces.
    Gaps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    #[serde(default)]
    pub strategy: TableStrategy,
    /// Blank lines tolerated between data rows before the table ends.
    #[serde(default = "default_max_blank_lines")]
    pub max_blank_lines: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            strategy: TableStrategy::default(),
            max_blank_lines: default_max_blank_lines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Minimum whitespace-separated tokens for an OCR line to count as a row.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSettings {
    /// RGB, each component in 0..=1.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            color: default_color(),
            opacity: default_opacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Pages with fewer non-whitespace characters are treated as scanned.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_language(),
            dpi: default_dpi(),
            min_text_chars: default_min_text_chars(),
        }
    }
}

fn default_max_blank_lines() -> usize {
    1
}

fn default_min_tokens() -> usize {
    4
}

fn default_color() -> [f32; 3] {
    [1.0, 1.0, 0.0]
}

fn default_opacity() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "eng".into()
}

fn default_dpi() -> u32 {
    300
}

fn default_min_text_chars() -> usize {
    20
}
