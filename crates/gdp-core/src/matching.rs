//! Decide which arrivals fall inside the DEP SCOPE and total their delay.
//!
//! A row matches when any scope code is a substring of its uppercased
//! departure-center cell, so `ZNY` matches `KZNY` and `ZNY/NY`. This also
//! means a short code matches inside any longer unrelated code that
//! happens to contain it; that trade-off is kept as is.

use crate::config::schema::ColumnKeywords;
use crate::config::AnalyzerConfig;
use crate::extraction::table::structure_table;
use crate::extraction::{PageContent, TextSource};
use crate::model::{
    ColumnMap, ColumnRole, DepScope, Diagnostic, DiagnosticKind, ImpactedRow, RowSource, TableGrid,
};
use crate::parsing::columns::resolve_columns;
use crate::parsing::values::{last_integer_token, parse_delay};
use crate::severity::mean_delay;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// How a page was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Table,
    OcrLines,
    Skipped,
}

/// Matches and diagnostics produced by one page.
#[derive(Debug, Clone)]
pub struct PageMatches {
    pub mode: PageMode,
    pub rows: Vec<ImpactedRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PageMatches {
    fn skipped(diagnostics: Vec<Diagnostic>) -> Self {
        PageMatches {
            mode: PageMode::Skipped,
            rows: Vec::new(),
            diagnostics,
        }
    }
}

/// Run table structuring, column resolution and matching for one page.
///
/// Never fails: a page that cannot be read is reported and contributes
/// nothing.
pub fn match_page(page: &PageContent, scope: &DepScope, config: &AnalyzerConfig) -> PageMatches {
    if let TextSource::Unavailable(reason) = &page.source {
        warn!(page = page.page_number, %reason, "page skipped");
        return PageMatches::skipped(vec![Diagnostic::new(
            DiagnosticKind::PageSkipped,
            Some(page.page_number),
            format!("page {} has no readable text: {}", page.page_number, reason),
        )]);
    }

    if let Some(grid) = structure_table(page, &config.columns, &config.table) {
        let columns = resolve_columns(grid.header(), &config.columns);
        debug!(page = page.page_number, ?columns, rows = grid.data_rows().len(), "table found");
        if columns.required().is_some() {
            return match_table(&grid, &columns, scope);
        }
    }

    if page.source == TextSource::Ocr {
        return match_ocr_lines(
            &page.lines,
            page.page_number,
            scope,
            &config.columns,
            config.fallback.min_tokens,
        );
    }

    debug!(page = page.page_number, "no arrivals table on page");
    PageMatches::skipped(Vec::new())
}

/// Match the data rows of a structured grid against the scope.
pub fn match_table(grid: &TableGrid, columns: &ColumnMap, scope: &DepScope) -> PageMatches {
    let mut rows = Vec::new();
    let mut diagnostics = Vec::new();

    let (Some((id_idx, dep_idx)), Some(max_idx)) = (columns.required(), columns.max_index()) else {
        let missing: Vec<String> = [ColumnRole::Identifier, ColumnRole::DepartureCenter]
            .into_iter()
            .filter(|role| columns.get(*role).is_none())
            .map(|role| role.to_string())
            .collect();
        return PageMatches::skipped(vec![Diagnostic::new(
            DiagnosticKind::PageSkipped,
            Some(grid.page_number),
            format!(
                "page {}: table header has no {} column",
                grid.page_number,
                missing.join(" or ")
            ),
        )]);
    };

    if columns.delay.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DelayParseFallback,
            Some(grid.page_number),
            format!(
                "page {}: no delay column, delays counted as 0",
                grid.page_number
            ),
        ));
    }

    for row in grid.data_rows() {
        if row.is_empty() || row.len() <= max_idx {
            continue;
        }

        let departure = row[dep_idx].trim();
        if scope.find_in(&departure.to_uppercase()).is_none() {
            continue;
        }

        let flight_id = row[id_idx].trim().to_string();
        let delay_cell = columns.delay.map(|i| row[i].as_str());
        let delay_minutes = match parse_delay(delay_cell) {
            Some(minutes) => minutes,
            None => {
                if let Some(cell) = delay_cell.filter(|c| !c.trim().is_empty()) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DelayParseFallback,
                        Some(grid.page_number),
                        format!("{flight_id}: delay '{cell}' unreadable, counted as 0"),
                    ));
                }
                0
            }
        };

        rows.push(ImpactedRow {
            flight_id,
            departure_center: departure.to_string(),
            delay_minutes,
            page_number: grid.page_number,
            source: RowSource::Table,
        });
    }

    PageMatches {
        mode: PageMode::Table,
        rows,
        diagnostics,
    }
}

/// Degraded matching over raw OCR lines.
///
/// A line with at least `min_tokens` whitespace-separated tokens matches
/// when a scope code appears anywhere in it. The first token is taken as
/// the flight identifier and the last all-digit token as the delay.
pub fn match_ocr_lines(
    lines: &[String],
    page_number: usize,
    scope: &DepScope,
    keywords: &ColumnKeywords,
    min_tokens: usize,
) -> PageMatches {
    let mut rows = Vec::new();

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < min_tokens {
            continue;
        }
        if resolve_columns(&tokens, keywords).required().is_some() {
            continue;
        }

        let upper = line.to_uppercase();
        let Some(code) = scope.find_in(&upper) else {
            continue;
        };

        let departure = tokens
            .iter()
            .find(|t| t.to_uppercase().contains(code.as_str()))
            .map(|t| t.to_string())
            .unwrap_or_else(|| code.to_string());

        rows.push(ImpactedRow {
            flight_id: tokens[0].to_string(),
            departure_center: departure,
            delay_minutes: last_integer_token(tokens.iter().copied()).unwrap_or(0),
            page_number,
            source: RowSource::OcrLine,
        });
    }

    let mut diagnostics = Vec::new();
    if !rows.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::LowConfidence,
            Some(page_number),
            format!(
                "page {}: {} row(s) matched from OCR text lines; flight ids and delays are estimates",
                page_number,
                rows.len()
            ),
        ));
    }

    PageMatches {
        mode: PageMode::OcrLines,
        rows,
        diagnostics,
    }
}

/// Count, total and mean of the impacted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub count: usize,
    pub total_delay: u64,
    /// Unrounded mean in minutes.
    pub mean_delay: Decimal,
}

pub fn aggregate(rows: &[ImpactedRow]) -> Totals {
    let total_delay: u64 = rows.iter().map(|r| u64::from(r.delay_minutes)).sum();
    Totals {
        count: rows.len(),
        total_delay,
        mean_delay: mean_delay(total_delay, rows.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;
    use crate::model::ScopeCode;
    use rust_decimal_macros::dec;

    fn scope(codes: &[&str]) -> DepScope {
        codes.iter().filter_map(|c| ScopeCode::parse(c)).collect()
    }

    fn grid(rows: &[&[&str]]) -> TableGrid {
        TableGrid {
            page_number: 1,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn columns(id: usize, dep: usize, delay: Option<usize>) -> ColumnMap {
        ColumnMap {
            identifier: Some(id),
            departure_center: Some(dep),
            delay,
        }
    }

    #[test]
    fn test_substring_match_with_prefix() {
        let g = grid(&[
            &["ACID", "DCENTR", "PgmDelay"],
            &["ACA123", "KZNY", "45 MIN"],
            &["DAL77", "KBOS", "5 MIN"],
        ]);
        let m = match_table(&g, &columns(0, 1, Some(2)), &scope(&["CZEG", "ZNY"]));
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].flight_id, "ACA123");
        assert_eq!(m.rows[0].departure_center, "KZNY");
        assert_eq!(m.rows[0].delay_minutes, 45);
        assert_eq!(m.rows[0].source, RowSource::Table);
    }

    #[test]
    fn test_lowercase_departure_matches() {
        let g = grid(&[&["ACID", "DCENTR"], &["JBU9", "czeg"]]);
        let m = match_table(&g, &columns(0, 1, None), &scope(&["CZEG"]));
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].delay_minutes, 0);
    }

    #[test]
    fn test_short_code_inside_unrelated_code() {
        // Pinned: containment is not bounded, ZOA matches inside KZOAX.
        let g = grid(&[&["ACID", "DCENTR"], &["UAL1", "KZOAX"]]);
        let m = match_table(&g, &columns(0, 1, None), &scope(&["ZOA"]));
        assert_eq!(m.rows.len(), 1);
    }

    #[test]
    fn test_short_rows_skipped() {
        let g = grid(&[
            &["ACID", "DCENTR", "PgmDelay"],
            &[],
            &["ACA123", "KZNY"],
            &["ACA124", "KZNY", "20"],
        ]);
        let m = match_table(&g, &columns(0, 1, Some(2)), &scope(&["ZNY"]));
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].flight_id, "ACA124");
    }

    #[test]
    fn test_unreadable_delay_counts_zero_with_diagnostic() {
        let g = grid(&[&["ACID", "DCENTR", "PgmDelay"], &["ACA123", "ZNY", "N/A"]]);
        let m = match_table(&g, &columns(0, 1, Some(2)), &scope(&["ZNY"]));
        assert_eq!(m.rows[0].delay_minutes, 0);
        assert!(m
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DelayParseFallback));
    }

    #[test]
    fn test_empty_scope_matches_nothing() {
        let g = grid(&[&["ACID", "DCENTR", "PgmDelay"], &["ACA123", "KZNY", "45"]]);
        let m = match_table(&g, &columns(0, 1, Some(2)), &DepScope::default());
        assert!(m.rows.is_empty());
        let totals = aggregate(&m.rows);
        assert_eq!(totals.count, 0);
        assert_eq!(totals.mean_delay, Decimal::ZERO);
    }

    #[test]
    fn test_missing_required_column_skips_page() {
        let g = grid(&[&["ACID", "ETA"], &["ACA123", "1500"]]);
        let map = ColumnMap {
            identifier: Some(0),
            departure_center: None,
            delay: None,
        };
        let m = match_table(&g, &map, &scope(&["ZNY"]));
        assert_eq!(m.mode, PageMode::Skipped);
        assert_eq!(m.diagnostics[0].kind, DiagnosticKind::PageSkipped);
        assert!(m.diagnostics[0].message.contains("no departure center column"));
    }

    #[test]
    fn test_ocr_lines_fallback() {
        let cfg = default_config().unwrap();
        let lines: Vec<String> = [
            "ACID DCENTR ETA PgmDelay",
            "ACA123 KZNY 1432 45 MIN",
            "DAL77 KBOS 1440 5",
            "short ZNY line",
            "WJA8 CZEG 1505 --",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let m = match_ocr_lines(&lines, 2, &scope(&["CZEG", "ZNY"]), &cfg.columns, 4);
        assert_eq!(m.mode, PageMode::OcrLines);
        assert_eq!(m.rows.len(), 2);
        assert_eq!(m.rows[0].flight_id, "ACA123");
        assert_eq!(m.rows[0].departure_center, "KZNY");
        assert_eq!(m.rows[0].delay_minutes, 45);
        assert_eq!(m.rows[0].source, RowSource::OcrLine);
        // Only the ETA looks like an integer.
        assert_eq!(m.rows[1].delay_minutes, 1505);
        assert_eq!(m.diagnostics[0].kind, DiagnosticKind::LowConfidence);
    }

    fn page(lines: &[&str], source: TextSource) -> PageContent {
        PageContent {
            page_number: 1,
            lines: lines.iter().map(|s| s.to_string()).collect(),
            words: vec![],
            size: None,
            source,
        }
    }

    #[test]
    fn test_ocr_page_with_single_spaced_header_uses_line_fallback() {
        let cfg = default_config().unwrap();
        let p = page(
            &[
                "ACID DCENTR ETA PgmDelay",
                "ACA123 KZNY 1432 45",
                "DAL77 KBOS 1440 5",
            ],
            TextSource::Ocr,
        );
        let m = match_page(&p, &scope(&["CZEG", "ZNY"]), &cfg);
        assert_eq!(m.mode, PageMode::OcrLines);
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].flight_id, "ACA123");
        assert_eq!(m.rows[0].departure_center, "KZNY");
        assert_eq!(m.rows[0].delay_minutes, 45);
        assert_eq!(m.rows[0].source, RowSource::OcrLine);
    }

    #[test]
    fn test_ocr_page_with_aligned_header_uses_table() {
        let cfg = default_config().unwrap();
        let p = page(
            &["ACID     DCENTR     PgmDelay", "ACA123   KZNY       45"],
            TextSource::Ocr,
        );
        let m = match_page(&p, &scope(&["ZNY"]), &cfg);
        assert_eq!(m.mode, PageMode::Table);
        assert_eq!(m.rows[0].source, RowSource::Table);
        assert_eq!(m.rows[0].delay_minutes, 45);
    }

    #[test]
    fn test_text_page_title_line_is_not_a_header() {
        let cfg = default_config().unwrap();
        let p = page(
            &[
                "FLIGHT LIST BY DEPARTURE CENTER",
                "",
                "ACID       DCENTR     PgmDelay",
                "ACA123     KZNY       45 MIN",
            ],
            TextSource::TextLayer,
        );
        let m = match_page(&p, &scope(&["ZNY"]), &cfg);
        assert_eq!(m.mode, PageMode::Table);
        assert_eq!(m.rows.len(), 1);
        assert_eq!(m.rows[0].flight_id, "ACA123");
        assert_eq!(m.rows[0].departure_center, "KZNY");
        assert_eq!(m.rows[0].delay_minutes, 45);
        assert!(m.diagnostics.is_empty());
    }

    #[test]
    fn test_aggregate() {
        let row = |d| ImpactedRow {
            flight_id: "X".into(),
            departure_center: "ZNY".into(),
            delay_minutes: d,
            page_number: 1,
            source: RowSource::Table,
        };
        let totals = aggregate(&[row(10), row(20), row(25)]);
        assert_eq!(totals.count, 3);
        assert_eq!(totals.total_delay, 55);
        assert_eq!(totals.mean_delay.round_dp(1), dec!(18.3));
    }
}
