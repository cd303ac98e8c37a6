use crate::config::schema::{ColumnKeywords, TableSettings, TableStrategy};
use crate::extraction::PageContent;
use crate::model::TableGrid;
use crate::parsing::columns::resolve_columns;

/// Reconstruct table data from pdftotext -layout output.
///
/// pdftotext -layout preserves column alignment using spaces. The header
/// row is the first line with an identifier and a departure-center column
/// in separate cells; data rows run until a footer or too many blank
/// lines. Returns None when the page has no such header.
pub fn structure_table(
    page: &PageContent,
    keywords: &ColumnKeywords,
    settings: &TableSettings,
) -> Option<TableGrid> {
    let (header_idx, header) = page.lines.iter().enumerate().find_map(|(i, line)| {
        let cells = split_cells(line);
        let texts: Vec<&str> = cells.iter().map(|c| c.text).collect();
        resolve_columns(&texts, keywords)
            .required()
            .map(|_| (i, cells))
    })?;

    let columns = column_spans(&header);
    let mut rows = vec![header.iter().map(|c| c.text.to_string()).collect::<Vec<_>>()];
    let mut blank_run = 0;

    for line in &page.lines[header_idx + 1..] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > settings.max_blank_lines {
                break;
            }
            continue;
        }
        if is_footer(trimmed) {
            break;
        }
        blank_run = 0;

        let cells = split_cells(line);
        let row = match settings.strategy {
            TableStrategy::Gaps => cells.iter().map(|c| c.text.to_string()).collect(),
            TableStrategy::Aligned => align_cells(&cells, &columns),
        };
        rows.push(row);
    }

    Some(TableGrid {
        page_number: page.page_number,
        rows,
    })
}

/// A run of text between gaps of two or more spaces, with its character columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CellSpan<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Split a line by gaps of 2+ whitespace characters.
pub(crate) fn split_cells(line: &str) -> Vec<CellSpan<'_>> {
    let mut cells = Vec::new();
    // (char column, byte offset) of the current cell start
    let mut start: Option<(usize, usize)> = None;
    // (char column, byte offset) just past the last non-space char
    let mut last_end = (0, 0);
    let mut space_count = 0;

    for (col, (byte, c)) in line.char_indices().enumerate() {
        if c.is_whitespace() {
            space_count += 1;
            if space_count == 2 {
                if let Some((s_col, s_byte)) = start.take() {
                    cells.push(CellSpan {
                        start: s_col,
                        end: last_end.0,
                        text: &line[s_byte..last_end.1],
                    });
                }
            }
        } else {
            if start.is_none() {
                start = Some((col, byte));
            }
            space_count = 0;
            last_end = (col + 1, byte + c.len_utf8());
        }
    }

    if let Some((s_col, s_byte)) = start {
        cells.push(CellSpan {
            start: s_col,
            end: last_end.0,
            text: &line[s_byte..last_end.1],
        });
    }

    cells
}

/// Horizontal extent of each header column: from its start to the next one's.
fn column_spans(header: &[CellSpan<'_>]) -> Vec<(usize, usize)> {
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let end = header.get(i + 1).map(|next| next.start).unwrap_or(usize::MAX);
            (cell.start, end)
        })
        .collect()
}

/// Place each cell under the header column it overlaps most. Columns
/// without a cell stay empty so positions line up with the header.
fn align_cells(cells: &[CellSpan<'_>], columns: &[(usize, usize)]) -> Vec<String> {
    let mut row = vec![String::new(); columns.len()];
    for cell in cells {
        let Some(target) = best_column(cell, columns) else {
            continue;
        };
        if !row[target].is_empty() {
            row[target].push(' ');
        }
        row[target].push_str(cell.text);
    }
    row
}

fn best_column(cell: &CellSpan<'_>, columns: &[(usize, usize)]) -> Option<usize> {
    let overlap = |(start, end): (usize, usize)| {
        cell.end.min(end).saturating_sub(cell.start.max(start))
    };
    let (best, best_overlap) = columns
        .iter()
        .enumerate()
        .map(|(i, &span)| (i, overlap(span)))
        .max_by_key(|&(i, o)| (o, std::cmp::Reverse(i)))?;
    if best_overlap > 0 {
        return Some(best);
    }
    // No overlap: the cell sits left of the first column.
    Some(0)
}

fn is_footer(trimmed: &str) -> bool {
    let lower = trimmed.to_lowercase();
    lower.starts_with("page ") || trimmed.starts_with("---")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::default_config;
    use crate::extraction::TextSource;

    fn page(lines: &[&str]) -> PageContent {
        PageContent {
            page_number: 1,
            lines: lines.iter().map(|s| s.to_string()).collect(),
            words: vec![],
            size: None,
            source: TextSource::TextLayer,
        }
    }

    fn structure(lines: &[&str], strategy: TableStrategy) -> Option<TableGrid> {
        let cfg = default_config().unwrap();
        let settings = TableSettings {
            strategy,
            ..cfg.table
        };
        structure_table(&page(lines), &cfg.columns, &settings)
    }

    #[test]
    fn test_split_cells() {
        let cells = split_cells("  ACA123    KZNY  45 MIN");
        let texts: Vec<&str> = cells.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["ACA123", "KZNY", "45 MIN"]);
        assert_eq!(cells[0].start, 2);
        assert_eq!(cells[0].end, 8);
    }

    #[test]
    fn test_header_and_rows() {
        let grid = structure(
            &[
                "ATCSCC ARRIVALS LIST",
                "",
                "ACID      DCENTR    PgmDelay",
                "ACA123    KZNY      45 MIN",
                "DAL77     KBOS      5 MIN",
                "",
                "",
                "Generated 1412Z",
            ],
            TableStrategy::Aligned,
        )
        .unwrap();
        assert_eq!(grid.header(), &["ACID", "DCENTR", "PgmDelay"]);
        assert_eq!(grid.data_rows().len(), 2);
        assert_eq!(grid.data_rows()[0], vec!["ACA123", "KZNY", "45 MIN"]);
    }

    #[test]
    fn test_aligned_keeps_empty_cell_position() {
        let grid = structure(
            &[
                "ACID      DCENTR    ETA     PgmDelay",
                "ACA123    KZNY              45",
            ],
            TableStrategy::Aligned,
        )
        .unwrap();
        assert_eq!(grid.data_rows()[0], vec!["ACA123", "KZNY", "", "45"]);
    }

    #[test]
    fn test_gaps_strategy_collapses_empty_cell() {
        let grid = structure(
            &[
                "ACID      DCENTR    ETA     PgmDelay",
                "ACA123    KZNY              45",
            ],
            TableStrategy::Gaps,
        )
        .unwrap();
        assert_eq!(grid.data_rows()[0], vec!["ACA123", "KZNY", "45"]);
    }

    #[test]
    fn test_footer_ends_table() {
        let grid = structure(
            &["ACID    DCENTR", "ACA123  KZNY", "Page 1 of 3", "ZZZ999  ZNY"],
            TableStrategy::Aligned,
        )
        .unwrap();
        assert_eq!(grid.data_rows().len(), 1);
    }

    #[test]
    fn test_single_cell_naming_both_roles_is_not_a_header() {
        // Single-spaced, as tesseract prints it.
        let lines = ["ACID DCENTR ETA PgmDelay", "ACA123 KZNY 1432 45"];
        assert!(structure(&lines, TableStrategy::Aligned).is_none());
        assert!(structure(&lines, TableStrategy::Gaps).is_none());
    }

    #[test]
    fn test_title_line_does_not_hide_real_header() {
        let grid = structure(
            &[
                "FLIGHT LIST BY DEPARTURE CENTER",
                "Filter(s): Arrivals KJFK between 1500Z and 2359Z",
                "",
                "ACID       DCENTR     PgmDelay",
                "ACA123     KZNY       45 MIN",
            ],
            TableStrategy::Aligned,
        )
        .unwrap();
        assert_eq!(grid.header(), &["ACID", "DCENTR", "PgmDelay"]);
        assert_eq!(grid.data_rows(), &[vec!["ACA123", "KZNY", "45 MIN"]]);
    }

    #[test]
    fn test_no_header_is_no_table() {
        assert!(structure(&["Some prose", "More prose"], TableStrategy::Aligned).is_none());
        assert!(structure(&[], TableStrategy::Aligned).is_none());
    }
}
