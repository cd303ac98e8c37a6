use crate::config::schema::ColumnKeywords;
use crate::model::ColumnMap;

/// Map column roles to header positions by keyword.
///
/// Each header cell is uppercased with all whitespace removed before the
/// keywords are looked for, so `"Min Delay"` matches `DELAY` and
/// `"Pgm Delay"` matches `PGMDELAY`.
pub fn resolve_columns<S: AsRef<str>>(header: &[S], keywords: &ColumnKeywords) -> ColumnMap {
    let normalized: Vec<String> = header.iter().map(|h| normalize_header(h.as_ref())).collect();
    ColumnMap {
        identifier: find_column(&normalized, &keywords.identifier),
        departure_center: find_column(&normalized, &keywords.departure_center),
        delay: find_column(&normalized, &keywords.delay),
    }
}

/// Index of the first normalized header cell containing any candidate.
fn find_column(normalized: &[String], candidates: &[String]) -> Option<usize> {
    let candidates: Vec<String> = candidates
        .iter()
        .map(|c| normalize_header(c))
        .filter(|c| !c.is_empty())
        .collect();
    normalized
        .iter()
        .position(|cell| !cell.is_empty() && candidates.iter().any(|c| cell.contains(c.as_str())))
}

fn normalize_header(cell: &str) -> String {
    cell.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
