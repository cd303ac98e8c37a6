use crate::model::TimeWindow;
use regex::Regex;
use std::sync::LazyLock;

static FILTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)Filter\(s\):.*?between\s+(.*?)\s*$")
        .unwrap_or_else(|e| panic!("filter pattern: {e}"))
});

/// Find the effective time range on a "Filter(s): ... between <range>" line.
///
/// The first page with such a line wins.
pub fn extract_time_window<I, S>(page_texts: I) -> TimeWindow
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    page_texts
        .into_iter()
        .find_map(|text| {
            FILTER_LINE
                .captures(text.as_ref())
                .map(|caps| caps[1].trim().to_string())
        })
        .filter(|w| !w.is_empty())
        .map(TimeWindow::Detected)
        .unwrap_or(TimeWindow::NotDetected)
}
