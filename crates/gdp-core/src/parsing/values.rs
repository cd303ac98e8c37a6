/// Parse a delay cell into whole minutes.
///
/// Every non-digit character is dropped before parsing, so `"45 MIN"`,
/// `"45'"` and `"45"` all read as 45. Returns None when no digits are left
/// or the number does not fit; callers treat that as zero minutes.
pub fn parse_delay(cell: Option<&str>) -> Option<u32> {
    let digits: String = cell?.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Last token made only of digits, read as minutes (OCR line heuristic).
pub fn last_integer_token<'a, I>(tokens: I) -> Option<u32>
where
    I: DoubleEndedIterator<Item = &'a str>,
{
    tokens
        .rev()
        .find(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
        .and_then(|t| t.parse().ok())
}
