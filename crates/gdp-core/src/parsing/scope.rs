use crate::model::{DepScope, ScopeCode};
use regex::Regex;
use std::sync::LazyLock;

static SCOPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([CZ][A-Z0-9]{2,3})\b").unwrap_or_else(|e| panic!("scope pattern: {e}"))
});

/// Collect the region codes (DEP SCOPE) mentioned in advisory text.
///
/// Tokens are a `C` or `Z` followed by two or three uppercase letters or
/// digits, on word boundaries. Tokens listed in `denylist` are dropped.
pub fn recognize_scope<S: AsRef<str>>(text: &str, denylist: &[S]) -> DepScope {
    SCOPE_TOKEN
        .captures_iter(text)
        .filter_map(|caps| ScopeCode::parse(&caps[1]))
        .filter(|code| {
            !denylist
                .iter()
                .any(|d| d.as_ref().trim().eq_ignore_ascii_case(code.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_DENY: &[&str] = &[];

    #[test]
    fn test_scope_from_advisory_text() {
        let text = "GDP ARRIVALS KJFK ... DEP SCOPE: ZNY Z... CZEG ...";
        let scope = recognize_scope(text, NO_DENY);
        assert_eq!(scope.codes(), vec!["CZEG", "ZNY"]);
    }

    #[test]
    fn test_scope_tier_list() {
        let text = "DEP FACILITIES INCLUDED: (1stTier) ZBW ZDC ZNY ZOB CZY CZU\nZNY ZDC";
        let scope = recognize_scope(text, NO_DENY);
        assert_eq!(scope.codes(), vec!["CZU", "CZY", "ZBW", "ZDC", "ZNY", "ZOB"]);
    }

    #[test]
    fn test_denylist_excludes_tokens() {
        let text = "PROGRAM RATE 40 ... 1500 CDT ... SCOPE ZNY CTOP";
        let scope = recognize_scope(text, &["CDT", "CTOP"]);
        assert_eq!(scope.codes(), vec!["ZNY"]);
    }

    #[test]
    fn test_embedded_tokens_are_ignored() {
        // KZNY has no word boundary before the Z; lowercase never matches.
        let scope = recognize_scope("KZNY zny ZZ Z1 CZEGX", NO_DENY);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_digits_allowed_after_prefix() {
        let scope = recognize_scope("ZAN Z12 C3P", NO_DENY);
        assert_eq!(scope.codes(), vec!["C3P", "Z12", "ZAN"]);
    }

    #[test]
    fn test_every_code_matches_pattern() {
        let text = "CZVR CZWG ZLA ZOA ZSE CZQM ZMA CDT C12 ZZZZ";
        let pattern = Regex::new(r"^[CZ][A-Z0-9]{2,3}$").unwrap();
        let scope = recognize_scope(text, &["CDT"]);
        for code in scope.iter() {
            assert!(pattern.is_match(code.as_str()), "{code}");
        }
        assert!(!scope.codes().contains(&"CDT"));
        let mut sorted = scope.codes();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, scope.codes());
    }

    #[test]
    fn test_no_match_gives_empty_scope() {
        assert!(recognize_scope("", NO_DENY).is_empty());
        assert!(recognize_scope("no codes here", NO_DENY).is_empty());
    }
}
