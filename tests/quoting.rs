// ABOUTME: Property tests for shell quoting at the SSH rendering boundary.
// ABOUTME: Any string must survive quote/unquote and never escape its quotes.

use proptest::prelude::*;
use strofi::host::quote;

/// Reference decoder for the encoding `quote` produces: either a bare safe
/// token or a single-quoted string with `'\''` for embedded quotes.
fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].replace("'\\''", "'")
    } else {
        s.to_string()
    }
}

proptest! {
    #[test]
    fn quoting_round_trips(s in ".*") {
        prop_assert_eq!(unquote(&quote(&s)), s);
    }

    #[test]
    fn bare_output_only_for_safe_characters(s in ".*") {
        let quoted = quote(&s);
        if quoted == s {
            prop_assert!(!s.is_empty());
            prop_assert!(s.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@')
            }));
        }
    }

    #[test]
    fn quoted_output_has_no_bare_single_quote(s in ".*") {
        let quoted = quote(&s);
        if quoted != s {
            // Inside the outer quotes, every ' must be part of the '\''
            // escape; a lone one would end the quoted region early.
            let inner = &quoted[1..quoted.len() - 1];
            let stripped = inner.replace("'\\''", "");
            prop_assert!(!stripped.contains('\''));
        }
    }
}
