//! LIKE pattern helpers
//!
//! Provenance values end in `;<providerName>`, so reverse lookups bind the
//! pattern `%;<escaped providerName>`. `%` and `_` inside a provider name must
//! not act as wildcards.

const ESCAPE: char = '\\';

/// Escape LIKE wildcards so the value only matches itself
///
/// The escape character is escaped first, then `%` and `_`.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, ESCAPE | '%' | '_') {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Pattern matching any provenance value of the given provider
///
/// The fixed `%;` prefix is not escaped.
pub fn provider_suffix_pattern(provider_name: &str) -> String {
    format!("%;{}", escape_like(provider_name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    /// `%`
    AnyRun,
    /// `_`
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => Token::AnyRun,
            '_' => Token::AnyOne,
            // A trailing escape character stands for itself
            ESCAPE => Token::Literal(chars.next().unwrap_or(ESCAPE)),
            other => Token::Literal(other),
        };
        tokens.push(token);
    }
    tokens
}

/// Evaluate a LIKE pattern against a value
///
/// `%` matches any run of characters (including none), `_` exactly one
/// character, and `\x` the literal `x`. Matching is iterative and backtracks
/// only to the most recent `%`.
pub fn like_matches(pattern: &str, value: &str) -> bool {
    let tokens = tokenize(pattern);
    let chars: Vec<char> = value.chars().collect();

    let (mut t, mut c) = (0usize, 0usize);
    // Position after the last `%` and the value position it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while c < chars.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                t += 1;
                backtrack = Some((t, c));
            }
            Some(Token::AnyOne) => {
                t += 1;
                c += 1;
            }
            Some(Token::Literal(l)) if *l == chars[c] => {
                t += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((bt, bc)) => {
                    t = bt;
                    c = bc + 1;
                    backtrack = Some((bt, bc + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ldap"), "ldap");
        assert_eq!(escape_like("a%b_c"), "a\\%b\\_c");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like(""), "");
    }

    #[test]
    fn test_provider_suffix_pattern() {
        assert_eq!(provider_suffix_pattern("ldap"), "%;ldap");
        assert_eq!(provider_suffix_pattern("a%b_c"), "%;a\\%b\\_c");
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like_matches("%", ""));
        assert!(like_matches("%", "anything"));
        assert!(like_matches("a_c", "abc"));
        assert!(!like_matches("a_c", "ac"));
        assert!(like_matches("%;ldap", "cn=alice;ldap"));
        assert!(like_matches("%;ldap", ";ldap"));
        assert!(!like_matches("%;ldap", "cn=alice;ldap2"));
        assert!(!like_matches("%;ldap", "cn=alice;xldap"));
        assert!(like_matches("a%b%c", "aXXbYYc"));
        assert!(!like_matches("a%b%c", "aXXbYY"));
    }

    #[test]
    fn test_like_backtracks_over_repeated_suffix() {
        assert!(like_matches("%;ldap", "x;ldap;ldap"));
        assert!(like_matches("%;ldap", "x;ld;ldap"));
    }

    #[test]
    fn test_like_escaped_wildcards_are_literal() {
        let pattern = provider_suffix_pattern("a%b_c");

        assert!(like_matches(&pattern, "alice;a%b_c"));
        assert!(!like_matches(&pattern, "alice;aXbYc"));
        assert!(!like_matches(&pattern, "alice;aXXbc"));
    }

    #[test]
    fn test_like_trailing_escape() {
        assert!(like_matches("a\\", "a\\"));
        assert!(!like_matches("a\\", "a"));
    }

    proptest! {
        #[test]
        fn test_suffix_pattern_matches_own_provider(
            external_id in "[a-z0-9;=,]{0,16}",
            provider in "[a-z%_\\\\]{1,8}"
        ) {
            let value = format!("{};{}", external_id, provider);
            prop_assert!(like_matches(&provider_suffix_pattern(&provider), &value));
        }

        #[test]
        fn test_suffix_pattern_rejects_other_providers(
            external_id in "[a-z0-9=,]{0,16}",
            provider in "[a-z%_]{1,8}",
            other in "[A-Z]{1,8}"
        ) {
            let value = format!("{};{}", external_id, other);
            prop_assert!(!like_matches(&provider_suffix_pattern(&provider), &value));
        }
    }
}
