//! Glob matching for cache key invalidation.
//!
//! `*` matches any run of characters (including none), `?` matches exactly one.
//! Every other character matches itself.

/// Check whether `key` matches the glob `pattern`
pub fn glob_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0usize, 0usize);
    // Position of the last `*` and the key index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
            }
            Some('?') => {
                p += 1;
                k += 1;
            }
            Some(&c) if c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    k = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_patterns() {
        assert!(glob_matches("customers:get:42", "customers:get:42"));
        assert!(!glob_matches("customers:get:42", "customers:get:420"));
        assert!(!glob_matches("customers:get:420", "customers:get:42"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(glob_matches("customers_page_*", "customers_page_1"));
        assert!(glob_matches("customers_page_*", "customers_page_"));
        assert!(!glob_matches("customers_page_*", "other"));
    }

    #[test]
    fn test_interior_and_multiple_wildcards() {
        assert!(glob_matches("*:list:*", "orders:list:page=1"));
        assert!(glob_matches("a*b*c", "aXXbYYc"));
        assert!(glob_matches("a*b*c", "abc"));
        assert!(!glob_matches("a*b*c", "aXXbYY"));
        assert!(glob_matches("**", ""));
    }

    #[test]
    fn test_single_char_wildcard() {
        assert!(glob_matches("page_?", "page_1"));
        assert!(!glob_matches("page_?", "page_12"));
        assert!(!glob_matches("page_?", "page_"));
    }
}
