//! Scanning of the `${...}` placeholder micro-language.
//!
//! A placeholder key is the text between `${` and `}` and may not itself
//! contain `$`, `{` or `}`. Placeholders nested inside another placeholder's
//! text are therefore matched innermost first.

use std::sync::LazyLock;

use regex::Regex;
use strata_common::constants::{DEFAULT_SEPARATOR, PLACEHOLDER_PREFIX, PLACEHOLDER_SUFFIX};

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^${}]+)\}").expect("placeholder pattern is valid")
});

/// Returns the keys of all innermost placeholders in `text`, in order.
///
/// ```
/// use strata_core::placeholder::extract_keys;
/// assert_eq!(extract_keys("${port}:${extPort}"), vec!["port", "extPort"]);
/// ```
#[must_use]
pub fn extract_keys(text: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Returns the keys of innermost placeholders that sit inside the text of
/// an enclosing placeholder, as in `b` for `${a.${b}}`.
#[must_use]
pub fn nested_keys(text: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(0).zip(caps.get(1)))
        .filter(|(whole, _)| open_depth(&text[..whole.start()]) > 0)
        .map(|(_, key)| key.as_str())
        .collect()
}

/// Number of `${` left unclosed at the end of `prefix`.
fn open_depth(prefix: &str) -> usize {
    let mut depth = 0_usize;
    let mut chars = prefix.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                let _ = chars.next();
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

/// Returns `true` if `text` holds at least one placeholder.
#[must_use]
pub fn contains_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Wraps a key back into placeholder form.
#[must_use]
pub fn wrap(key: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{key}{PLACEHOLDER_SUFFIX}")
}

/// Splits a key into its path and optional `:-` fallback literal.
#[must_use]
pub fn split_default(key: &str) -> (&str, Option<&str>) {
    key.split_once(DEFAULT_SEPARATOR)
        .map_or((key, None), |(path, default)| (path, Some(default)))
}
