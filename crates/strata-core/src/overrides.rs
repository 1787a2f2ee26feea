//! Command-supplied `path=value` overrides.
//!
//! Overrides are parsed once, validated against page 0 and the running
//! config, then merged into page 0 with [`MergeStrategy::Replace`] so a
//! sequence override replaces the page's sequence instead of extending it.

use indexmap::IndexMap;
use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::opt,
    sequence::terminated,
};
use strata_common::error::{Result, StrataError};

use crate::accessor::{self, MergeStrategy};
use crate::path::Path;
use crate::value::{Mapping, Value};

/// One failed override check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideFailure {
    /// The path exists neither in the running config nor in page 0.
    #[error("(missing) {0}")]
    Missing(String),
    /// The path exists with a different, non-coercible type.
    #[error("(type) {0}")]
    Type(String),
}

/// Parsed override tokens.
///
/// Values are kept twice: flat, keyed by dotted path, for validation; and as
/// a nested tree for merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    flat: IndexMap<String, Value>,
    nested: Mapping,
    tokens: Vec<String>,
}

impl Overrides {
    /// Parses `[<page>:]<dotted.path>=<value>` tokens. Blank tokens are skipped.
    ///
    /// # Errors
    ///
    /// - [`StrataError::OverrideSyntax`] for a token without a `path=` head.
    /// - [`StrataError::Unsupported`] for a page-qualified token.
    pub fn parse<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::default();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            let (raw, (page, path)) =
                override_head(token).map_err(|_| StrataError::OverrideSyntax {
                    token: token.to_string(),
                })?;
            if let Some(page) = page {
                return Err(StrataError::Unsupported {
                    feature: format!("page specific overrides (page {page} in `{token}`)"),
                });
            }
            overrides.put(path, sniff_value(raw))?;
            overrides.tokens.push(token.to_string());
        }
        Ok(overrides)
    }

    /// Adds or replaces one override.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidPath`] if `path` does not parse.
    pub fn put(&mut self, path: &str, value: Value) -> Result<()> {
        accessor::set(&mut self.nested, &Path::parse(path)?, value.clone())?;
        let _ = self.flat.insert(path.to_string(), value);
        Ok(())
    }

    /// Overrides keyed by dotted path, in input order.
    #[must_use]
    pub const fn flat(&self) -> &IndexMap<String, Value> {
        &self.flat
    }

    /// Overrides as a tree, ready to merge.
    #[must_use]
    pub const fn nested(&self) -> &Mapping {
        &self.nested
    }

    /// The accepted tokens, as given.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns `true` when no override was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Checks every override against `running` and then `page`.
    ///
    /// A path must already exist (null counts as absent) and hold a value of
    /// the same kind. The one coercion attempted: a string shaped `[x,y]`
    /// overriding an existing sequence becomes the string sequence `["x","y"]`.
    /// All failures are collected before returning.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::OverrideValidation`] listing every failure.
    pub fn validate(&mut self, running: &Mapping, page: &Mapping) -> Result<()> {
        let mut failures = Vec::new();
        let mut fixed = Vec::new();
        for (key, value) in &self.flat {
            let path = Path::parse(key)?;
            let existing = accessor::get(running, &path)
                .filter(|v| !v.is_null())
                .or_else(|| accessor::get(page, &path).filter(|v| !v.is_null()));
            let Some(existing) = existing else {
                failures.push(OverrideFailure::Missing(key.clone()));
                continue;
            };
            if existing.kind() == value.kind() {
                continue;
            }
            tracing::warn!(
                path = %key,
                expected = %existing.kind(),
                found = %value.kind(),
                "override type mismatch, attempting fix"
            );
            match coerce(existing, value) {
                Some(coerced) => fixed.push((key.clone(), path, coerced)),
                None => failures.push(OverrideFailure::Type(key.clone())),
            }
        }

        for (key, path, coerced) in fixed {
            accessor::set(&mut self.nested, &path, coerced.clone())?;
            let _ = self.flat.insert(key, coerced);
        }

        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            tracing::error!(%failure, "override rejected");
        }
        Err(StrataError::OverrideValidation {
            failures: failures.iter().map(ToString::to_string).collect(),
        })
    }

    /// Merges the overrides into `page`, replacing sequences wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::MergeConflict`] if an override mapping meets a
    /// scalar in `page`.
    pub fn apply(&self, page: &mut Mapping) -> Result<()> {
        accessor::merge(self.nested.clone(), page, MergeStrategy::Replace)
    }
}

/// Narrow fix-up for a mismatched override: only `[x,y]` strings against an
/// existing sequence.
fn coerce(existing: &Value, value: &Value) -> Option<Value> {
    let (Value::Sequence(_), Value::String(text)) = (existing, value) else {
        return None;
    };
    let inner = text.strip_prefix('[')?.strip_suffix(']')?;
    Some(Value::Sequence(inner.split(',').map(Value::from).collect()))
}

/// Sniffs a raw override value: bool, integer, float, JSON array/object,
/// then literal string.
#[must_use]
pub fn sniff_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(x) = raw.parse::<f64>() {
        if x.is_finite() {
            return Value::Float(x);
        }
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(raw) {
            return Value::from(json);
        }
    }
    Value::from(raw)
}

const fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// `[<digit>:]<path>=`; the remaining input is the raw value.
fn override_head(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    (
        opt(terminated(digit1, char(':'))),
        terminated(take_while1(is_path_char), char('=')),
    )
        .parse(input)
}
