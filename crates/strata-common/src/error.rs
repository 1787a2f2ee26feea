//! Unified error types for the strata workspace.
//!
//! Every fatal condition of a compilation maps onto one [`StrataError`]
//! variant so callers can report the failing path and category.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StrataError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration source is unreadable or malformed.
    #[error("malformed source{}: {message}", .page.map_or_else(String::new, |p| format!(" (page {p})")))]
    Source {
        /// Page the failure occurred on, if known.
        page: Option<usize>,
        /// Description of the problem.
        message: String,
    },

    /// The templating engine rejected a page.
    #[error("template error on page {page}: {message}")]
    Template {
        /// Page being templated.
        page: usize,
        /// Engine-provided description.
        message: String,
    },

    /// Two trees could not be merged because their shapes disagree.
    #[error("cannot merge at {path}: {message}")]
    MergeConflict {
        /// Path of the conflicting node.
        path: String,
        /// Description of the conflicting shapes.
        message: String,
    },

    /// A placeholder missed in the last resolution layer.
    #[error("unresolvable placeholder `{placeholder}`")]
    Unresolvable {
        /// Placeholder path text.
        placeholder: String,
    },

    /// An override token does not follow `[<page>:]<path>=<value>`.
    #[error("malformed override `{token}`")]
    OverrideSyntax {
        /// The offending token.
        token: String,
    },

    /// One or more overrides failed validation.
    #[error("failed during override checking: [{}]", .failures.join(", "))]
    OverrideValidation {
        /// Tagged failures, e.g. `(missing) a.b`.
        failures: Vec<String>,
    },

    /// A feature that is recognised but deliberately not supported.
    #[error("unsupported: {feature}")]
    Unsupported {
        /// Description of the rejected feature.
        feature: String,
    },

    /// A path could not be parsed or does not address a settable node.
    #[error("invalid path `{path}`: {message}")]
    InvalidPath {
        /// Offending path text.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StrataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_validation_lists_every_failure() {
        let err = StrataError::OverrideValidation {
            failures: vec!["(missing) missing.key1".into(), "(type) existing.int".into()],
        };
        assert_eq!(
            err.to_string(),
            "failed during override checking: [(missing) missing.key1, (type) existing.int]"
        );
    }

    #[test]
    fn source_error_mentions_page_when_known() {
        let err = StrataError::Source {
            page: Some(2),
            message: "bad indent".into(),
        };
        assert_eq!(err.to_string(), "malformed source (page 2): bad indent");

        let err = StrataError::Source {
            page: None,
            message: "empty".into(),
        };
        assert_eq!(err.to_string(), "malformed source: empty");
    }
}
