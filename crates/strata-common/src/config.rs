//! Compilation settings shared by the compiler and the CLI.

use serde::{Deserialize, Serialize};

/// Knobs controlling how a configuration source is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Fail when a placeholder misses in the last resolution layer.
    pub fail_on_unresolvable: bool,
    /// Re-resolve resolved values that themselves carry placeholders.
    pub nested_resolution: bool,
    /// Resolve placeholders appearing in mapping keys.
    pub key_resolution: bool,
    /// Replace values still holding placeholders with null in the final output.
    pub null_unresolved: bool,
    /// Literal line separating pages.
    pub page_separator: String,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            fail_on_unresolvable: false,
            nested_resolution: true,
            key_resolution: false,
            null_unresolved: false,
            page_separator: crate::constants::PAGE_SEPARATOR.to_string(),
        }
    }
}
