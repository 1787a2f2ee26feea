//! Workspace-wide constants.

/// Literal line separating two pages of a configuration source.
pub const PAGE_SEPARATOR: &str = "---";

/// Prefix marking a comment line in a configuration source.
pub const COMMENT_PREFIX: &str = "#";

/// Opening delimiter of a placeholder.
pub const PLACEHOLDER_PREFIX: &str = "${";

/// Closing delimiter of a placeholder.
pub const PLACEHOLDER_SUFFIX: &str = "}";

/// Separator between a placeholder path and its fallback literal.
pub const DEFAULT_SEPARATOR: &str = ":-";

/// Relative step one level up in a placeholder path.
pub const PARENT_STEP: &str = "../";

/// Maximum depth of nested value resolution (a value resolving to
/// another placeholder-bearing value).
pub const MAX_NEST_LEVEL: usize = 10;

/// Maximum passes spent collapsing placeholders nested inside another
/// placeholder's path text (`${a.${b}}`).
pub const MAX_NESTED_KEY_PASSES: usize = 10;

/// Top-level key holding meta fields in an exported config.
pub const META_KEY: &str = "meta";

/// Meta field recording the override tokens of a compilation.
pub const META_KEY_OVERRIDES: &str = "overrides";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "strata";
