//! Formatted output helpers for CLI commands.

use strata_core::Value;
use strata_core::codec::{Codec, JsonCodec};

/// Formats a value for the terminal: strings raw, other scalars in their
/// text form, composites as pretty JSON.
///
/// # Errors
///
/// Returns an error if a composite cannot be serialized.
pub fn format_value(value: &Value) -> anyhow::Result<String> {
    if value.is_composite() {
        Ok(JsonCodec.to_pretty(value)?)
    } else {
        Ok(value.to_text())
    }
}
