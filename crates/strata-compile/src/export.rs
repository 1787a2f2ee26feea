//! Meta fields and JSON export of a compiled tree.
//!
//! An export is the final tree as pretty JSON. Feeding it back as the prior
//! export of a later run chains compilations.

use strata_common::constants::{META_KEY, META_KEY_OVERRIDES};
use strata_common::error::Result;
use strata_core::accessor::{self, MergeStrategy};
use strata_core::codec::{Codec, JsonCodec, parse_mapping};
use strata_core::overrides::Overrides;
use strata_core::{Mapping, Value};

/// Fields recorded under the top-level `meta` key of an export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaFields {
    fields: Mapping,
}

impl MetaFields {
    /// Creates an empty set of meta fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the override tokens of a run, joined by single spaces.
    #[must_use]
    pub fn from_overrides(overrides: &Overrides) -> Self {
        let mut meta = Self::new();
        meta.put(META_KEY_OVERRIDES, Value::from(overrides.tokens().join(" ")));
        meta
    }

    /// Sets one meta field.
    pub fn put(&mut self, key: &str, value: Value) {
        let _ = self.fields.insert(key.to_string(), value);
    }

    /// The fields, without the `meta` wrapper.
    #[must_use]
    pub const fn fields(&self) -> &Mapping {
        &self.fields
    }

    /// Wraps the fields as `{meta: {...}}`.
    #[must_use]
    pub fn into_mapping(self) -> Mapping {
        let mut root = Mapping::new();
        let _ = root.insert(META_KEY.to_string(), Value::Mapping(self.fields));
        root
    }
}

/// Writes `meta` into `tree`, overwriting same-named meta fields.
///
/// # Errors
///
/// Returns a merge conflict if `tree` holds a non-mapping `meta` value.
pub fn include_meta_fields(tree: &mut Mapping, meta: MetaFields) -> Result<()> {
    accessor::merge(meta.into_mapping(), tree, MergeStrategy::Replace)
}

/// Renders `tree` as four-space-indented JSON.
///
/// # Errors
///
/// Returns a serialization error if the tree cannot be rendered.
pub fn render_exports(tree: &Mapping) -> Result<String> {
    JsonCodec.to_pretty(&Value::Mapping(tree.clone()))
}

/// Parses a previous export back into a tree.
///
/// # Errors
///
/// Returns a source error for malformed JSON or a non-object top level.
pub fn load_prior_export(text: &str) -> Result<Mapping> {
    parse_mapping(&JsonCodec, text)
}
