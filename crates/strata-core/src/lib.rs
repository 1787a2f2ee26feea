//! # strata-core
//!
//! The engine behind page compilation:
//! - **Value**: the Document Tree, an explicit tagged variant with ordered mappings.
//! - **Path / Accessor**: nested get/set/remove/merge over the tree.
//! - **Placeholder**: scanning of the `${...}` micro-language.
//! - **Resolver**: layered `${path}` resolution with defaults and bounded nesting.
//! - **Normalizer**: rewriting of relative and implicit-local placeholders to root form.
//! - **Overrides**: parsing, validation, and replace-merge of `path=value` tokens.
//! - **Codec**: structured text to tree and back (YAML for pages, JSON for exports).

pub mod accessor;
pub mod codec;
pub mod normalizer;
pub mod overrides;
pub mod path;
pub mod placeholder;
pub mod resolver;
pub mod value;

pub use accessor::MergeStrategy;
pub use path::{Path, Segment};
pub use value::{Kind, Mapping, Value};
