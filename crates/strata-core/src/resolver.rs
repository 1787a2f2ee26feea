//! Layered `${path}` resolution.
//!
//! A [`LayeredResolver`] holds an ordered list of [`Layer`]s. Resolving a
//! tree runs one pass per layer; each pass substitutes every placeholder the
//! layer defines and leaves the rest intact for the next layer. Only a miss
//! in the last layer can fail, and only when `fail_on_unresolvable` is set.
//!
//! Self-reference is bounded. A placeholder met again while its own value is
//! being expanded is substituted as found, without further expansion. Beyond
//! that, nesting stops after [`MAX_NEST_LEVEL`] levels and nested key-path
//! collapse after [`MAX_NESTED_KEY_PASSES`] passes, keeping whatever was last
//! computed.

use std::borrow::Cow;

use indexmap::IndexSet;
use strata_common::config::CompileConfig;
use strata_common::constants::{MAX_NEST_LEVEL, MAX_NESTED_KEY_PASSES};
use strata_common::error::{Result, StrataError};

use crate::accessor;
use crate::path::{Path, Segment};
use crate::placeholder::{self, contains_placeholder, extract_keys, nested_keys, split_default};
use crate::value::{Mapping, Value, Visitor, walk};

/// Behaviour switches for a [`LayeredResolver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Re-resolve substituted values that carry placeholders themselves.
    pub nested_resolution: bool,
    /// Fail when a placeholder misses in the last layer.
    pub fail_on_unresolvable: bool,
    /// Resolve placeholders appearing in mapping keys.
    pub key_resolution: bool,
}

impl From<&CompileConfig> for ResolverOptions {
    fn from(config: &CompileConfig) -> Self {
        Self {
            nested_resolution: config.nested_resolution,
            fail_on_unresolvable: config.fail_on_unresolvable,
            key_resolution: config.key_resolution,
        }
    }
}

/// A named snapshot of data consulted during resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    data: Mapping,
}

impl Layer {
    /// Creates a layer over an owned snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Mapping) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Layer name, used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Resolves placeholders against an ordered list of layers.
#[derive(Debug, Clone, Default)]
pub struct LayeredResolver {
    layers: Vec<Layer>,
    options: ResolverOptions,
}

impl LayeredResolver {
    /// Creates a resolver with no layers.
    #[must_use]
    pub const fn new(options: ResolverOptions) -> Self {
        Self {
            layers: Vec::new(),
            options,
        }
    }

    /// Appends a layer; earlier layers take precedence.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Drops every layer.
    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    /// Configured layers, in lookup order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Resolves every placeholder in `tree` in place.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Unresolvable`] when `fail_on_unresolvable` is
    /// set and a placeholder misses in the last layer.
    pub fn resolve_all(&self, tree: &mut Mapping) -> Result<()> {
        for pass in self.passes() {
            tracing::debug!(layer = pass.layer.name(), last = pass.is_last, "resolving layer");
            pass.resolve_mapping(tree, &mut Vec::new())?;
        }
        Ok(())
    }

    /// Resolves a lone piece of text against every layer in turn.
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_all`].
    pub fn resolve_scalar(&self, text: &str) -> Result<Value> {
        self.resolve_scalar_within(text, &mut Vec::new())
    }

    /// [`Self::resolve_scalar`] below the placeholders already being expanded.
    fn resolve_scalar_within(&self, text: &str, trail: &mut Vec<String>) -> Result<Value> {
        let mut current = Value::from(text);
        for pass in self.passes() {
            let Value::String(text) = &current else {
                break;
            };
            current = pass.resolve_string(text, trail)?;
        }
        Ok(current)
    }

    fn passes(&self) -> impl Iterator<Item = Pass<'_>> {
        let count = self.layers.len();
        self.layers.iter().enumerate().map(move |(index, layer)| Pass {
            resolver: self,
            layer,
            is_last: index + 1 == count,
        })
    }

    /// Replaces placeholders nested inside other placeholders' text with
    /// their resolved values, defaults included, until the text stops
    /// changing.
    fn collapse_key_paths(&self, text: &str, trail: &mut Vec<String>) -> Result<String> {
        let mut current = text.to_string();
        for _ in 0..MAX_NESTED_KEY_PASSES {
            let nested: IndexSet<String> = nested_keys(&current)
                .into_iter()
                .map(str::to_string)
                .collect();
            if nested.is_empty() {
                break;
            }
            let mut next = current.clone();
            for key in &nested {
                let wrapped = placeholder::wrap(key);
                let value = self.resolve_scalar_within(&wrapped, trail)?;
                if value.as_str() != Some(wrapped.as_str()) {
                    next = next.replace(&wrapped, &value.to_text());
                }
            }
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}

/// One layer's walk over a tree.
///
/// The `trail` threaded through every method lists the placeholder paths
/// being expanded, outermost first. Its length is the nesting depth.
struct Pass<'r> {
    resolver: &'r LayeredResolver,
    layer: &'r Layer,
    is_last: bool,
}

impl Pass<'_> {
    fn resolve_mapping(&self, map: &mut Mapping, trail: &mut Vec<String>) -> Result<()> {
        for value in map.values_mut() {
            self.resolve_value(value, trail)?;
        }
        if self.resolver.options.key_resolution {
            self.resolve_keys(map, trail)?;
        }
        Ok(())
    }

    fn resolve_value(&self, value: &mut Value, trail: &mut Vec<String>) -> Result<()> {
        match value {
            Value::Mapping(map) => self.resolve_mapping(map, trail),
            Value::Sequence(items) => {
                for item in items {
                    self.resolve_value(item, trail)?;
                }
                Ok(())
            }
            Value::String(text) if contains_placeholder(text) => {
                *value = self.resolve_string(text, trail)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Re-inserts entries whose key holds a placeholder under the resolved
    /// key, keeping their position. A resolved key naming an existing
    /// sibling overwrites that sibling's value in its position.
    fn resolve_keys(&self, map: &mut Mapping, trail: &mut Vec<String>) -> Result<()> {
        let keys: Vec<String> = map
            .keys()
            .filter(|key| contains_placeholder(key))
            .cloned()
            .collect();
        for key in keys {
            let resolved = self.resolver.resolve_scalar_within(&key, trail)?.to_text();
            if resolved == key {
                continue;
            }
            let Some((index, _, value)) = map.shift_remove_full(&key) else {
                continue;
            };
            tracing::debug!(from = %key, to = %resolved, "resolved mapping key");
            if map.contains_key(&resolved) {
                tracing::warn!(key = %resolved, "resolved key replaces an existing entry");
                let _ = map.insert(resolved, value);
            } else {
                let _ = map.shift_insert(index, resolved, value);
            }
        }
        Ok(())
    }

    /// Resolves every placeholder in `text`. A text that is exactly one
    /// placeholder takes the native value; otherwise values are coerced to
    /// text and spliced in.
    fn resolve_string(&self, text: &str, trail: &mut Vec<String>) -> Result<Value> {
        let collapsed = self.resolver.collapse_key_paths(text, trail)?;
        let keys: IndexSet<String> = extract_keys(&collapsed)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut current = Value::String(collapsed);
        for key in keys {
            let Value::String(current_text) = &current else {
                break;
            };
            let Some(found) = self.lookup(&key) else {
                if self.resolver.options.fail_on_unresolvable && self.is_last {
                    return Err(StrataError::Unresolvable {
                        placeholder: placeholder::wrap(&key),
                    });
                }
                continue;
            };
            let resolved = self.expand(&key, &found, trail)?;
            let wrapped = placeholder::wrap(&key);
            current = if *current_text == wrapped {
                resolved
            } else {
                Value::String(current_text.replace(&wrapped, &resolved.to_text()))
            };
        }
        Ok(current)
    }

    fn lookup(&self, key: &str) -> Option<Cow<'_, Value>> {
        let (path_text, default) = split_default(key);
        let Ok(path) = Path::parse(path_text) else {
            tracing::debug!(key, "placeholder path does not parse");
            return None;
        };
        match accessor::get(&self.layer.data, &path).filter(|v| !v.is_null()) {
            Some(found) => Some(Cow::Borrowed(found)),
            None if self.is_last => default.map(|d| Cow::Owned(Value::from(d))),
            None => None,
        }
    }

    /// Resolves placeholders carried by the value found for `key`.
    ///
    /// The value comes back as found once the depth bound is reached, or
    /// when `key` is already being expanded further up the trail.
    fn expand(&self, key: &str, found: &Value, trail: &mut Vec<String>) -> Result<Value> {
        let (path_text, _) = split_default(key);
        if trail.len() >= MAX_NEST_LEVEL || trail.iter().any(|open| open == path_text) {
            return Ok(found.clone());
        }
        let resolved = match found {
            Value::String(text)
                if self.resolver.options.nested_resolution && contains_placeholder(text) =>
            {
                trail.push(path_text.to_string());
                let resolved = self.resolve_string(text, trail);
                let _ = trail.pop();
                resolved?
            }
            Value::Sequence(_) | Value::Mapping(_) => {
                let mut copy = found.clone();
                trail.push(path_text.to_string());
                let resolved = self.resolve_value(&mut copy, trail);
                let _ = trail.pop();
                resolved?;
                copy
            }
            other => other.clone(),
        };
        Ok(resolved)
    }
}

/// Replaces every string still holding a placeholder with null.
///
/// Presentation only: run on final output, never between pages.
pub fn null_unresolved(tree: &mut Mapping) {
    for value in tree.values_mut() {
        null_unresolved_value(value);
    }
}

fn null_unresolved_value(value: &mut Value) {
    match value {
        Value::Mapping(map) => null_unresolved(map),
        Value::Sequence(items) => items.iter_mut().for_each(null_unresolved_value),
        Value::String(text) if contains_placeholder(text) => *value = Value::Null,
        _ => {}
    }
}

/// Lists every placeholder still present in `tree`, with the path of the
/// string holding it.
#[must_use]
pub fn unresolved_placeholders(tree: &Mapping) -> Vec<(Path, String)> {
    struct Collect(Vec<(Path, String)>);

    impl Visitor for Collect {
        fn visit_scalar(&mut self, path: &[Segment], value: &Value) {
            if let Value::String(text) = value {
                for key in extract_keys(text) {
                    self.0.push((Path::from(path.to_vec()), placeholder::wrap(key)));
                }
            }
        }
    }

    let mut collect = Collect(Vec::new());
    walk(tree, &mut collect);
    collect.0
}
