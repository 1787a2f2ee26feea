//! Nested get/set/remove/merge over a Document Tree.
//!
//! All operations take the root [`Mapping`] and a [`Path`]. Updating a node
//! is always an explicit [`set`] call so no caller ever holds a reference
//! into a tree across a mutation.

use strata_common::error::{Result, StrataError};

use crate::path::{Path, Segment};
use crate::value::{Mapping, Value};

/// How a source sequence combines with an existing destination value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Append source elements to an existing destination sequence.
    #[default]
    Append,
    /// Replace the destination value wholesale.
    Replace,
}

/// Returns the value at `path`, or `None` if any segment is missing or
/// addresses the wrong kind of container.
#[must_use]
pub fn get<'a>(root: &'a Mapping, path: &Path) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let Segment::Key(key) = first else {
        return None;
    };
    let mut current = root.get(key)?;
    for segment in rest {
        current = match (segment, current) {
            (Segment::Key(key), Value::Mapping(map)) => map.get(key)?,
            (Segment::Index(index), Value::Sequence(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Parses `path` and looks it up; unparsable paths are simply absent.
#[must_use]
pub fn lookup<'a>(root: &'a Mapping, path: &str) -> Option<&'a Value> {
    Path::parse(path).ok().and_then(|p| get(root, &p))
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(root: &'a mut Mapping, path: &Path) -> Option<&'a mut Value> {
    let (first, rest) = path.segments().split_first()?;
    let Segment::Key(key) = first else {
        return None;
    };
    let mut current = root.get_mut(key)?;
    for segment in rest {
        current = match (segment, current) {
            (Segment::Key(key), Value::Mapping(map)) => map.get_mut(key)?,
            (Segment::Index(index), Value::Sequence(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`.
///
/// Key segments create intermediate mappings as needed, replacing any
/// non-mapping value in the way. Index segments must address an existing
/// sequence element. The final segment always overwrites.
///
/// # Errors
///
/// Returns [`StrataError::InvalidPath`] for the root path or an index
/// segment that does not address an existing element.
pub fn set(root: &mut Mapping, path: &Path, value: Value) -> Result<()> {
    if path.is_root() {
        return Err(invalid_path(path, "cannot replace the root mapping"));
    }
    let mut tree = Value::Mapping(std::mem::take(root));
    let outcome = set_in(&mut tree, path.segments(), value, path);
    if let Value::Mapping(map) = tree {
        *root = map;
    }
    outcome
}

fn set_in(node: &mut Value, segments: &[Segment], value: Value, path: &Path) -> Result<()> {
    let Some((segment, rest)) = segments.split_first() else {
        *node = value;
        return Ok(());
    };
    let child = match segment {
        Segment::Key(key) => {
            if !matches!(node, Value::Mapping(_)) {
                *node = Value::Mapping(Mapping::new());
            }
            match node {
                Value::Mapping(map) => map.entry(key.clone()).or_insert(Value::Null),
                _ => return Err(invalid_path(path, "expected a mapping")),
            }
        }
        Segment::Index(index) => match node {
            Value::Sequence(items) => {
                let len = items.len();
                items.get_mut(*index).ok_or_else(|| {
                    invalid_path(path, format!("index {index} out of bounds for length {len}"))
                })?
            }
            other => {
                return Err(invalid_path(
                    path,
                    format!("index {index} applied to a {}", other.kind()),
                ));
            }
        },
    };
    set_in(child, rest, value, path)
}

/// Detaches and returns the value at `path`.
pub fn remove(root: &mut Mapping, path: &Path) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;
    if parents.is_empty() {
        return match last {
            Segment::Key(key) => root.shift_remove(key),
            Segment::Index(_) => None,
        };
    }
    let parent = get_mut(root, &Path::from(parents.to_vec()))?;
    match (last, parent) {
        (Segment::Key(key), Value::Mapping(map)) => map.shift_remove(key),
        (Segment::Index(index), Value::Sequence(items)) if *index < items.len() => {
            Some(items.remove(*index))
        }
        _ => None,
    }
}

/// Merges `src` into `dest`, consuming `src`.
///
/// - scalar source values overwrite;
/// - mappings merge recursively into an existing mapping (or a null);
/// - sequences append or replace per `strategy`; under
///   [`MergeStrategy::Append`] a non-sequence destination keeps its value;
/// - keys absent from `dest` are inserted verbatim.
///
/// # Errors
///
/// Returns [`StrataError::MergeConflict`] when a mapping meets an existing
/// non-mapping, non-null destination.
pub fn merge(src: Mapping, dest: &mut Mapping, strategy: MergeStrategy) -> Result<()> {
    let mut at = Path::root();
    merge_mapping(src, dest, strategy, &mut at)
}

fn merge_mapping(
    src: Mapping,
    dest: &mut Mapping,
    strategy: MergeStrategy,
    at: &mut Path,
) -> Result<()> {
    for (key, src_value) in src {
        at.push(Segment::key(key.as_str()));
        let outcome = merge_entry(key, src_value, dest, strategy, at);
        let _ = at.pop();
        outcome?;
    }
    Ok(())
}

fn merge_entry(
    key: String,
    src_value: Value,
    dest: &mut Mapping,
    strategy: MergeStrategy,
    at: &mut Path,
) -> Result<()> {
    let Some(dest_value) = dest.get_mut(&key) else {
        let _ = dest.insert(key, src_value);
        return Ok(());
    };
    match (src_value, dest_value) {
        (Value::Mapping(src_map), Value::Mapping(dest_map)) => {
            merge_mapping(src_map, dest_map, strategy, at)
        }
        (Value::Mapping(src_map), dest_value @ Value::Null) => {
            *dest_value = Value::Mapping(src_map);
            Ok(())
        }
        (Value::Mapping(_), other) => Err(StrataError::MergeConflict {
            path: at.to_dotted(),
            message: format!("cannot merge a mapping into a {}", other.kind()),
        }),
        (Value::Sequence(items), dest_value) => {
            match (strategy, dest_value) {
                (MergeStrategy::Replace, dest_value) => *dest_value = Value::Sequence(items),
                (MergeStrategy::Append, Value::Sequence(existing)) => existing.extend(items),
                (MergeStrategy::Append, other) => {
                    tracing::debug!(
                        path = %at,
                        kind = %other.kind(),
                        "skipping sequence appended onto a non-sequence"
                    );
                }
            }
            Ok(())
        }
        (scalar, dest_value) => {
            *dest_value = scalar;
            Ok(())
        }
    }
}

fn invalid_path(path: &Path, message: impl Into<String>) -> StrataError {
    StrataError::InvalidPath {
        path: path.to_dotted(),
        message: message.into(),
    }
}
