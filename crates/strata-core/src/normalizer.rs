//! Rewriting of relative and implicit-local placeholders to root form.
//!
//! For a string leaf at `/a/b/leaf` the *container* is `/a/b`:
//!
//! | written          | rewritten          |
//! |------------------|--------------------|
//! | `${name}`        | `${/a/b/name}`     |
//! | `${../name}`     | `${/a/name}`       |
//! | `${../../name}`  | `${/name}`         |
//! | `${/x/y}`        | unchanged          |
//!
//! Extra `../` steps stop at the root. After normalization every
//! placeholder is root-addressed, so the resolver can look all of them up
//! the same way.

use strata_common::constants::{PARENT_STEP, PLACEHOLDER_PREFIX, PLACEHOLDER_SUFFIX};
use strata_common::error::Result;

use crate::accessor;
use crate::path::{Path, Segment};
use crate::value::{Mapping, Value, Visitor, walk};

/// Rewrites every relative or implicit-local placeholder in `tree` to its
/// root-addressed form. Returns the number of leaves rewritten.
///
/// Leaves are collected first and written back by path, so the walk never
/// observes its own edits.
///
/// # Errors
///
/// Propagates [`accessor::set`] failures, which only occur if the tree
/// changes shape between collection and write-back.
pub fn normalize(tree: &mut Mapping) -> Result<usize> {
    let mut collect = Rewrites(Vec::new());
    walk(tree, &mut collect);
    let count = collect.0.len();
    for (path, text) in collect.0 {
        tracing::trace!(path = %path, rewritten = %text, "normalized placeholder");
        accessor::set(tree, &path, Value::String(text))?;
    }
    Ok(count)
}

struct Rewrites(Vec<(Path, String)>);

impl Visitor for Rewrites {
    fn visit_scalar(&mut self, path: &[Segment], value: &Value) {
        let Value::String(text) = value else {
            return;
        };
        let Some((_, parents)) = path.split_last() else {
            return;
        };
        if let Some(rewritten) = rewrite(text, &Path::from(parents.to_vec())) {
            self.0.push((Path::from(path.to_vec()), rewritten));
        }
    }
}

/// Rewrites the placeholders of one leaf whose container is `container`.
/// Returns `None` when nothing changes.
fn rewrite(text: &str, container: &Path) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    let mut changed = false;
    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        let (head, tail) = rest.split_at(start + PLACEHOLDER_PREFIX.len());
        out.push_str(head);
        rest = tail;
        if rest.starts_with('/') || rest.starts_with(PLACEHOLDER_SUFFIX) || !is_closed(rest) {
            continue;
        }
        let mut steps = 0;
        while let Some(stripped) = rest.strip_prefix(PARENT_STEP) {
            steps += 1;
            rest = stripped;
        }
        out.push_str(&root_prefix(&container.ancestor(steps)));
        changed = true;
    }
    out.push_str(rest);
    changed.then_some(out)
}

/// Returns `true` if the `${` just before `rest` has a matching `}`.
fn is_closed(rest: &str) -> bool {
    let mut depth = 1_usize;
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                let _ = chars.next();
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// `/` for the root, `/a/b/` otherwise.
fn root_prefix(base: &Path) -> String {
    if base.is_root() {
        "/".to_string()
    } else {
        format!("{base}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Layer, LayeredResolver, ResolverOptions};

    fn tree(yaml: &str) -> Mapping {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("yaml");
        match Value::from(value) {
            Value::Mapping(map) => map,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    fn container(text: &str) -> Path {
        Path::parse(text).expect("path")
    }

    #[test]
    fn implicit_local_is_anchored_at_container() {
        assert_eq!(rewrite("${name}", &container("a.b")).as_deref(), Some("${/a/b/name}"));
        assert_eq!(rewrite("${name}", &Path::root()).as_deref(), Some("${/name}"));
    }

    #[test]
    fn parent_steps_strip_container_segments() {
        let c = container("a.b");
        assert_eq!(rewrite("${../name}", &c).as_deref(), Some("${/a/name}"));
        assert_eq!(rewrite("${../../name}", &c).as_deref(), Some("${/name}"));
        assert_eq!(rewrite("${../../../../name}", &c).as_deref(), Some("${/name}"));
    }

    #[test]
    fn absolute_and_plain_text_untouched() {
        let c = container("a");
        assert_eq!(rewrite("${/x/y}", &c), None);
        assert_eq!(rewrite("no placeholders", &c), None);
        assert_eq!(rewrite("dangling ${", &c), None);
        assert_eq!(rewrite("${}", &c), None);
    }

    #[test]
    fn unclosed_openers_are_not_placeholders() {
        let c = container("a");
        assert_eq!(rewrite("x ${abc", &c), None);
        assert_eq!(rewrite("${b ${c}", &c).as_deref(), Some("${b ${/a/c}"));
        assert_eq!(rewrite("${b} ${c", &c).as_deref(), Some("${/a/b} ${c"));
    }

    #[test]
    fn rewrites_every_occurrence_and_keeps_defaults() {
        let c = container("svc");
        assert_eq!(
            rewrite("${host}:${../port:-80}/${/abs}", &c).as_deref(),
            Some("${/svc/host}:${/port:-80}/${/abs}")
        );
    }

    #[test]
    fn nested_placeholders_are_each_anchored() {
        assert_eq!(
            rewrite("${hosts.${env}}", &container("a")).as_deref(),
            Some("${/a/hosts.${/a/env}}")
        );
    }

    #[test]
    fn sequence_elements_use_the_sequence_as_container() {
        let mut t = tree("list:\n  - ${x}\n  - ${../x}\n");
        assert_eq!(normalize(&mut t).expect("normalize"), 2);
        assert_eq!(accessor::lookup(&t, "list[0]"), Some(&Value::from("${/list/x}")));
        assert_eq!(accessor::lookup(&t, "list[1]"), Some(&Value::from("${/x}")));
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut t = tree("a:\n  b: ${c}\n  d: ${../e}\n");
        assert_eq!(normalize(&mut t).expect("normalize"), 2);
        let once = t.clone();
        assert_eq!(normalize(&mut t).expect("normalize"), 0);
        assert_eq!(t, once);
    }

    #[test]
    fn relative_references_resolve_from_their_location() {
        let mut t = tree("a1: ${../b/c}\na2:\n  b: ${../../c}\n");
        let bindings = tree("b:\n  c: Hello\nc: World\n");
        let _ = normalize(&mut t).expect("normalize");
        let mut resolver = LayeredResolver::new(ResolverOptions::default());
        resolver.add_layer(Layer::new("bindings", bindings));
        resolver.resolve_all(&mut t).expect("resolve");
        assert_eq!(accessor::lookup(&t, "a1"), Some(&Value::from("Hello")));
        assert_eq!(accessor::lookup(&t, "a2.b"), Some(&Value::from("World")));
    }
}
