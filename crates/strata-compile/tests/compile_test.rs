//! End-to-end compilation tests.
//!
//! Each test runs a full source through the page compiler:
//! 1. Page splitting and templating
//! 2. Override validation and replace-merge
//! 3. Append-merge across pages
//! 4. Relative placeholder normalization and layered resolution
//! 5. Meta fields and export chaining

#![allow(clippy::expect_used, clippy::unwrap_used)]

use strata_common::config::CompileConfig;
use strata_common::error::StrataError;
use strata_compile::export::{MetaFields, include_meta_fields, load_prior_export, render_exports};
use strata_compile::{CompileOptions, PageCompiler};
use strata_core::accessor::lookup;
use strata_core::overrides::Overrides;
use strata_core::{Mapping, Value};

fn compile_with(
    source: &str,
    overrides: &[&str],
    config: CompileConfig,
) -> Result<Mapping, StrataError> {
    let options = CompileOptions {
        sources: vec![source.to_string()],
        overrides: Overrides::parse(overrides)?,
        prior_export: None,
        config,
    };
    PageCompiler::new(options)?.compile()
}

fn compile(source: &str, overrides: &[&str]) -> Mapping {
    compile_with(source, overrides, CompileConfig::default()).expect("compile")
}

fn strings(items: &[&str]) -> Value {
    Value::Sequence(items.iter().copied().map(Value::from).collect())
}

// ── Resolution ───────────────────────────────────────────────────────

#[test]
fn relative_references_resolve_against_running_config() {
    let out = compile(
        "b:\n  c: Hello\nc: World\na1: ${../b/c}\na2:\n  b: ${../../c}\n",
        &[],
    );
    assert_eq!(lookup(&out, "a1"), Some(&Value::from("Hello")));
    assert_eq!(lookup(&out, "a2.b"), Some(&Value::from("World")));
}

#[test]
fn implicit_local_reads_a_sibling() {
    let out = compile("svc:\n  host: db\n  port: 5432\n  url: \"${host}:${port}\"\n", &[]);
    assert_eq!(lookup(&out, "svc.url"), Some(&Value::from("db:5432")));
}

#[test]
fn forward_reference_resolves_once_the_later_page_merges() {
    let source = "greeting: ${/name}\n---\nname: world\n";
    let mut compiler = PageCompiler::new(CompileOptions {
        sources: vec![source.to_string()],
        overrides: Overrides::default(),
        prior_export: None,
        config: CompileConfig::default(),
    })
    .expect("compiler");

    // seed, split, page 0
    for _ in 0..3 {
        let _ = compiler.step().expect("step");
    }
    assert_eq!(
        lookup(compiler.running_config(), "greeting"),
        Some(&Value::from("${/name}"))
    );

    let out = compiler.compile().expect("compile");
    assert_eq!(lookup(&out, "greeting"), Some(&Value::from("world")));
}

#[test]
fn later_pages_template_against_the_running_config() {
    let out = compile(
        "env: prod\nreplicas: 3\n---\nname: \"app-{{ env }}\"\n{% for i in range(replicas) %}\nnode{{ i }}: n\n{% endfor %}\n",
        &[],
    );
    assert_eq!(lookup(&out, "name"), Some(&Value::from("app-prod")));
    assert_eq!(lookup(&out, "node0"), Some(&Value::from("n")));
    assert_eq!(lookup(&out, "node2"), Some(&Value::from("n")));
    assert_eq!(lookup(&out, "node3"), None);
}

#[test]
fn defaults_fill_missing_paths() {
    let out = compile(
        "real: here\na: ${/missing.path:-fallback}\nb: ${/real:-fallback}\n",
        &[],
    );
    assert_eq!(lookup(&out, "a"), Some(&Value::from("fallback")));
    assert_eq!(lookup(&out, "b"), Some(&Value::from("here")));
}

#[test]
fn nested_key_path_falls_back_to_its_default() {
    let out = compile(
        "hosts:\n  dev: d.example\n  prod: p.example\nhost: ${/hosts.${/env:-dev}}\n",
        &[],
    );
    assert_eq!(lookup(&out, "host"), Some(&Value::from("d.example")));
}

#[test]
fn unresolved_placeholders_survive_unless_nulled() {
    let source = "a: ${/nowhere}\nb: \"x-${/nowhere}\"\n";
    let out = compile(source, &[]);
    assert_eq!(lookup(&out, "a"), Some(&Value::from("${/nowhere}")));

    let config = CompileConfig {
        null_unresolved: true,
        ..CompileConfig::default()
    };
    let out = compile_with(source, &[], config).expect("compile");
    assert_eq!(lookup(&out, "a"), Some(&Value::Null));
    assert_eq!(lookup(&out, "b"), Some(&Value::Null));
}

#[test]
fn fail_on_unresolvable_aborts() {
    let config = CompileConfig {
        fail_on_unresolvable: true,
        ..CompileConfig::default()
    };
    let err = compile_with("a: ${/nowhere}\n", &[], config).expect_err("unresolvable");
    assert!(err.to_string().contains("${/nowhere}"), "{err}");
}

#[test]
fn strict_mode_rejects_forward_references() {
    // The forward reference misses on page 0, so a strict run fails there.
    let config = CompileConfig {
        fail_on_unresolvable: true,
        ..CompileConfig::default()
    };
    let result = compile_with("a: ${/later}\n---\nlater: 1\n", &[], config);
    assert!(matches!(result, Err(StrataError::Unresolvable { .. })));
}

// ── Merging ──────────────────────────────────────────────────────────

#[test]
fn pages_append_sequences_and_overwrite_scalars() {
    let out = compile("list: [1, 2]\nname: first\n---\nlist: [3]\nname: second\n", &[]);
    assert_eq!(
        lookup(&out, "list"),
        Some(&Value::Sequence(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3)
        ]))
    );
    assert_eq!(lookup(&out, "name"), Some(&Value::from("second")));
}

#[test]
fn mapping_over_scalar_is_a_merge_conflict() {
    let err = compile_with("a: 1\n---\na:\n  b: 2\n", &[], CompileConfig::default())
        .expect_err("conflict");
    assert!(matches!(err, StrataError::MergeConflict { .. }), "{err:?}");
}

// ── Overrides ────────────────────────────────────────────────────────

#[test]
fn override_replaces_page_zero_value() {
    let out = compile("db:\n  port: 5432\nurl: \"db:${/db.port}\"\n", &["db.port=6543"]);
    assert_eq!(lookup(&out, "db.port"), Some(&Value::Integer(6543)));
    assert_eq!(lookup(&out, "url"), Some(&Value::from("db:6543")));
}

#[test]
fn bracket_override_replaces_sequence() {
    let out = compile("list:\n  - A\n", &["list=[B,C]"]);
    assert_eq!(lookup(&out, "list"), Some(&strings(&["B", "C"])));
}

#[test]
fn override_failures_are_reported_together() {
    let err = compile_with(
        "existing:\n  int: 1\n",
        &["missing.key1=a", "existing.int=abc"],
        CompileConfig::default(),
    )
    .expect_err("invalid overrides");
    let msg = err.to_string();
    assert!(msg.contains("(missing) missing.key1"), "{msg}");
    assert!(msg.contains("(type) existing.int"), "{msg}");
}

#[test]
fn overrides_only_apply_to_page_zero() {
    let err = compile_with("a: 1\n---\nlater: 1\n", &["later=2"], CompileConfig::default())
        .expect_err("later is not on page 0");
    assert!(err.to_string().contains("(missing) later"), "{err}");
}

#[test]
fn page_qualified_override_is_unsupported() {
    let err = compile_with("a: 1\n", &["0:a=2"], CompileConfig::default()).expect_err("unsupported");
    assert!(matches!(err, StrataError::Unsupported { .. }));
}

// ── Export chaining ──────────────────────────────────────────────────

#[test]
fn exported_tree_seeds_a_chained_run() {
    let overrides = ["port=81"];
    let mut first = compile("port: 80\nhost: web\n", &overrides);
    include_meta_fields(
        &mut first,
        MetaFields::from_overrides(&Overrides::parse(overrides).expect("parse")),
    )
    .expect("meta");
    let exported = render_exports(&first).expect("export");

    let second = PageCompiler::new(CompileOptions {
        sources: vec!["url: \"${/host}:${/port}\"\n".to_string()],
        overrides: Overrides::parse(["port=82"]).expect("parse"),
        prior_export: Some(load_prior_export(&exported).expect("load")),
        config: CompileConfig::default(),
    })
    .expect("compiler")
    .compile()
    .expect("compile");

    assert_eq!(lookup(&second, "meta.overrides"), Some(&Value::from("port=81")));
    assert_eq!(lookup(&second, "port"), Some(&Value::Integer(82)));
    assert_eq!(lookup(&second, "url"), Some(&Value::from("web:82")));
}
