//! CLI command definitions and dispatch.

pub mod compile;
pub mod get;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use strata_common::config::CompileConfig;
use strata_common::error::StrataError;
use strata_compile::export::load_prior_export;
use strata_compile::{CompileOptions, PageCompiler};
use strata_core::Mapping;
use strata_core::overrides::Overrides;

/// Compile layered configuration pages into one resolved tree.
#[derive(Parser, Debug)]
#[command(name = strata_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "STRATA_LOG_JSON")]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a configuration source and export the result as JSON.
    Compile(compile::CompileArgs),
    /// Compile a configuration source and print the value at one path.
    Get(get::GetArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Compile(args) => compile::execute(args),
        Command::Get(args) => get::execute(args),
    }
}

/// Source and compilation flags shared by every compiling command.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Configuration source file. Only one is supported.
    #[arg(short = 'c', long = "configs", num_args = 1.., required = true)]
    pub configs: Vec<PathBuf>,

    /// Overrides for page 0, as `path=value` (space-separated tokens).
    #[arg(short = 'o', long = "overrides", num_args = 1..)]
    pub overrides: Vec<String>,

    /// Previously exported JSON seeding the compilation.
    #[arg(short = 'j', long = "vars-json", env = "STRATA_VARS_JSON")]
    pub vars_json: Option<PathBuf>,

    /// Fail when a placeholder cannot be resolved.
    #[arg(long, env = "STRATA_FAIL_ON_UNRESOLVABLE")]
    pub fail_on_unresolvable: bool,

    /// Replace values still holding placeholders with null in the output.
    #[arg(long, env = "STRATA_NULL_UNRESOLVED")]
    pub null_unresolved: bool,

    /// Resolve placeholders appearing in mapping keys.
    #[arg(long, env = "STRATA_KEY_RESOLUTION")]
    pub key_resolution: bool,

    /// Substitute placeholder values one level deep only.
    #[arg(long)]
    pub no_nested_resolution: bool,
}

impl SourceArgs {
    /// Compilation switches selected by the flags.
    #[must_use]
    pub fn config(&self) -> CompileConfig {
        CompileConfig {
            fail_on_unresolvable: self.fail_on_unresolvable,
            nested_resolution: !self.no_nested_resolution,
            key_resolution: self.key_resolution,
            null_unresolved: self.null_unresolved,
            ..CompileConfig::default()
        }
    }

    /// Override tokens, with quoted multi-token arguments split on whitespace.
    #[must_use]
    pub fn override_tokens(&self) -> Vec<String> {
        self.overrides
            .iter()
            .flat_map(|arg| arg.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    /// Reads the sources and prior export, then compiles.
    ///
    /// Returns the final tree and the parsed overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or compilation fails.
    pub fn compile(&self) -> anyhow::Result<(Mapping, Overrides)> {
        let sources = self
            .configs
            .iter()
            .map(|path| read_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        let prior_export = match &self.vars_json {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading prior export");
                Some(load_prior_export(&read_file(path)?)?)
            }
            None => None,
        };
        let overrides = Overrides::parse(self.override_tokens())?;

        let options = CompileOptions {
            sources,
            overrides: overrides.clone(),
            prior_export,
            config: self.config(),
        };
        let tree = PageCompiler::new(options)?.compile()?;
        Ok((tree, overrides))
    }
}

fn read_file(path: &Path) -> Result<String, StrataError> {
    std::fs::read_to_string(path).map_err(|source| StrataError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_compile_flags() {
        let cli = Cli::try_parse_from([
            "strata",
            "compile",
            "-c",
            "site.yaml",
            "-o",
            "a=1",
            "b.c=two",
            "--fail-on-unresolvable",
            "-e",
            "out.json",
        ])
        .expect("parse");
        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.source.configs, vec![PathBuf::from("site.yaml")]);
        assert_eq!(args.source.override_tokens(), vec!["a=1", "b.c=two"]);
        assert!(args.source.config().fail_on_unresolvable);
        assert!(args.source.config().nested_resolution);
        assert_eq!(args.exports, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn quoted_override_list_is_split() {
        let args = SourceArgs {
            overrides: vec!["a=1 b=2".into(), "c=3".into()],
            ..SourceArgs::default()
        };
        assert_eq!(args.override_tokens(), vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn configs_are_required() {
        assert!(Cli::try_parse_from(["strata", "compile"]).is_err());
    }

    #[test]
    fn get_takes_a_path() {
        let cli = Cli::try_parse_from(["strata", "get", "a.b", "-c", "site.yaml"]).expect("parse");
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.path, "a.b");
    }

    #[test]
    fn missing_source_file_is_io_error() {
        let args = SourceArgs {
            configs: vec![PathBuf::from("/definitely/not/here.yaml")],
            ..SourceArgs::default()
        };
        let err = args.compile().expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here.yaml"), "{err}");
    }
}
