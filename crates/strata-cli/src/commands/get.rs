//! `strata get`: compile a configuration source and print one value.

use clap::Args;
use strata_core::{Path, accessor};

use super::SourceArgs;
use crate::output::format_value;

/// Arguments for the `get` subcommand.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted path of the value, e.g. `network.orgs[0].name`.
    pub path: String,

    /// Source and compilation flags.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Executes the `get` command.
///
/// # Errors
///
/// Returns an error if compilation fails or nothing exists at the path.
pub fn execute(args: GetArgs) -> anyhow::Result<()> {
    let text = lookup(&args)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{text}");
    }
    Ok(())
}

/// Compiles and formats the value at the requested path.
///
/// # Errors
///
/// Returns an error if compilation fails, the path does not parse, or
/// nothing exists at the path.
pub fn lookup(args: &GetArgs) -> anyhow::Result<String> {
    let (tree, _) = args.source.compile()?;
    let path = Path::parse(&args.path)?;
    let value = accessor::get(&tree, &path)
        .ok_or_else(|| anyhow::anyhow!("no value at `{}`", args.path))?;
    format_value(value)
}
