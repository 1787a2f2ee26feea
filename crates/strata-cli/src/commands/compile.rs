//! `strata compile`: compile a configuration source and export it as JSON.

use std::path::{Path, PathBuf};

use clap::Args;
use strata_common::error::StrataError;
use strata_compile::export::{MetaFields, include_meta_fields, render_exports};

use super::SourceArgs;

/// Arguments for the `compile` subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Source and compilation flags.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the exported JSON to a file instead of stdout.
    #[arg(short = 'e', long = "exports", env = "STRATA_EXPORTS")]
    pub exports: Option<PathBuf>,
}

/// Executes the `compile` command.
///
/// # Errors
///
/// Returns an error if reading, compiling, or writing the export fails.
pub fn execute(args: CompileArgs) -> anyhow::Result<()> {
    let rendered = render(&args)?;
    if let Some(ref path) = args.exports {
        write_exports(path, &rendered)?;
        tracing::info!(path = %path.display(), "exports written");
    } else {
        #[allow(clippy::print_stdout)]
        {
            println!("{rendered}");
        }
    }
    Ok(())
}

/// Compiles the source, stamps meta fields and renders the export.
///
/// # Errors
///
/// Returns an error if reading or compiling fails.
pub fn render(args: &CompileArgs) -> anyhow::Result<String> {
    let (mut tree, overrides) = args.source.compile()?;
    include_meta_fields(&mut tree, MetaFields::from_overrides(&overrides))?;
    Ok(render_exports(&tree)?)
}

fn write_exports(path: &Path, rendered: &str) -> Result<(), StrataError> {
    std::fs::write(path, format!("{rendered}\n")).map_err(|source| StrataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
