//! # strata-compile
//!
//! Turns a multi-page configuration source into one resolved tree.
//!
//! Handles:
//! - **Source**: splitting source text into pages.
//! - **Template**: the templating seam applied to every page after the first.
//! - **Compiler**: the page-by-page state machine that parses, injects
//!   overrides, merges and resolves.
//! - **Export**: meta fields and JSON export of the final tree.

pub mod compiler;
pub mod export;
pub mod source;
pub mod template;

pub use compiler::{CompileOptions, CompileState, PageCompiler};
