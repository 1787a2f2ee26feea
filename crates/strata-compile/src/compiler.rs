//! The page compiler.
//!
//! Compilation is a small state machine:
//!
//! ```text
//! SeedFromPriorExport -> SplitPages -> RenderPage* -> Done
//! ```
//!
//! Each `RenderPage` step consumes one page: template it (pages after the
//! first), parse it, inject overrides (first page only), merge it into the
//! running config, then normalize and resolve the running config against a
//! fresh snapshot of itself. Resolving after every page is what lets a
//! placeholder on an early page see keys defined on a later one.

use std::collections::VecDeque;

use strata_common::config::CompileConfig;
use strata_common::error::{Result, StrataError};
use strata_core::accessor::{self, MergeStrategy};
use strata_core::codec::{Codec, YamlCodec, parse_mapping};
use strata_core::normalizer::normalize;
use strata_core::overrides::Overrides;
use strata_core::resolver::{
    Layer, LayeredResolver, ResolverOptions, null_unresolved, unresolved_placeholders,
};
use strata_core::Mapping;

use crate::source::{Page, split_pages};
use crate::template::{JinjaTemplater, Templater};

/// Everything a compilation needs. All fields are mandatory.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Configuration source texts. Exactly one is supported.
    pub sources: Vec<String>,
    /// Parsed overrides for page 0.
    pub overrides: Overrides,
    /// A previously exported tree seeding the running config.
    pub prior_export: Option<Mapping>,
    /// Compilation switches.
    pub config: CompileConfig,
}

/// Where a [`PageCompiler`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    /// Merging the prior export, if any, into the running config.
    SeedFromPriorExport,
    /// Splitting the source into pages.
    SplitPages,
    /// Rendering pages one at a time.
    RenderPage,
    /// All pages rendered; the running config is final.
    Done,
}

/// Compiles one configuration source into a resolved tree.
///
/// The templater and codec are pluggable; [`PageCompiler::new`] uses
/// minijinja and YAML.
pub struct PageCompiler<T: Templater = JinjaTemplater, C: Codec = YamlCodec> {
    state: CompileState,
    source: String,
    overrides: Overrides,
    prior_export: Option<Mapping>,
    config: CompileConfig,
    pages: VecDeque<Page>,
    running: Mapping,
    resolver: LayeredResolver,
    templater: T,
    codec: C,
    span: tracing::Span,
}

impl PageCompiler {
    /// Creates a compiler with the default templater and codec.
    ///
    /// # Errors
    ///
    /// See [`PageCompiler::with_collaborators`].
    pub fn new(options: CompileOptions) -> Result<Self> {
        Self::with_collaborators(options, JinjaTemplater::new(), YamlCodec)
    }
}

impl<T: Templater, C: Codec> PageCompiler<T, C> {
    /// Creates a compiler with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Source`] when no source is given and
    /// [`StrataError::Unsupported`] when more than one is.
    pub fn with_collaborators(options: CompileOptions, templater: T, codec: C) -> Result<Self> {
        let CompileOptions {
            sources,
            overrides,
            prior_export,
            config,
        } = options;
        let count = sources.len();
        let mut sources = sources.into_iter();
        let source = match (sources.next(), count) {
            (Some(source), 1) => source,
            (None, _) => {
                return Err(StrataError::Source {
                    page: None,
                    message: "no configuration source given".into(),
                });
            }
            (Some(_), n) => {
                return Err(StrataError::Unsupported {
                    feature: format!("multiple configuration sources ({n} given)"),
                });
            }
        };

        Ok(Self {
            state: CompileState::SeedFromPriorExport,
            source,
            overrides,
            prior_export,
            resolver: LayeredResolver::new(ResolverOptions::from(&config)),
            config,
            pages: VecDeque::new(),
            running: Mapping::new(),
            templater,
            codec,
            span: tracing::info_span!("compile", pages = tracing::field::Empty),
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> CompileState {
        self.state
    }

    /// The running config as accumulated so far.
    #[must_use]
    pub const fn running_config(&self) -> &Mapping {
        &self.running
    }

    /// Pages not yet rendered.
    #[must_use]
    pub fn remaining_pages(&self) -> usize {
        self.pages.len()
    }

    /// Advances one state. Stepping in [`CompileState::Done`] does nothing.
    ///
    /// # Errors
    ///
    /// Any failure aborts the compilation: malformed pages, template
    /// errors, override validation, merge conflicts, and unresolvable
    /// placeholders when `fail_on_unresolvable` is set.
    pub fn step(&mut self) -> Result<CompileState> {
        let span = self.span.clone();
        let _entered = span.enter();

        match self.state {
            CompileState::SeedFromPriorExport => {
                if let Some(prior) = self.prior_export.take() {
                    tracing::info!(keys = prior.len(), "seeding from prior export");
                    accessor::merge(prior, &mut self.running, MergeStrategy::Append)?;
                }
                self.state = CompileState::SplitPages;
            }
            CompileState::SplitPages => {
                self.pages = split_pages(&self.source, &self.config.page_separator).into();
                let _ = span.record("pages", self.pages.len());
                tracing::debug!(pages = self.pages.len(), "source split");
                if self.pages.is_empty() {
                    self.finish();
                } else {
                    self.state = CompileState::RenderPage;
                }
            }
            CompileState::RenderPage => {
                if let Some(page) = self.pages.pop_front() {
                    self.render_page(&page)?;
                }
                if self.pages.is_empty() {
                    self.finish();
                }
            }
            CompileState::Done => {}
        }
        Ok(self.state)
    }

    /// Runs to completion and hands over the final tree.
    ///
    /// # Errors
    ///
    /// See [`PageCompiler::step`].
    pub fn compile(mut self) -> Result<Mapping> {
        while self.step()? != CompileState::Done {}
        Ok(self.running)
    }

    fn render_page(&mut self, page: &Page) -> Result<()> {
        let index = page.index;
        let text = if index == 0 {
            page.text()
        } else {
            self.templater
                .render(&page.text(), &self.running)
                .map_err(|e| StrataError::Template {
                    page: index,
                    message: e.to_string(),
                })?
        };

        let mut tree = parse_mapping(&self.codec, &text).map_err(|e| on_page(e, index))?;

        if index == 0 && !self.overrides.is_empty() {
            self.overrides.validate(&self.running, &tree)?;
            self.overrides.apply(&mut tree)?;
            tracing::info!(count = self.overrides.flat().len(), "overrides applied");
        }

        accessor::merge(tree, &mut self.running, MergeStrategy::Append)?;
        let rewritten = normalize(&mut self.running)?;

        self.resolver.clear_layers();
        self.resolver
            .add_layer(Layer::new("running config", self.running.clone()));
        self.resolver.resolve_all(&mut self.running)?;

        tracing::info!(page = index, rewritten, keys = self.running.len(), "page rendered");
        Ok(())
    }

    fn finish(&mut self) {
        for (path, placeholder) in unresolved_placeholders(&self.running) {
            tracing::warn!(%path, %placeholder, "placeholder left unresolved");
        }
        if self.config.null_unresolved {
            null_unresolved(&mut self.running);
        }
        self.state = CompileState::Done;
    }
}

/// Attaches a page index to source errors raised while parsing that page.
fn on_page(err: StrataError, index: usize) -> StrataError {
    match err {
        StrataError::Source { page: None, message } => StrataError::Source {
            page: Some(index),
            message,
        },
        other => other,
    }
}
