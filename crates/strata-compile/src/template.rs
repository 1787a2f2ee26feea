//! Templating seam for pages after the first.
//!
//! A templater sees the running config as bindings and knows nothing of the
//! `${...}` placeholder language, which is resolved separately afterwards.

use minijinja::Environment;
use strata_core::Mapping;

/// Error type returned by templaters.
pub type TemplateError = Box<dyn std::error::Error + Send + Sync>;

/// Renders page text against a bindings tree.
pub trait Templater {
    /// Renders `template` with `bindings` in scope.
    ///
    /// # Errors
    ///
    /// Returns the engine's error when the template is malformed or
    /// rendering fails.
    fn render(&self, template: &str, bindings: &Mapping) -> Result<String, TemplateError>;
}

/// Jinja2-compatible templater backed by `minijinja`.
///
/// Undefined names render as empty text.
#[derive(Debug)]
pub struct JinjaTemplater {
    env: Environment<'static>,
}

impl JinjaTemplater {
    /// Creates a templater with the default environment.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for JinjaTemplater {
    fn default() -> Self {
        Self::new()
    }
}

impl Templater for JinjaTemplater {
    fn render(&self, template: &str, bindings: &Mapping) -> Result<String, TemplateError> {
        Ok(self.env.render_str(template, bindings)?)
    }
}
