//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Context for rendering the explore and synthesis system prompts
#[derive(Debug, Clone, Serialize)]
pub struct FingerprintContext {
    /// Pretty-printed fingerprint JSON
    pub fingerprint: String,
}

impl FingerprintContext {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
        }
    }
}

/// Context for rendering the planning system prompt
#[derive(Debug, Clone, Serialize)]
pub struct PlanContext {
    /// The user's query, verbatim
    pub query: String,
    /// Pretty-printed fingerprint JSON
    pub fingerprint: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (`.codescout/prompts/` in the explored repo)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at the explored codebase
    ///
    /// Overrides live in `.codescout/prompts/` under the repo root. A bare
    /// `prompts/` directory in an explored repo is that repo's own content,
    /// so only the dotted directory participates in the chain.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".codescout/prompts");

        Self {
            hbs: Handlebars::new(),
            user_dir: if user_dir.exists() { Some(user_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self {
            hbs: Handlebars::new(),
            user_dir: None,
        }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.codescout/prompts/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!("Loading prompt from user override: {:?}", path);
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!("Using embedded prompt: {}", name);
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        debug!(%template_name, "PromptLoader::render: rendering template");

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_explore_substitutes_fingerprint() {
        let loader = PromptLoader::embedded_only();
        let ctx = FingerprintContext::new("{\"name\": \"myrepo\", \"total_files\": 42}");

        let rendered = loader.render("explore", &ctx).unwrap();
        assert!(rendered.contains("\"total_files\": 42"));
        assert!(!rendered.contains("{{{fingerprint}}}"));
    }

    #[test]
    fn test_render_plan_substitutes_query() {
        let loader = PromptLoader::embedded_only();
        let ctx = PlanContext {
            query: "How does authentication work?".to_string(),
            fingerprint: "{}".to_string(),
        };

        let rendered = loader.render("plan", &ctx).unwrap();
        assert!(rendered.contains("How does authentication work?"));
        assert!(rendered.contains("\"steps\""));
    }

    #[test]
    fn test_render_unknown_template_errors() {
        let loader = PromptLoader::embedded_only();
        let ctx = FingerprintContext::new("{}");

        assert!(loader.render("nonexistent-template", &ctx).is_err());
    }

    #[test]
    fn test_user_override_wins_over_embedded() {
        let temp = TempDir::new().unwrap();
        let override_dir = temp.path().join(".codescout/prompts");
        std::fs::create_dir_all(&override_dir).unwrap();
        std::fs::write(override_dir.join("explore.pmt"), "CUSTOM PROMPT {{fingerprint}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let ctx = FingerprintContext::new("fp-text");

        let rendered = loader.render("explore", &ctx).unwrap();
        assert_eq!(rendered, "CUSTOM PROMPT fp-text");
    }

    #[test]
    fn test_missing_override_dir_falls_back_to_embedded() {
        let temp = TempDir::new().unwrap();
        let loader = PromptLoader::new(temp.path());
        let ctx = FingerprintContext::new("{}");

        let rendered = loader.render("synthesis", &ctx).unwrap();
        assert!(rendered.contains("synthesizing"));
    }
}
