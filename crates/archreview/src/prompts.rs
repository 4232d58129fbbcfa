//! Named prompt templates with `{{ variable }}` placeholders.
//!
//! The built-in templates are compiled into the binary. A configured
//! directory may override any of them by file name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PromptError;

pub const REVIEWER_TEMPLATE: &str = "architecture_reviewer_prompt.txt";
pub const EVALUATOR_TEMPLATE: &str = "architecture_evaluator_prompt.txt";
pub const SUMMARY_TEMPLATE: &str = "architecture_summary_prompt.txt";

/// Context key the document text is bound to in every built-in template.
pub const DOCUMENT_CONTENT: &str = "document_content";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        REVIEWER_TEMPLATE,
        include_str!("../prompts/architecture_reviewer_prompt.txt"),
    ),
    (
        EVALUATOR_TEMPLATE,
        include_str!("../prompts/architecture_evaluator_prompt.txt"),
    ),
    (
        SUMMARY_TEMPLATE,
        include_str!("../prompts/architecture_summary_prompt.txt"),
    ),
];

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

#[derive(Debug, Clone, Default)]
pub struct PromptRenderer {
    override_dir: Option<PathBuf>,
}

impl PromptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            override_dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    /// Renders `template_name` with `context`.
    ///
    /// Every placeholder must have a value in `context`; substituted values
    /// are inserted verbatim and never re-scanned.
    pub fn render(
        &self,
        template_name: &str,
        context: &HashMap<&str, &str>,
    ) -> Result<String, PromptError> {
        let template = self.load(template_name)?;

        let mut rendered = String::with_capacity(template.len());
        let mut last = 0;
        for caps in RE_PLACEHOLDER.captures_iter(&template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = context
                .get(name.as_str())
                .ok_or_else(|| PromptError::MissingVariable {
                    template: template_name.to_string(),
                    variable: name.as_str().to_string(),
                })?;
            rendered.push_str(&template[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }
        rendered.push_str(&template[last..]);

        Ok(rendered)
    }

    fn load(&self, template_name: &str) -> Result<String, PromptError> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(template_name);
            if path.is_file() {
                return std::fs::read_to_string(&path)
                    .map_err(|source| PromptError::ReadTemplate { path, source });
            }
        }

        BUILTIN_TEMPLATES
            .iter()
            .find(|(name, _)| *name == template_name)
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| PromptError::UnknownTemplate(template_name.to_string()))
    }
}

/// Renders a template whose only variable is the document text.
pub fn render_document_prompt(
    renderer: &PromptRenderer,
    template_name: &str,
    document: &str,
) -> Result<String, PromptError> {
    let context = HashMap::from([(DOCUMENT_CONTENT, document)]);
    renderer.render(template_name, &context)
}
