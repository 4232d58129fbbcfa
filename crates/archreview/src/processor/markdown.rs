use std::path::Path;

use comrak::nodes::{AstNode, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// Reduces Markdown to the text of its headings and paragraphs, one block per
/// line. Markup, code blocks and raw HTML are dropped.
pub struct MarkdownProcessor;

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor for MarkdownProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.markdown").entered();

        let content = std::fs::read_to_string(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(markdown_to_text(&content))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Markdown)
    }
}

pub fn markdown_to_text(content: &str) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, content, &ComrakOptions::default());

    let mut blocks = Vec::new();
    for node in root.descendants() {
        let is_text_block = matches!(
            node.data.borrow().value,
            NodeValue::Heading(_) | NodeValue::Paragraph
        );
        if is_text_block {
            let text = inline_text(node);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                blocks.push(trimmed.to_string());
            }
        }
    }

    blocks.join("\n").trim().to_string()
}

fn inline_text<'a>(block: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    for node in block.descendants() {
        match &node.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push('\n'),
            _ => {}
        }
    }
    text
}
