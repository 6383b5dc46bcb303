//! Markdown rendering

use pulldown_cmark::{html, Event, Options, Parser};

/// Markdown renderer with GitHub-flavored extensions
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
    breaks: bool,
}

impl MarkdownRenderer {
    /// Create a renderer with GFM extensions and single newlines as `<br />`
    pub fn new() -> Self {
        Self::with_options(true)
    }

    /// Create with custom settings
    pub fn with_options(breaks: bool) -> Self {
        // YAML metadata blocks are not enabled: FrontMatter::parse strips them first
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        Self { options, breaks }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options).map(|event| match event {
            Event::SoftBreak if self.breaks => Event::HardBreak,
            other => other,
        });

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
