//! Page templates rendered with Tera
//!
//! Pages are rendered in two stages: an inner template produces an HTML
//! fragment, which then becomes the `content` of the shared `base.html` layout.
//! Default templates are embedded in the binary; a file with the same name in
//! the layouts directory replaces the embedded one.

use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::config::{MenuItem, SiteConfig};
use crate::error::Result;
use crate::helpers::{format_date, parse_date_string, strip_html, truncate_chars};

pub const BASE: &str = "base.html";
pub const HOME: &str = "home.html";
pub const BLOG_LIST: &str = "blog_list.html";
pub const POST: &str = "post.html";

const DEFAULT_TEMPLATES: [(&str, &str); 4] = [
    (BASE, include_str!("default/base.html")),
    (HOME, include_str!("default/home.html")),
    (BLOG_LIST, include_str!("default/blog_list.html")),
    (POST, include_str!("default/post.html")),
];

/// Fields every page shares with the base layout
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub title: String,
    pub path: String,
    pub description: String,
    /// HTML fragment placed inside the layout
    pub content: String,
}

impl PageContext {
    pub fn new(
        title: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            description: description.into(),
            content: content.into(),
        }
    }
}

/// Site-wide values exposed to every template as `site`
#[derive(Debug, Clone, Serialize)]
struct SiteData {
    title: String,
    description: String,
    author: String,
    menu: Vec<MenuItem>,
    excerpt_length: usize,
}

/// Template renderer holding the compiled templates
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
}

impl TemplateRenderer {
    /// Create a renderer with the embedded templates only
    pub fn new(config: &SiteConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a renderer, preferring templates found in `layouts_dir`
    pub fn with_layouts_dir(config: &SiteConfig, layouts_dir: &Path) -> Result<Self> {
        Self::build(config, Some(layouts_dir))
    }

    fn build(config: &SiteConfig, layouts_dir: Option<&Path>) -> Result<Self> {
        let mut templates = Vec::with_capacity(DEFAULT_TEMPLATES.len());
        for (name, source) in DEFAULT_TEMPLATES {
            let custom = layouts_dir.map(|dir| dir.join(name)).filter(|p| p.is_file());
            match custom {
                Some(path) => {
                    tracing::debug!("Using custom template {:?}", path);
                    templates.push((name, fs::read_to_string(&path)?));
                }
                None => templates.push((name, source.to_string())),
            }
        }

        let mut tera = Tera::default();
        // Rendered markdown must pass through untouched; templates escape
        // front-matter text explicitly
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(templates)?;

        let default_format = config.date_format.clone();
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter(
            "date_format",
            move |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                date_format_filter(value, args, &default_format)
            },
        );

        let site = SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            menu: config.menu.clone(),
            excerpt_length: config.excerpt_length,
        };

        Ok(Self { tera, site })
    }

    /// Render an inner page template to an HTML fragment
    pub fn render_page(&self, template: &str, context: &Context) -> Result<String> {
        let mut context = context.clone();
        context.insert("site", &self.site);
        Ok(self.tera.render(template, &context)?)
    }

    /// Wrap a fragment in the base layout
    pub fn render_layout(&self, page: &PageContext) -> Result<String> {
        let mut context = Context::from_serialize(page)?;
        context.insert("site", &self.site);
        context.insert("year", &chrono::Utc::now().year());
        Ok(self.tera.render(BASE, &context)?)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };
    Ok(tera::Value::String(truncate_chars(
        s.trim(),
        length,
        &omission,
    )))
}

/// Tera filter: reformat a front-matter date.
///
/// Strings that are not dates come back unchanged, other values as their text.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
    default_format: &str,
) -> tera::Result<tera::Value> {
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => default_format.to_string(),
    };

    let formatted = match value.as_str() {
        Some(s) => parse_date_string(s)
            .map(|date| format_date(&date, &format))
            .unwrap_or_else(|| s.to_string()),
        None => value.to_string(),
    };
    Ok(tera::Value::String(formatted))
}
