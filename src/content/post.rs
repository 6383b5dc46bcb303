//! Post model

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_yaml::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

use super::Metadata;

/// A blog post loaded from `<content_dir>/<slug>.md`
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Front-matter fields, spread into the top level when serialized
    #[serde(flatten)]
    pub metadata: Metadata,

    /// Rendered HTML content
    pub content: String,

    /// Canonical URL path, `/blog/{slug}`
    pub url: String,

    /// File stem the post was loaded from
    pub slug: String,

    /// Parsed `date` field, used for ordering
    #[serde(skip)]
    pub date: Option<DateTime<FixedOffset>>,
}

impl Post {
    /// Title from the front-matter, or the slug when absent
    pub fn title(&self) -> Cow<'_, str> {
        self.metadata_text("title")
            .unwrap_or(Cow::Borrowed(self.slug.as_str()))
    }

    /// Description from the front-matter, or empty
    pub fn description(&self) -> Cow<'_, str> {
        self.metadata_text("description").unwrap_or_default()
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// A scalar front-matter field as text; numbers and booleans are stringified
    pub fn metadata_text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.metadata.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Newest first; undated posts after all dated ones; slug breaks ties
    pub fn cmp_newest_first(&self, other: &Post) -> Ordering {
        let by_date = match (&self.date, &other.date) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| self.slug.cmp(&other.slug))
    }
}

/// Canonical URL path for a slug
pub fn post_url(slug: &str) -> String {
    format!("/blog/{}", slug)
}
