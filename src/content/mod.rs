//! Content module - handles posts and content processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{FrontMatter, FrontMatterError, Metadata};
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;
pub use post::{post_url, Post};
