//! quillpress: a small server-rendered Markdown blog
//!
//! Posts are Markdown files with YAML front-matter. Every request reads the
//! files it needs, renders them to HTML and wraps them in Tera templates;
//! nothing about content is cached between requests.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod server;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};

/// Configuration file name, looked up in the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The blog application: configuration plus resolved directories
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding `<slug>.md` posts
    pub content_dir: PathBuf,
    /// Directory with template overrides
    pub layouts_dir: PathBuf,
    /// Directory served as static files
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog from an already built configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let layouts_dir = base_dir.join(&config.layouts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            content_dir,
            layouts_dir,
            public_dir,
        }
    }

    /// Loader for this blog's content directory
    pub fn loader(&self) -> content::ContentLoader {
        content::ContentLoader::new(&self.content_dir)
    }
}
