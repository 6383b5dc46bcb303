//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // Server
    pub ip: String,
    pub port: u16,
    /// Total number of ports tried, starting at `port`
    pub port_retries: u16,

    // Directory
    pub content_dir: String,
    pub layouts_dir: String,
    pub public_dir: String,

    // Rendering
    pub date_format: String,
    pub excerpt_length: usize,

    // Navigation
    pub menu: Vec<MenuItem>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: "Welcome to our blog".to_string(),
            author: String::new(),

            ip: "127.0.0.1".to_string(),
            port: 4000,
            port_retries: 3,

            content_dir: "content".to_string(),
            layouts_dir: "layouts".to_string(),
            public_dir: "public".to_string(),

            date_format: "LL".to_string(),
            excerpt_length: 200,

            menu: MenuItem::defaults(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the `PORT` environment variable, if it holds a valid port
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("PORT") {
            match value.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value {:?}", value),
            }
        }
    }
}

/// A navigation link rendered by the base layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub path: String,
}

impl MenuItem {
    fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    fn defaults() -> Vec<Self> {
        vec![
            Self::new("Home", "/"),
            Self::new("Blog", "/blog"),
            Self::new("Academy", "/academy"),
            Self::new("Login", "/login"),
        ]
    }
}
