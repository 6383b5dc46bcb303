//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;
use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# quillpress configuration

# Site
title: My Blog
description: Welcome to our blog
author: ''

# Server
ip: 127.0.0.1
port: 4000
port_retries: 3

# Directory
content_dir: content
layouts_dir: layouts
public_dir: public

# Rendering
date_format: LL
excerpt_length: 200

# Navigation
menu:
  - name: Home
    path: /
  - name: Blog
    path: /blog
  - name: Academy
    path: /academy
  - name: Login
    path: /login
"#;

const STYLESHEET: &str = r#"body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 0 auto; padding: 0 1rem; line-height: 1.6; }
.site-header nav { display: flex; align-items: center; justify-content: space-between; }
.site-header ul { display: flex; gap: 1rem; list-style: none; padding: 0; }
.site-header a.active { font-weight: bold; }
.post-list { list-style: none; padding: 0; }
.post-list time, .post time { color: #666; margin-left: .5rem; }
.site-footer { margin: 3rem 0 1rem; color: #666; font-size: .9rem; }
"#;

/// Initialize a new blog in the given directory.
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    let defaults = SiteConfig::default();
    let content_dir = target_dir.join(&defaults.content_dir);
    let public_dir = target_dir.join(&defaults.public_dir);

    // Create directory structure
    for dir in [
        content_dir.clone(),
        target_dir.join(&defaults.layouts_dir),
        public_dir.join("css"),
        public_dir.join("images"),
    ] {
        fs::create_dir_all(&dir)?;
    }

    write_if_missing(&target_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    write_if_missing(&public_dir.join("css/style.css"), STYLESHEET)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
description: Your very first post
---

Welcome! This post lives in `content/hello-world.md`.
Edit it, or create a new one:

```bash
$ quillpress new "My New Post"
```

Then start the server and open <http://localhost:4000/blog>:

```bash
$ quillpress serve
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );
    write_if_missing(&content_dir.join("hello-world.md"), &sample_post)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::debug!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::info!("Created: {:?}", path);
    Ok(())
}
