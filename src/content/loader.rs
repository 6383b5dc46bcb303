//! Content loader - loads posts from the content directory

use futures::future::join_all;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{post_url, FrontMatter, MarkdownRenderer, Post};
use crate::error::{Error, Result};
use crate::helpers::parse_date_string;

const EXTENSION: &str = "md";

/// Loads posts from the content directory on demand
#[derive(Debug, Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
    renderer: MarkdownRenderer,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            renderer: MarkdownRenderer::new(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Load a single post by slug
    pub async fn load_post(&self, slug: &str) -> Result<Post> {
        validate_slug(slug)?;
        let path = self.content_dir.join(format!("{}.{}", slug, EXTENSION));

        let text = fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path: path.clone() },
            _ => Error::Read {
                path: path.clone(),
                source: e,
            },
        })?;

        let (fm, body) = FrontMatter::parse(&text).map_err(|e| Error::FrontMatter {
            path: path.clone(),
            message: e.to_string(),
        })?;

        let date = fm.get_str("date").and_then(parse_date_string);
        let content = self.renderer.render(body);

        tracing::debug!("Loaded post {:?}", path);

        Ok(Post {
            metadata: fm.metadata,
            content,
            url: post_url(slug),
            slug: slug.to_string(),
            date,
        })
    }

    /// Load every post in the content directory, newest first.
    ///
    /// Posts that fail to load are logged and left out.
    pub async fn load_all_posts(&self) -> Vec<Post> {
        let slugs = match self.list_slugs().await {
            Ok(slugs) => slugs,
            Err(e) => {
                tracing::warn!("Failed to list posts in {:?}: {}", self.content_dir, e);
                return Vec::new();
            }
        };

        let results = join_all(slugs.iter().map(|slug| self.load_post(slug))).await;

        let mut posts: Vec<Post> = results
            .into_iter()
            .zip(&slugs)
            .filter_map(|(result, slug)| match result {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping post {:?}: {}", slug, e);
                    None
                }
            })
            .collect();

        posts.sort_by(Post::cmp_newest_first);
        posts
    }

    /// Slugs of all markdown files directly inside the content directory
    async fn list_slugs(&self) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.content_dir).await?;
        let mut slugs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // follows symlinks, unlike DirEntry::file_type
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                _ => continue,
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_slug(stem).is_ok() => slugs.push(stem.to_string()),
                _ => tracing::debug!("Ignoring content file {:?}", path),
            }
        }

        Ok(slugs)
    }
}

/// Reject identifiers that could address a file outside the content directory
fn validate_slug(slug: &str) -> Result<()> {
    let invalid = slug.is_empty()
        || slug.starts_with('.')
        || slug.contains("..")
        || slug.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_load_post() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hello-world.md",
            "---\ntitle: Hello World\ndate: 2024-01-15\nauthor: Ada\n---\n\nFirst line\nsecond line\n",
        );

        let loader = ContentLoader::new(dir.path());
        let post = loader.load_post("hello-world").await.unwrap();

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.url, "/blog/hello-world");
        assert_eq!(post.title(), "Hello World");
        assert_eq!(post.metadata_str("author"), Some("Ada"));
        assert_eq!(post.content, "<p>First line<br />\nsecond line</p>\n");
        assert_eq!(
            post.date.map(|d| d.format("%Y-%m-%d").to_string()),
            Some("2024-01-15".to_string())
        );
    }

    #[tokio::test]
    async fn test_load_post_is_repeatable() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "same.md",
            "---\ntitle: Same\n---\n# Heading\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
        );

        let loader = ContentLoader::new(dir.path());
        let first = loader.load_post("same").await.unwrap();
        let second = loader.load_post("same").await.unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.metadata, second.metadata);
    }

    #[tokio::test]
    async fn test_load_post_without_metadata() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bare.md", "Just a body.");

        let post = ContentLoader::new(dir.path())
            .load_post("bare")
            .await
            .unwrap();
        assert!(post.metadata.is_empty());
        assert!(post.date.is_none());
        assert_eq!(post.title(), "bare");
    }

    #[tokio::test]
    async fn test_missing_post() {
        let dir = TempDir::new().unwrap();
        let err = ContentLoader::new(dir.path())
            .load_post("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_post() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken.md", "---\ntitle: [oops\n---\nBody");

        let err = ContentLoader::new(dir.path())
            .load_post("broken")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FrontMatter { .. }));
        assert!(err.is_content_error());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let root = TempDir::new().unwrap();
        let content = root.path().join("content");
        fs::create_dir(&content).unwrap();
        fs::write(root.path().join("secret.md"), "---\ntitle: Secret\n---\n").unwrap();

        let loader = ContentLoader::new(&content);
        for slug in ["../secret", "..", "", ".hidden", "a/b", "a\\b"] {
            let err = loader.load_post(slug).await.unwrap_err();
            assert!(matches!(err, Error::InvalidSlug(_)), "slug {:?}", slug);
        }
    }

    #[tokio::test]
    async fn test_load_all_posts_skips_failures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "---\ntitle: A\ndate: 2024-01-01\n---\nA");
        write(&dir, "b.md", "---\ntitle: B\ndate: 2024-03-01\n---\nB");
        write(&dir, "c.md", "---\ntitle: C\ndate: 2024-02-01\n---\nC");
        write(&dir, "bad-yaml.md", "---\ntitle: [x\n---\nBad");
        write(&dir, "unterminated.md", "---\ntitle: never closed\n");
        write(&dir, "notes.txt", "not a post");
        fs::create_dir(dir.path().join("drafts.md")).unwrap();

        let posts = ContentLoader::new(dir.path()).load_all_posts().await;
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_load_all_posts_undated_last() {
        let dir = TempDir::new().unwrap();
        write(&dir, "undated.md", "---\ntitle: Undated\n---\n");
        write(&dir, "fuzzy.md", "---\ndate: sometime\n---\n");
        write(&dir, "dated.md", "---\ndate: 2020-05-05\n---\n");

        let posts = ContentLoader::new(dir.path()).load_all_posts().await;
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["dated", "fuzzy", "undated"]);
    }

    #[tokio::test]
    async fn test_load_all_posts_empty_or_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(ContentLoader::new(dir.path()).load_all_posts().await.is_empty());

        let missing = dir.path().join("missing");
        assert!(ContentLoader::new(missing).load_all_posts().await.is_empty());
    }
}
