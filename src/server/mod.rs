//! HTTP server rendering pages on every request

mod routes;

use anyhow::{Context as _, Result};
use axum::{
    handler::Handler,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::content::ContentLoader;
use crate::error::Error;
use crate::templates::{PageContext, TemplateRenderer};
use crate::Blog;

/// Returned when even the error page cannot be rendered
const FALLBACK_ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Error</title></head>\
<body><h1>Internal Server Error</h1><p>Sorry, something went wrong.</p></body></html>";

/// Immutable state shared by all requests
pub struct AppState {
    loader: ContentLoader,
    renderer: TemplateRenderer,
}

impl AppState {
    pub fn new(blog: &Blog) -> crate::Result<Self> {
        Ok(Self {
            loader: blog.loader(),
            renderer: TemplateRenderer::with_layouts_dir(&blog.config, &blog.layouts_dir)?,
        })
    }

    /// Turn a handler result into a response.
    ///
    /// Every route goes through here: `Ok` pages are wrapped in the base
    /// layout with their status, any `Err` becomes the generic 500 page.
    fn respond(&self, result: crate::Result<Rendered>) -> Response {
        let rendered = result.unwrap_or_else(|e| {
            tracing::error!("Server error: {}", e);
            Rendered::internal_error()
        });

        match self.renderer.render_layout(&rendered.page) {
            Ok(html) => (rendered.status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render layout: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(FALLBACK_ERROR_PAGE)).into_response()
            }
        }
    }
}

/// A page ready to be wrapped in the layout
#[derive(Debug)]
pub struct Rendered {
    pub status: StatusCode,
    pub page: PageContext,
}

impl Rendered {
    pub fn ok(page: PageContext) -> Self {
        Self {
            status: StatusCode::OK,
            page,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            page: PageContext::new(
                "404 - Not Found",
                "",
                "The requested page could not be found",
                "<h1>Page not found</h1>",
            ),
        }
    }

    pub fn post_not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            page: PageContext::new(
                "404 - Post Not Found",
                "/blog",
                "The requested post could not be found",
                "<h1>Post not found</h1>",
            ),
        }
    }

    pub fn internal_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            page: PageContext::new(
                "Error",
                "",
                "An error occurred",
                "<h1>Internal Server Error</h1><p>Sorry, something went wrong.</p>",
            ),
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, public_dir: &Path) -> Router {
    let not_found = routes::not_found.with_state(state.clone());
    let static_files = ServeDir::new(public_dir).not_found_service(not_found);

    Router::new()
        .route("/", get(routes::home))
        .route("/blog", get(routes::blog_list))
        .route("/blog/:slug", get(routes::post))
        .route("/academy", get(routes::academy))
        .route("/login", get(routes::login))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `ip:port`, moving to the next port while the address is in use.
///
/// `attempts` is the total number of ports tried, so `{port, .., port + attempts - 1}`.
pub async fn bind_with_retry(ip: IpAddr, port: u16, attempts: u16) -> crate::Result<TcpListener> {
    let last = port.saturating_add(attempts.max(1) - 1);

    for candidate in port..=last {
        match TcpListener::bind(SocketAddr::new(ip, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                if candidate < last {
                    tracing::warn!("Port {} is in use, trying {}...", candidate, candidate + 1);
                } else {
                    tracing::warn!("Port {} is in use", candidate);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::PortsExhausted { first: port, last })
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    if !blog.content_dir.is_dir() {
        tracing::warn!(
            "Content directory {:?} does not exist; run `quillpress init` to create it",
            blog.content_dir
        );
    }

    let state = Arc::new(AppState::new(blog)?);
    let app = router(state, &blog.public_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let bind_ip: IpAddr = bind_ip
        .parse()
        .with_context(|| format!("invalid IP address {:?}", ip))?;

    let listener = bind_with_retry(bind_ip, port, blog.config.port_retries).await?;
    let addr = listener.local_addr()?;

    tracing::info!("Server is running on http://{}", addr);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Site {
        dir: TempDir,
        blog: Blog,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let blog = Blog::with_config(dir.path(), SiteConfig::default());
            fs::create_dir_all(&blog.content_dir).unwrap();
            Self { dir, blog }
        }

        fn post(&self, slug: &str, content: &str) {
            fs::write(self.blog.content_dir.join(format!("{}.md", slug)), content).unwrap();
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            let state = Arc::new(AppState::new(&self.blog).unwrap());
            let app = router(state, &self.blog.public_dir);
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }
    }

    #[tokio::test]
    async fn test_home() {
        let site = Site::new();
        let (status, body) = site.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Home | My Blog</title>"));
        assert!(body.contains(r#"content="Welcome to our blog""#));
        assert!(body.contains(r#"<a class="button" href="/blog">"#));
    }

    #[tokio::test]
    async fn test_blog_list_newest_first() {
        let site = Site::new();
        site.post("older", "---\ntitle: Older Post\ndate: 2023-05-01\n---\nOld body");
        site.post("newer", "---\ntitle: Newer Post\ndate: 2024-05-01\n---\nNew body");
        site.post("broken", "---\ntitle: [broken\n---\n");

        let (status, body) = site.get("/blog").await;
        assert_eq!(status, StatusCode::OK);
        let newer = body.find("Newer Post").unwrap();
        let older = body.find("Older Post").unwrap();
        assert!(newer < older);
        assert!(body.contains(r#"href="/blog/newer""#));
        assert!(body.contains("<time>May 1, 2024</time>"));
        assert!(!body.contains("broken"));
    }

    #[tokio::test]
    async fn test_blog_list_empty() {
        let site = Site::new();
        let (status, body) = site.get("/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No posts yet."));
    }

    #[tokio::test]
    async fn test_blog_list_without_content_dir() {
        let site = Site::new();
        fs::remove_dir(&site.blog.content_dir).unwrap();
        let (status, body) = site.get("/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No posts yet."));
    }

    #[tokio::test]
    async fn test_single_post() {
        let site = Site::new();
        site.post(
            "hello",
            "---\ntitle: Hello\ndescription: A greeting\nauthor: Ada\n---\nHi\nthere",
        );

        let (status, body) = site.get("/blog/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Hello | My Blog</title>"));
        assert!(body.contains(r#"content="A greeting""#));
        assert!(body.contains("<h1>Hello</h1>"));
        assert!(body.contains("by Ada"));
        assert!(body.contains("<p>Hi<br />\nthere</p>"));
        assert!(body.contains(r#"<a href="/blog" class="active" aria-current="page">Blog</a>"#));
    }

    #[tokio::test]
    async fn test_single_post_without_metadata() {
        let site = Site::new();
        site.post("bare", "Nothing but body.");

        let (status, body) = site.get("/blog/bare").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>bare</h1>"));
        assert!(body.contains("<p>Nothing but body.</p>"));
    }

    #[tokio::test]
    async fn test_non_string_metadata_in_list() {
        let site = Site::new();
        site.post("good", "---\ntitle: Good\ndate: 2024-02-01\n---\nFine");
        site.post("year", "---\ntitle: 2024\ndescription: 42\ndate: 2024-01-01\n---\nNumbers");
        site.post(
            "tags",
            "---\ntitle: true\nauthor: [a, b]\ndate: 20230101\n---\nLists",
        );

        let (status, body) = site.get("/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(">Good</a>"));
        assert!(body.contains(">2024</a>"));
        assert!(body.contains("<p>42</p>"));
        assert!(body.contains(">true</a>"));
        assert!(body.contains("<time>20230101</time>"));
    }

    #[tokio::test]
    async fn test_non_string_metadata_in_post() {
        let site = Site::new();
        site.post("year", "---\ntitle: 2024\ndescription: 42\n---\nNumbers");
        site.post("tags", "---\ntitle: Tagged\nauthor: [a, b]\n---\nLists");

        let (status, body) = site.get("/blog/year").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>2024</h1>"));
        assert!(body.contains("<title>2024 | My Blog</title>"));
        assert!(body.contains(r#"content="42""#));

        let (status, body) = site.get("/blog/tags").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Tagged</h1>"));
        assert!(body.contains(r#"<span class="author">by "#));
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let site = Site::new();
        let (status, body) = site.get("/blog/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.to_lowercase().contains("not found"));
        assert!(body.contains("<h1>Post not found</h1>"));
    }

    #[tokio::test]
    async fn test_malformed_post_is_404() {
        let site = Site::new();
        site.post("broken", "---\ntitle: [broken\n---\n");
        let (status, body) = site.get("/blog/broken").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>Post not found</h1>"));
    }

    #[tokio::test]
    async fn test_traversal_is_404() {
        let site = Site::new();
        fs::write(site.dir.path().join("secret.md"), "---\ntitle: Secret\n---\nhidden").unwrap();

        let (status, body) = site.get("/blog/..%2Fsecret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("hidden"));
    }

    #[tokio::test]
    async fn test_placeholder_pages() {
        let site = Site::new();

        let (status, body) = site.get("/academy").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Academy page coming soon!</h1>"));

        let (status, body) = site.get("/login").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Login page coming soon!</h1>"));
        assert!(body.contains(r#"content="Login to your account""#));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let site = Site::new();
        let (status, body) = site.get("/no/such/page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("<h1>Page not found</h1>"));
        assert!(body.contains("<title>404 - Not Found | My Blog</title>"));
    }

    #[tokio::test]
    async fn test_static_files() {
        let site = Site::new();
        fs::create_dir_all(site.blog.public_dir.join("css")).unwrap();
        fs::write(site.blog.public_dir.join("css/style.css"), "body { margin: 0 }").unwrap();

        let (status, body) = site.get("/css/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body { margin: 0 }");
    }

    #[tokio::test]
    async fn test_render_error_is_500() {
        let site = Site::new();
        fs::create_dir_all(&site.blog.layouts_dir).unwrap();
        fs::write(
            site.blog.layouts_dir.join("post.html"),
            "{{ missing_variable }}",
        )
        .unwrap();
        site.post("hello", "---\ntitle: Hello\n---\nBody");

        let (status, body) = site.get("/blog/hello").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("<h1>Internal Server Error</h1>"));
        assert!(!body.contains("missing_variable"));
    }

    #[tokio::test]
    async fn test_broken_layout_falls_back() {
        let site = Site::new();
        fs::create_dir_all(&site.blog.layouts_dir).unwrap();
        fs::write(site.blog.layouts_dir.join("base.html"), "{{ nope }}").unwrap();

        let (status, body) = site.get("/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, FALLBACK_ERROR_PAGE);
    }

    #[tokio::test]
    async fn test_bind_skips_occupied_port() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let occupied = TcpListener::bind(SocketAddr::new(ip, 0)).await.unwrap();
        let port = occupied.local_addr().unwrap().port();
        if port > u16::MAX - 2 {
            return;
        }

        let listener = bind_with_retry(ip, port, 3).await.unwrap();
        let bound = listener.local_addr().unwrap().port();
        assert!(bound == port + 1 || bound == port + 2, "bound {}", bound);
    }

    #[tokio::test]
    async fn test_bind_gives_up_after_budget() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let first = std::net::TcpListener::bind((ip, 0)).unwrap();
        let port = first.local_addr().unwrap().port();
        if port > u16::MAX - 2 {
            return;
        }
        // Ports already taken by someone else are just as occupied
        let _others: Vec<_> = [port + 1, port + 2]
            .into_iter()
            .filter_map(|p| std::net::TcpListener::bind((ip, p)).ok())
            .collect();

        let err = bind_with_retry(ip, port, 3).await.unwrap_err();
        assert!(matches!(
            err,
            Error::PortsExhausted { first, last } if first == port && last == port + 2
        ));

        let err = bind_with_retry(ip, port, 1).await.unwrap_err();
        assert!(matches!(err, Error::PortsExhausted { first, last } if first == last));
    }
}
