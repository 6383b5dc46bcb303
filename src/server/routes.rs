//! Route handlers
//!
//! Each handler builds its page and hands the result to `AppState::respond`.

use axum::extract::{Path, State};
use axum::response::Response;
use std::sync::Arc;
use tera::Context;

use super::{AppState, Rendered};
use crate::error::Result;
use crate::templates::{self, PageContext};

pub(super) async fn home(State(state): State<Arc<AppState>>) -> Response {
    state.respond(render_home(&state))
}

pub(super) async fn blog_list(State(state): State<Arc<AppState>>) -> Response {
    let result = render_blog_list(&state).await;
    state.respond(result)
}

pub(super) async fn post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    let result = render_post(&state, &slug).await;
    state.respond(result)
}

pub(super) async fn academy(State(state): State<Arc<AppState>>) -> Response {
    state.respond(Ok(Rendered::ok(PageContext::new(
        "Academy",
        "/academy",
        "Learn about our academy",
        "<h1>Academy page coming soon!</h1>",
    ))))
}

pub(super) async fn login(State(state): State<Arc<AppState>>) -> Response {
    state.respond(Ok(Rendered::ok(PageContext::new(
        "Login",
        "/login",
        "Login to your account",
        "<h1>Login page coming soon!</h1>",
    ))))
}

pub(super) async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    state.respond(Ok(Rendered::not_found()))
}

fn render_home(state: &AppState) -> Result<Rendered> {
    let mut context = Context::new();
    context.insert("title", "Home");
    context.insert("path", "/");

    let content = state.renderer.render_page(templates::HOME, &context)?;
    Ok(Rendered::ok(PageContext::new(
        "Home",
        "/",
        "Welcome to our blog",
        content,
    )))
}

async fn render_blog_list(state: &AppState) -> Result<Rendered> {
    let posts = state.loader.load_all_posts().await;

    let mut context = Context::new();
    context.insert("title", "Blog");
    context.insert("path", "/blog");
    context.insert("posts", &posts);

    let content = state.renderer.render_page(templates::BLOG_LIST, &context)?;
    Ok(Rendered::ok(PageContext::new(
        "Blog",
        "/blog",
        "Read our latest blog posts",
        content,
    )))
}

async fn render_post(state: &AppState, slug: &str) -> Result<Rendered> {
    let post = match state.loader.load_post(slug).await {
        Ok(post) => post,
        Err(e) if e.is_content_error() => {
            tracing::debug!("Post {:?} unavailable: {}", slug, e);
            return Ok(Rendered::post_not_found());
        }
        Err(e) => return Err(e),
    };

    let mut context = Context::from_serialize(&post)?;
    context.insert("path", "/blog");

    let content = state.renderer.render_page(templates::POST, &context)?;
    Ok(Rendered::ok(PageContext::new(
        post.title(),
        "/blog",
        post.description(),
        content,
    )))
}
