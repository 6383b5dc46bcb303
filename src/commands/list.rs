//! List site content

use anyhow::Result;

use crate::Blog;

/// Print every loadable post, newest first
pub async fn run(blog: &Blog) -> Result<()> {
    let posts = blog.loader().load_all_posts().await;

    println!("Posts ({}):", posts.len());
    for post in posts {
        let date = post
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!("  {} - {} [{}]", date, post.title(), post.slug);
    }

    Ok(())
}
