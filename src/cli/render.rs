// src/cli/render.rs
use std::fmt::Write;

use crate::entity::{Post, Resource};
use crate::feed::{FeedController, PostFilter};

const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

pub fn render_post(post: &Post, filter: PostFilter, expanded: bool) -> String {
    let mut out = String::new();

    let badge = match filter {
        PostFilter::Trending => format!("  🔥 {}", post.share_count),
        PostFilter::Recent if post.share_count > 0 => {
            format!("  Shared {} times", post.share_count)
        }
        PostFilter::Recent => String::new(),
    };

    let _ = writeln!(out, "[{}] {}{}", short_id(&post.id), post.title, badge);
    let _ = writeln!(
        out,
        "  by {} on {}",
        post.author_name,
        post.created_at.format("%Y-%m-%d")
    );
    for line in post.content.lines() {
        let _ = writeln!(out, "  {}", line);
    }
    let _ = writeln!(
        out,
        "  ♥ {}  💬 {}  ↗ {}",
        post.likes,
        post.comments.len(),
        post.share_count
    );

    if expanded {
        if post.comments.is_empty() {
            let _ = writeln!(out, "    (no comments yet)");
        }
        for comment in &post.comments {
            let _ = writeln!(out, "    - {}", comment);
        }
    }

    out
}

pub fn render_feed(feed: &FeedController) -> String {
    let filter = feed.filter();
    let posts = feed.posts();

    let mut out = match filter {
        PostFilter::Trending => String::from("== Trending ==\n"),
        PostFilter::Recent => String::from("== Recent ==\n"),
    };
    if posts.is_empty() {
        out.push_str("No posts yet.\n");
        return out;
    }

    for post in &posts {
        out.push('\n');
        out.push_str(&render_post(post, filter, feed.is_comment_open(&post.id)));
    }
    out
}

pub fn render_resources(resources: &[Resource]) -> String {
    if resources.is_empty() {
        return "No resources shared yet.\n".to_string();
    }

    let mut out = String::new();
    for resource in resources {
        let _ = writeln!(
            out,
            "[{}] {} ({}) - {}",
            short_id(&resource.id),
            resource.title,
            resource.kind,
            resource.url
        );
        if let Some(description) = &resource.description {
            let _ = writeln!(out, "  {}", description);
        }
        let _ = writeln!(out, "  shared by {}", resource.author_name);
    }
    out
}
