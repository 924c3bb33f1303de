//! Feed state: the in-memory post list behind the dashboard and the rules
//! for reconciling it with the backend.
//!
//! Posts carrying the reserved trending tag are *seed* posts. They are read
//! from storage like any other post, but likes, shares and comments on them
//! only ever touch the in-memory copy. Every other post is persisted first and
//! reflected locally only once the write succeeds.
//!
//! Operations take `&self` and may interleave. Each mutation reads its base
//! value from the list when it starts and replaces it when it finishes, so two
//! overlapping likes on the same persisted post can record a single increment.
//! Overlapping loads are sequenced: only the most recently issued load may
//! replace the list.

mod filter;
mod notice;
mod share;

pub use filter::PostFilter;
pub use notice::{Notice, NoticeLevel};
pub use share::{PrintLinkSharer, ShareOutcome, SharePayload, Sharer};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Document, Fields, Query, CREATED_AT_FIELD};
use crate::config::AppConfig;
use crate::entity::{Comment, Identity, Post, SEED_POSTS};
use crate::error::{DevfeedError, Result};

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with this many posts.
    Applied(usize),
    /// A newer load was issued while this one was in flight; nothing changed.
    Superseded,
}

#[derive(Default)]
struct FeedState {
    posts: Vec<Post>,
    filter: PostFilter,
    latest_request: u64,
    open_comments: HashSet<String>,
    notices: Vec<Notice>,
}

pub struct FeedController {
    backend: Arc<dyn Backend>,
    sharer: Arc<dyn Sharer>,
    config: AppConfig,
    identity: Identity,
    state: Mutex<FeedState>,
}

impl FeedController {
    pub fn new(
        backend: Arc<dyn Backend>,
        sharer: Arc<dyn Sharer>,
        config: AppConfig,
        identity: Identity,
    ) -> Self {
        Self {
            backend,
            sharer,
            config,
            identity,
            state: Mutex::new(FeedState::default()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state().posts.clone()
    }

    /// Filter of the list currently shown.
    pub fn filter(&self) -> PostFilter {
        self.state().filter
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.state().posts.iter().find(|p| p.id == post_id).cloned()
    }

    /// Resolve a full id or unique id prefix against the loaded list.
    pub fn resolve_post_id(&self, prefix: &str) -> Result<String> {
        let state = self.state();
        if let Some(post) = state.posts.iter().find(|p| p.id == prefix) {
            return Ok(post.id.clone());
        }

        let mut matches = state.posts.iter().filter(|p| p.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(post), None) if !prefix.is_empty() => Ok(post.id.clone()),
            _ => Err(DevfeedError::PostNotFound(prefix.to_string())),
        }
    }

    pub fn is_seed(&self, post: &Post) -> bool {
        post.has_tag(&self.config.trending_tag)
    }

    /// Drain pending user-facing notices, oldest first.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state().notices)
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.state().notices.push(notice);
    }

    /// Create the four seed posts unless some post already carries the
    /// reserved tag. Returns how many were created.
    ///
    /// Two callers racing past the emptiness check will both create seeds.
    pub async fn ensure_seed_posts(&self) -> Result<usize> {
        let collection = &self.config.collections.posts;
        let tag = self.config.trending_tag.as_str();

        let existing = self
            .backend
            .list_documents(collection, &Query::new().equal("tags", [tag]))
            .await?;
        if !existing.is_empty() {
            debug!(count = existing.len(), "seed posts already present");
            return Ok(0);
        }

        for seed in SEED_POSTS.iter() {
            self.backend
                .create_document(collection, seed.to_fields(tag))
                .await?;
        }

        info!(count = SEED_POSTS.len(), "seed posts created");
        self.notify(Notice::success("Trending posts initialized"));
        Ok(SEED_POSTS.len())
    }

    /// Fetch the posts for `filter` and, unless a newer load was issued in the
    /// meantime, make them the current list. On failure the list is left as is.
    pub async fn load_posts(&self, filter: PostFilter) -> Result<LoadOutcome> {
        let token = {
            let mut state = self.state();
            state.latest_request += 1;
            state.latest_request
        };
        debug!(%filter, token, "loading posts");

        let fetched = self.fetch_posts(filter).await;

        let mut state = self.state();
        match fetched {
            Ok(posts) if state.latest_request == token => {
                let count = posts.len();
                state.posts = posts;
                state.filter = filter;
                Ok(LoadOutcome::Applied(count))
            }
            Ok(_) => {
                debug!(%filter, token, latest = state.latest_request, "discarding stale load");
                Ok(LoadOutcome::Superseded)
            }
            Err(e) => {
                warn!(%filter, error = %e, "failed to fetch posts");
                state.notices.push(Notice::error("Failed to fetch posts"));
                Err(e)
            }
        }
    }

    /// Load again with the current filter.
    pub async fn reload(&self) -> Result<LoadOutcome> {
        let filter = self.filter();
        self.load_posts(filter).await
    }

    async fn fetch_posts(&self, filter: PostFilter) -> Result<Vec<Post>> {
        let collection = &self.config.collections.posts;
        let tag = self.config.trending_tag.as_str();

        match filter {
            PostFilter::Trending => {
                let query = Query::new().equal("tags", [tag]).order_desc("shareCount");
                let docs = self.backend.list_documents(collection, &query).await?;
                let mut posts = decode_posts(&docs);
                // Stable: ties keep the backend's order.
                posts.sort_by(|a, b| b.share_count.cmp(&a.share_count));
                Ok(posts)
            }
            PostFilter::Recent => {
                let query = Query::new().order_desc(CREATED_AT_FIELD);
                let docs = self.backend.list_documents(collection, &query).await?;
                Ok(decode_posts(&docs)
                    .into_iter()
                    .filter(|p| !p.has_tag(tag))
                    .collect())
            }
        }
    }

    /// Like a post. Returns the like count now shown.
    pub async fn like(&self, post_id: &str) -> Result<u64> {
        let post = self.snapshot(post_id)?;

        if self.is_seed(&post) {
            let likes = self.apply(post_id, |p| {
                p.likes += 1;
                p.likes
            });
            self.notify(Notice::success("Post liked!"));
            return Ok(likes.unwrap_or(post.likes + 1));
        }

        let likes = post.likes + 1;
        if let Err(e) = self.persist(post_id, "likes", json!(likes)).await {
            warn!(post = post_id, error = %e, "like failed");
            self.notify(Notice::error("Failed to like post"));
            return Err(e);
        }

        self.apply(post_id, |p| p.likes = likes);
        self.notify(Notice::success("Post liked!"));
        Ok(likes)
    }

    /// Append a comment signed with the current user's display name.
    ///
    /// For persisted posts the stored comment array, with the new entry
    /// appended, is written back and the list is then reloaded. A failed
    /// reload is reported but does not undo the comment.
    pub async fn comment(&self, post_id: &str, text: &str) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(DevfeedError::validation("comment", "is required"));
        }
        let post = self.snapshot(post_id)?;
        let comment = Comment::new(self.identity.name.clone(), text.trim());

        if self.is_seed(&post) {
            self.apply(post_id, |p| p.push_comment(comment.clone()));
            self.notify(Notice::success("Comment added"));
            return Ok(comment);
        }

        if let Err(e) = self
            .persist(post_id, "comments", post.comments_with(&comment))
            .await
        {
            warn!(post = post_id, error = %e, "comment failed");
            self.notify(Notice::error("Failed to add comment"));
            return Err(e);
        }

        self.apply(post_id, |p| p.push_comment(comment.clone()));

        if let Err(e) = self.reload().await {
            debug!(error = %e, "reload after comment failed");
        }
        self.notify(Notice::success("Comment added"));
        Ok(comment)
    }

    /// Hand the post to the sharer, then count the share. Returns the share
    /// count now shown. If the share action itself fails nothing is counted.
    pub async fn share(&self, post_id: &str) -> Result<u64> {
        let post = self.snapshot(post_id)?;
        let payload = SharePayload {
            title: post.title.clone(),
            text: post.excerpt(),
            url: self.config.share_url(&post.id),
        };

        match self.sharer.share(&payload).await {
            Ok(ShareOutcome::LinkCopied) => self.notify(Notice::success("Link copied to clipboard!")),
            Ok(ShareOutcome::Shared) => {}
            Err(e) => {
                warn!(post = post_id, error = %e, "share action failed");
                self.notify(Notice::error("Failed to share post"));
                return Err(e);
            }
        }

        if self.is_seed(&post) {
            let count = self.apply(post_id, |p| {
                p.share_count += 1;
                p.share_count
            });
            return Ok(count.unwrap_or(post.share_count + 1));
        }

        let count = post.share_count + 1;
        if let Err(e) = self.persist(post_id, "shareCount", json!(count)).await {
            warn!(post = post_id, error = %e, "share count update failed");
            self.notify(Notice::error("Failed to share post"));
            return Err(e);
        }

        self.apply(post_id, |p| p.share_count = count);
        Ok(count)
    }

    /// Flip whether a post's comment panel is expanded. Returns the new state.
    pub fn toggle_comment_visibility(&self, post_id: &str) -> bool {
        let mut state = self.state();
        if state.open_comments.remove(post_id) {
            false
        } else {
            state.open_comments.insert(post_id.to_string());
            true
        }
    }

    pub fn is_comment_open(&self, post_id: &str) -> bool {
        self.state().open_comments.contains(post_id)
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self, post_id: &str) -> Result<Post> {
        self.post(post_id)
            .ok_or_else(|| DevfeedError::PostNotFound(post_id.to_string()))
    }

    /// Mutate the listed post in place, if it is still listed.
    fn apply<T>(&self, post_id: &str, f: impl FnOnce(&mut Post) -> T) -> Option<T> {
        let mut state = self.state();
        state.posts.iter_mut().find(|p| p.id == post_id).map(f)
    }

    async fn persist(&self, post_id: &str, field: &str, value: serde_json::Value) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value);
        self.backend
            .update_document(&self.config.collections.posts, post_id, fields)
            .await?;
        debug!(post = post_id, field, "post updated");
        Ok(())
    }
}

fn decode_posts(docs: &[Document]) -> Vec<Post> {
    docs.iter()
        .filter_map(|doc| match Post::from_document(doc) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "skipping undecodable post");
                None
            }
        })
        .collect()
}
