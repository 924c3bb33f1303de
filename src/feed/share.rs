use async_trait::async_trait;

use crate::error::Result;

/// What gets handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// A native share action took the payload.
    Shared,
    /// No share action was available; the link was copied instead.
    LinkCopied,
}

/// Platform share action with a clipboard fallback.
#[async_trait]
pub trait Sharer: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> Result<ShareOutcome>;
}

/// Terminal sharer: the "share sheet" is stdout.
pub struct PrintLinkSharer;

#[async_trait]
impl Sharer for PrintLinkSharer {
    async fn share(&self, payload: &SharePayload) -> Result<ShareOutcome> {
        println!("{}\n{}\n{}", payload.title, payload.text, payload.url);
        Ok(ShareOutcome::Shared)
    }
}
