//! The signed-in dashboard: the feed plus the shared resource list, opened
//! against a live session.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::backend::{Backend, Query, CREATED_AT_FIELD};
use crate::config::AppConfig;
use crate::entity::{NewPost, NewResource, Post, Resource};
use crate::error::Result;
use crate::feed::{FeedController, Notice, PostFilter, Sharer};

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    feed: FeedController,
    resources: Mutex<Vec<Resource>>,
}

impl Dashboard {
    /// Resolve the session, seed the trending posts if needed, then load the
    /// trending feed and the resources side by side.
    ///
    /// Only a missing session is fatal. Seeding and loading failures surface
    /// as notices on the feed.
    pub async fn open(
        backend: Arc<dyn Backend>,
        sharer: Arc<dyn Sharer>,
        config: AppConfig,
    ) -> Result<Self> {
        let identity = backend.get_session().await?;
        debug!(user = %identity.id, "opening dashboard");

        let dashboard = Self {
            feed: FeedController::new(backend.clone(), sharer, config, identity),
            backend,
            resources: Mutex::new(Vec::new()),
        };

        if let Err(e) = dashboard.feed.ensure_seed_posts().await {
            warn!(error = %e, "could not seed trending posts");
        }

        let (posts, resources) = tokio::join!(
            dashboard.feed.load_posts(PostFilter::Trending),
            dashboard.load_resources()
        );
        if let Err(e) = posts {
            debug!(error = %e, "initial feed load failed");
        }
        if let Err(e) = resources {
            debug!(error = %e, "initial resource load failed");
        }

        Ok(dashboard)
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.resource_list().clone()
    }

    /// Publish a post as the current user and reload the current filter.
    pub async fn create_post(&self, draft: NewPost) -> Result<Post> {
        draft.validate()?;
        let collection = &self.config().collections.posts;

        let doc = match self
            .backend
            .create_document(collection, draft.into_fields(self.feed.identity()))
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "failed to create post");
                self.feed.notify(Notice::error("Failed to create post"));
                return Err(e);
            }
        };
        let post = Post::from_document(&doc)?;
        info!(post = %post.id, "post created");
        self.feed.notify(Notice::success("Post created successfully!"));

        if let Err(e) = self.feed.reload().await {
            debug!(error = %e, "reload after post failed");
        }
        Ok(post)
    }

    pub async fn create_resource(&self, draft: NewResource) -> Result<Resource> {
        draft.validate()?;
        let collection = &self.config().collections.resources;

        let doc = match self
            .backend
            .create_document(collection, draft.into_fields(self.feed.identity()))
            .await
        {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "failed to add resource");
                self.feed.notify(Notice::error("Failed to add resource"));
                return Err(e);
            }
        };
        let resource = Resource::from_document(&doc)?;
        info!(resource = %resource.id, "resource added");
        self.feed.notify(Notice::success("Resource added successfully!"));

        if let Err(e) = self.load_resources().await {
            debug!(error = %e, "reload after resource failed");
        }
        Ok(resource)
    }

    /// All resources, newest first. On failure the current list is kept.
    pub async fn load_resources(&self) -> Result<usize> {
        let query = Query::new().order_desc(CREATED_AT_FIELD);
        let docs = match self
            .backend
            .list_documents(&self.config().collections.resources, &query)
            .await
        {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "failed to fetch resources");
                self.feed.notify(Notice::error("Failed to fetch resources"));
                return Err(e);
            }
        };

        let resources: Vec<Resource> = docs
            .iter()
            .filter_map(|doc| match Resource::from_document(doc) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping undecodable resource");
                    None
                }
            })
            .collect();
        let count = resources.len();
        *self.resource_list() = resources;
        Ok(count)
    }

    /// End the session. The dashboard should be dropped afterwards.
    pub async fn logout(&self) -> Result<()> {
        match self.backend.delete_session().await {
            Ok(()) => {
                info!(user = %self.feed.identity().id, "logged out");
                self.feed.notify(Notice::success("Logged out successfully"));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to logout");
                self.feed.notify(Notice::error("Failed to logout"));
                Err(e)
            }
        }
    }

    fn config(&self) -> &AppConfig {
        self.feed.config()
    }

    fn resource_list(&self) -> MutexGuard<'_, Vec<Resource>> {
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, MemoryBackend};
    use crate::entity::ResourceType;
    use crate::error::DevfeedError;
    use crate::feed::PrintLinkSharer;

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::with_session("Ada", "ada@example.com"))
    }

    async fn open(backend: &Arc<MemoryBackend>) -> Dashboard {
        Dashboard::open(backend.clone(), Arc::new(PrintLinkSharer), AppConfig::default())
            .await
            .unwrap()
    }

    fn link(title: &str) -> NewResource {
        NewResource {
            title: title.to_string(),
            kind: ResourceType::Link,
            url: "https://example.com/guide".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_open_seeds_and_loads_trending() {
        let backend = backend();
        let dashboard = open(&backend).await;

        assert_eq!(dashboard.feed().filter(), PostFilter::Trending);
        assert_eq!(dashboard.feed().posts().len(), 4);
        assert!(dashboard.resources().is_empty());
        assert_eq!(dashboard.feed().identity().name, "Ada");
    }

    #[tokio::test]
    async fn test_open_without_session_is_unauthorized() {
        let backend = Arc::new(MemoryBackend::new());
        let result =
            Dashboard::open(backend.clone(), Arc::new(PrintLinkSharer), AppConfig::default())
                .await;

        assert!(matches!(result, Err(DevfeedError::Unauthorized(_))));
        assert_eq!(backend.call_count(BackendCall::ListDocuments), 0);
    }

    #[tokio::test]
    async fn test_open_survives_seed_failure() {
        let backend = backend();
        backend.fail_next(BackendCall::CreateDocument);

        let dashboard = open(&backend).await;
        assert!(dashboard.feed().posts().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_does_not_reseed() {
        let backend = backend();
        open(&backend).await;
        let dashboard = open(&backend).await;

        assert_eq!(backend.documents("posts").len(), 4);
        assert_eq!(dashboard.feed().posts().len(), 4);
    }

    #[tokio::test]
    async fn test_create_post_reloads_current_filter() {
        let backend = backend();
        let dashboard = open(&backend).await;
        dashboard.feed().load_posts(PostFilter::Recent).await.unwrap();
        dashboard.feed().take_notices();

        let post = dashboard
            .create_post(NewPost::new("Hello", "First post"))
            .await
            .unwrap();

        assert_eq!(post.author_name, "Ada");
        assert_eq!(post.likes, 0);
        let posts = dashboard.feed().posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, post.id);
        assert_eq!(
            dashboard.feed().take_notices(),
            vec![Notice::success("Post created successfully!")]
        );
    }

    #[tokio::test]
    async fn test_create_post_requires_title_and_content() {
        let backend = backend();
        let dashboard = open(&backend).await;
        let creates = backend.call_count(BackendCall::CreateDocument);

        assert!(dashboard.create_post(NewPost::new("", "body")).await.is_err());
        assert!(dashboard.create_post(NewPost::new("title", "  ")).await.is_err());
        assert_eq!(backend.call_count(BackendCall::CreateDocument), creates);
    }

    #[tokio::test]
    async fn test_resources_newest_first() {
        let backend = backend();
        let dashboard = open(&backend).await;

        dashboard.create_resource(link("first")).await.unwrap();
        dashboard.create_resource(link("second")).await.unwrap();

        let titles: Vec<String> = dashboard.resources().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[tokio::test]
    async fn test_failed_resource_load_keeps_list() {
        let backend = backend();
        let dashboard = open(&backend).await;
        dashboard.create_resource(link("kept")).await.unwrap();
        dashboard.feed().take_notices();

        backend.fail_next(BackendCall::ListDocuments);
        assert!(dashboard.load_resources().await.is_err());

        assert_eq!(dashboard.resources().len(), 1);
        assert_eq!(
            dashboard.feed().take_notices(),
            vec![Notice::error("Failed to fetch resources")]
        );
    }

    #[tokio::test]
    async fn test_undecodable_resource_is_skipped() {
        let backend = backend();
        let dashboard = open(&backend).await;
        dashboard.create_resource(link("good")).await.unwrap();

        let mut broken = crate::backend::Fields::new();
        broken.insert("title".to_string(), serde_json::json!("no url"));
        backend.create_document("resources", broken).await.unwrap();

        assert_eq!(dashboard.load_resources().await.unwrap(), 1);
        assert_eq!(dashboard.resources()[0].title, "good");
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let backend = backend();
        let dashboard = open(&backend).await;

        dashboard.logout().await.unwrap();
        assert!(backend.get_session().await.is_err());
        assert!(dashboard.logout().await.is_err());
    }
}
