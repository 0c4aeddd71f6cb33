//! Single post page.
//!
//! The page owns a liveness flag: a load that completes after the page was
//! closed is dropped instead of being applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use super::format::long_date;
use crate::domain::{Post, PostId, PostRepository, sanitize};

/// Message shown when the post cannot be fetched.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load the blog. Please try again.";

/// Post ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPost {
    /// Post id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Sanitised body HTML.
    pub body_html: String,
    /// Cover image, if any.
    pub image_url: Option<String>,
    /// Author name, or email when no name was saved.
    pub author: String,
    /// Category label.
    pub category: String,
    /// Normalised tags.
    pub tags: Vec<String>,
    /// Long date such as `19 October 2026`.
    pub date: Option<String>,
}

impl From<&Post> for ReadyPost {
    fn from(post: &Post) -> Self {
        let author = if post.author_display_name.trim().is_empty() {
            post.author_email.clone()
        } else {
            post.author_display_name.clone()
        };
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            body_html: sanitize(&post.body_html),
            image_url: Some(post.image_url.clone()).filter(|url| !url.is_empty()),
            author,
            category: post.category.to_string(),
            tags: post.tags.as_slice().to_vec(),
            date: long_date(post.created_at),
        }
    }
}

/// Render state of the detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "post", rename_all = "camelCase")]
pub enum PostDetail {
    /// Fetch in flight.
    #[default]
    Loading,
    /// The id does not exist.
    NotFound,
    /// The fetch failed; carries the user-facing message.
    Failed(String),
    /// The post is ready.
    Ready(Box<ReadyPost>),
}

/// Open detail page for one post id.
pub struct PostDetailView {
    id: PostId,
    state: Arc<watch::Sender<PostDetail>>,
    alive: Arc<AtomicBool>,
}

impl PostDetailView {
    /// Open the page in the loading state.
    pub fn open(id: PostId) -> Self {
        let (state, _) = watch::channel(PostDetail::Loading);
        Self {
            id,
            state: Arc::new(state),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Id the page shows.
    pub fn id(&self) -> &PostId {
        &self.id
    }

    /// Current render state.
    pub fn state(&self) -> PostDetail {
        self.state.borrow().clone()
    }

    /// Receiver woken when the render state changes.
    pub fn subscribe(&self) -> watch::Receiver<PostDetail> {
        self.state.subscribe()
    }

    /// Future that fetches the post and applies the result while the page is
    /// still open. Resolves to whether the result was applied.
    pub fn load(&self, repository: PostRepository) -> impl Future<Output = bool> + Send + 'static {
        let id = self.id.clone();
        let state = Arc::clone(&self.state);
        let alive = Arc::clone(&self.alive);
        async move {
            let outcome = match repository.get_by_id(&id).await {
                Ok(Some(post)) => PostDetail::Ready(Box::new(ReadyPost::from(&post))),
                Ok(None) => PostDetail::NotFound,
                Err(err) => {
                    debug!(%id, error = %err, "post detail load failed");
                    PostDetail::Failed(LOAD_FAILED_MESSAGE.to_owned())
                }
            };
            if !alive.load(Ordering::SeqCst) {
                debug!(%id, "post detail closed before load finished");
                return false;
            }
            state.send_replace(outcome);
            true
        }
    }
}

impl Drop for PostDetailView {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        DocumentStoreError, MockDocumentStore, MockImageUploader, StoredDocument,
    };

    fn repository(store: MockDocumentStore) -> PostRepository {
        PostRepository::new(Arc::new(store), Arc::new(MockImageUploader::new()), "preset")
    }

    fn stored_post() -> StoredDocument {
        let Value::Object(fields) = json!({
            "title": "Hello",
            "contentHtml": "<p onclick=\"x\">Body<script>bad()</script></p>",
            "authorEmail": "admin@example.com",
            "authorName": "",
            "tags": ["rust"],
            "createdAt": {"seconds": 1_792_411_200_i64, "nanoseconds": 0},
        }) else {
            panic!("object literal");
        };
        StoredDocument::new("p1", fields)
    }

    #[rstest]
    #[tokio::test]
    async fn ready_post_is_sanitised_with_long_date() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .returning(|_, _| Ok(Some(stored_post())));
        let view = PostDetailView::open(PostId::new("p1").expect("id"));
        assert_eq!(view.state(), PostDetail::Loading);

        assert!(view.load(repository(store)).await);

        let PostDetail::Ready(post) = view.state() else {
            panic!("expected ready state");
        };
        assert_eq!(post.body_html, "<p>Body</p>");
        assert_eq!(post.date.as_deref(), Some("19 October 2026"));
        assert_eq!(post.author, "admin@example.com");
    }

    #[rstest]
    #[case(Ok(None), PostDetail::NotFound)]
    #[case(
        Err(DocumentStoreError::unavailable("offline")),
        PostDetail::Failed(LOAD_FAILED_MESSAGE.to_owned())
    )]
    #[tokio::test]
    async fn missing_and_failed_states(
        #[case] response: Result<Option<StoredDocument>, DocumentStoreError>,
        #[case] expected: PostDetail,
    ) {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .return_once(move |_, _| response);
        let view = PostDetailView::open(PostId::new("p1").expect("id"));

        assert!(view.load(repository(store)).await);
        assert_eq!(view.state(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn result_after_close_is_discarded() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .returning(|_, _| Ok(Some(stored_post())));
        let view = PostDetailView::open(PostId::new("p1").expect("id"));
        let receiver = view.subscribe();
        let pending = view.load(repository(store));

        drop(view);

        assert!(!pending.await);
        assert_eq!(*receiver.borrow(), PostDetail::Loading);
    }

    #[rstest]
    fn serialises_with_state_tag() {
        assert_eq!(
            serde_json::to_value(PostDetail::NotFound).expect("json"),
            json!({"state": "notFound"})
        );
    }
}
