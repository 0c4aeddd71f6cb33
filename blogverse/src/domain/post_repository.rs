//! CRUD facade over the remote `blogs` collection.
//!
//! The repository owns the in-memory [`PostCollection`] and the load state of
//! the last list request. Every successful mutation is folded into the
//! collection through the reducer and broadcast to subscribers.
//!
//! Writes take an [`Author`], which only the identity gate hands out.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::collection::{LoadState, PostCollection};
use super::ports::{DocumentStore, DocumentStoreError, ImageUploader, StoredDocument};
use super::post_document::{
    POSTS_COLLECTION, fields_for_changes, fields_for_create, post_from_document,
};
use super::{Author, Error, ImageFile, Post, PostDraft, PostId, PostPatch};

/// Snapshot broadcast to views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryState {
    /// Posts known to the client, newest first.
    pub posts: PostCollection,
    /// Outcome of the last list request.
    pub load: LoadState,
}

fn store_error(err: DocumentStoreError) -> Error {
    match err {
        DocumentStoreError::Missing { collection, id } => {
            Error::not_found(format!("{collection}/{id} does not exist"))
        }
        other => Error::fetch_failed(other.to_string()),
    }
}

/// Content repository over the document store and image host.
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
    uploader: Arc<dyn ImageUploader>,
    upload_preset: String,
    state: Arc<watch::Sender<RepositoryState>>,
}

impl PostRepository {
    /// Create a repository with an empty collection.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        uploader: Arc<dyn ImageUploader>,
        upload_preset: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(RepositoryState::default());
        Self {
            store,
            uploader,
            upload_preset: upload_preset.into(),
            state: Arc::new(state),
        }
    }

    /// Snapshot of the collection and load state.
    pub fn state(&self) -> RepositoryState {
        self.state.borrow().clone()
    }

    /// Receiver woken on every change to the collection or load state.
    pub fn subscribe(&self) -> watch::Receiver<RepositoryState> {
        self.state.subscribe()
    }

    /// Fetch the whole collection and replace the client copy.
    ///
    /// Documents that cannot be decoded are skipped with a warning.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the store read fails. The load state moves
    /// to `Rejected` and previously loaded posts are kept.
    pub async fn list_all(&self) -> Result<Vec<Post>, Error> {
        self.state.send_modify(|state| state.load = LoadState::Pending);

        match self.store.list_collection(POSTS_COLLECTION).await {
            Ok(documents) => {
                let posts: Vec<Post> = documents
                    .into_iter()
                    .filter_map(|document| {
                        let id = document.id.clone();
                        post_from_document(document)
                            .inspect_err(|err| {
                                warn!(id = %id, error = %err, "skipping undecodable post");
                            })
                            .ok()
                    })
                    .collect();
                debug!(count = posts.len(), "posts fetched");
                let mut sorted = Vec::new();
                self.state.send_modify(|state| {
                    state.posts.replace_all(posts);
                    state.load = LoadState::Fulfilled;
                    sorted = state.posts.posts().to_vec();
                });
                Ok(sorted)
            }
            Err(err) => {
                error!(error = %err, "post list fetch failed");
                let error = Error::fetch_failed(err.to_string());
                self.state
                    .send_modify(|state| state.load = LoadState::Rejected(error.clone()));
                Err(error)
            }
        }
    }

    /// Fetch one post. `Ok(None)` means the id does not exist.
    ///
    /// A found post is also folded into the client collection.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the store read fails and `internal_error`
    /// when the stored document cannot be decoded.
    pub async fn get_by_id(&self, id: &PostId) -> Result<Option<Post>, Error> {
        let document = self
            .store
            .get_document(POSTS_COLLECTION, id.as_ref())
            .await
            .map_err(|err| {
                error!(%id, error = %err, "post fetch failed");
                Error::fetch_failed(err.to_string())
            })?;
        let Some(document) = document else {
            debug!(%id, "post not found");
            return Ok(None);
        };
        let post = post_from_document(document)?;
        self.state.send_modify(|state| state.posts.upsert(post.clone()));
        Ok(Some(post))
    }

    async fn upload_or_empty(&self, image: &ImageFile) -> Option<String> {
        match self.uploader.upload(image, &self.upload_preset).await {
            Ok(url) => Some(url.to_string()),
            Err(err) => {
                warn!(file = %image.file_name, error = %err, "image upload failed; continuing without image");
                None
            }
        }
    }

    /// Write a new post.
    ///
    /// An attached image is uploaded first; when that fails the post is
    /// written with an empty image URL.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the store write fails.
    pub async fn create(&self, author: &Author, draft: PostDraft) -> Result<Post, Error> {
        let image_url = match &draft.image {
            Some(image) => self.upload_or_empty(image).await.unwrap_or_default(),
            None => String::new(),
        };
        let fields = fields_for_create(&draft, author, &image_url);
        let raw_id = self
            .store
            .create_document(POSTS_COLLECTION, fields.clone())
            .await
            .map_err(|err| {
                error!(author = %author.email(), error = %err, "post create failed");
                store_error(err)
            })?;
        let id = PostId::new(raw_id)
            .map_err(|err| Error::internal(format!("store assigned an invalid id: {err}")))?;

        let post = match self.store.get_document(POSTS_COLLECTION, id.as_ref()).await {
            Ok(Some(document)) => post_from_document(document)?,
            Ok(None) | Err(_) => {
                warn!(%id, "created post could not be read back; store time unknown");
                post_from_document(StoredDocument::new(id.as_ref(), fields))?
            }
        };
        info!(%id, author = %author.email(), "post created");
        self.state.send_modify(|state| state.posts.upsert(post.clone()));
        Ok(post)
    }

    /// Merge the fields present in `patch` into an existing post.
    ///
    /// A replacement image that fails to upload clears the image URL, as
    /// [`PostRepository::create`] does.
    ///
    /// # Errors
    /// Returns `not_found` for an unknown id and `fetch_failed` when the store
    /// write fails.
    pub async fn update(&self, author: &Author, id: &PostId, patch: PostPatch) -> Result<Post, Error> {
        let image_url = match &patch.image {
            Some(image) => Some(self.upload_or_empty(image).await.unwrap_or_default()),
            None => None,
        };
        let changes = patch.into_changes(image_url);
        self.store
            .update_document(POSTS_COLLECTION, id.as_ref(), fields_for_changes(&changes))
            .await
            .map_err(|err| {
                warn!(%id, author = %author.email(), error = %err, "post update failed");
                store_error(err)
            })?;

        let mut patched = None;
        self.state
            .send_modify(|state| patched = state.posts.patch(id, &changes));
        let post = match patched {
            Some(post) => post,
            None => self
                .get_by_id(id)
                .await?
                .ok_or_else(|| Error::not_found(format!("post {id} does not exist")))?,
        };
        info!(%id, author = %author.email(), "post updated");
        Ok(post)
    }

    /// Remove a post. Removing an absent id succeeds.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the store delete fails.
    pub async fn delete(&self, author: &Author, id: &PostId) -> Result<(), Error> {
        self.store
            .delete_document(POSTS_COLLECTION, id.as_ref())
            .await
            .map_err(|err| {
                warn!(%id, author = %author.email(), error = %err, "post delete failed");
                store_error(err)
            })?;
        self.state.send_if_modified(|state| state.posts.remove(id));
        info!(%id, author = %author.email(), "post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
