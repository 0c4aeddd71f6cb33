//! In-memory post collection and its reducer.
//!
//! The collection is the only shared mutable state of the content layer.
//! Mutations are expressed as upsert/patch/remove keyed by post id, and every
//! mutation restores the ordering invariant:
//! - newest `created_at` first,
//! - posts with an unknown timestamp last,
//! - ties broken by ascending id so the order is deterministic.

use std::cmp::Ordering;

use super::{Error, Post, PostChanges, PostId};

/// Lifecycle of the most recent list request.
///
/// `Rejected` never moves back to `Pending` by itself; a fresh request is
/// required.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Pending,
    /// The last request succeeded.
    Fulfilled,
    /// The last request failed; previously loaded items are kept.
    Rejected(Error),
}

impl LoadState {
    /// Error carried by a rejected request.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Rejected(error) => Some(error),
            _ => None,
        }
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

fn newest_first(left: &Post, right: &Post) -> Ordering {
    match (left.created_at, right.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| left.id.cmp(&right.id))
}

/// Sorted, id-keyed sequence of posts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostCollection {
    posts: Vec<Post>,
}

impl PostCollection {
    /// Build a collection, sorting and collapsing duplicate ids (last wins).
    pub fn from_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let mut collection = Self::default();
        collection.replace_all(posts);
        collection
    }

    /// Replace the whole contents with a freshly fetched list.
    pub fn replace_all(&mut self, posts: impl IntoIterator<Item = Post>) {
        self.posts.clear();
        for post in posts {
            self.insert_unsorted(post);
        }
        self.posts.sort_by(newest_first);
    }

    fn insert_unsorted(&mut self, post: Post) {
        match self.posts.iter_mut().find(|existing| existing.id == post.id) {
            Some(existing) => *existing = post,
            None => self.posts.push(post),
        }
    }

    /// Insert a post or replace the entry with the same id.
    pub fn upsert(&mut self, post: Post) {
        self.insert_unsorted(post);
        self.posts.sort_by(newest_first);
    }

    /// Merge changes onto the entry with `id`, returning the patched post.
    pub fn patch(&mut self, id: &PostId, changes: &PostChanges) -> Option<Post> {
        let post = self.posts.iter_mut().find(|post| &post.id == id)?;
        changes.apply_to(post);
        let patched = post.clone();
        self.posts.sort_by(newest_first);
        Some(patched)
    }

    /// Remove the entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &PostId) -> bool {
        let before = self.posts.len();
        self.posts.retain(|post| &post.id != id);
        self.posts.len() != before
    }

    /// Look up a post by id.
    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    /// All posts, newest first.
    pub fn posts(&self) -> &[Post] {
        self.posts.as_slice()
    }

    /// Posts whose category matches `category` case-insensitively, newest
    /// first.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts
            .iter()
            .filter(move |post| post.category.matches(category))
    }

    /// Newest post, shown as the featured entry on the home feed.
    pub fn featured(&self) -> Option<&Post> {
        self.posts.first()
    }

    /// Number of posts held.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether the collection holds no posts.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
