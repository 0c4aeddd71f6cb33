//! Home feed and category page.

use serde::Serialize;

use super::format::short_date;
use crate::domain::{CATEGORY_EXCERPT_CHARS, HOME_EXCERPT_CHARS, Post, PostCollection, excerpt};

/// Cards shown in the home page's latest-posts grid.
pub const LATEST_LIMIT: usize = 9;

/// Label used when a post carries neither an author name nor an email.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One post as a feed card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCard {
    /// Post id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Author name, falling back to email then `Unknown`.
    pub author: String,
    /// Short date or `Unknown`.
    pub date: String,
    /// Tag-stripped body preview.
    pub excerpt: String,
    /// Category label.
    pub category: String,
    /// Cover image, if any.
    pub image_url: Option<String>,
    /// Link to the detail page.
    pub href: String,
}

impl PostCard {
    fn from_post(post: &Post, excerpt_chars: usize) -> Self {
        let author = [&post.author_display_name, &post.author_email]
            .into_iter()
            .find(|value| !value.trim().is_empty())
            .map_or_else(|| UNKNOWN_AUTHOR.to_owned(), |value| value.clone());
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            author,
            date: short_date(post.created_at),
            excerpt: excerpt(&post.body_html, excerpt_chars),
            category: post.category.to_string(),
            image_url: Some(post.image_url.clone()).filter(|url| !url.is_empty()),
            href: format!("/Blog/{}", post.id),
        }
    }
}

/// Home page view model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomeFeed {
    /// Newest post; `None` renders the "no featured post" placeholder.
    pub featured: Option<PostCard>,
    /// Newest posts, at most [`LATEST_LIMIT`].
    pub latest: Vec<PostCard>,
}

/// Build the home feed from the collection.
pub fn home_feed(posts: &PostCollection) -> HomeFeed {
    let card = |post: &Post| PostCard::from_post(post, HOME_EXCERPT_CHARS);
    HomeFeed {
        featured: posts.featured().map(card),
        latest: posts.posts().iter().take(LATEST_LIMIT).map(card).collect(),
    }
}

/// Category page view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    /// Category named by the route.
    pub category: String,
    /// Matching posts, newest first.
    pub cards: Vec<PostCard>,
    /// Whether the explicit empty state should be shown.
    pub is_empty: bool,
}

/// Build a category page. Matching is case-insensitive.
pub fn category_page(posts: &PostCollection, category: &str) -> CategoryPage {
    let cards: Vec<PostCard> = posts
        .in_category(category)
        .map(|post| PostCard::from_post(post, CATEGORY_EXCERPT_CHARS))
        .collect();
    CategoryPage {
        category: category.to_owned(),
        is_empty: cards.is_empty(),
        cards,
    }
}
