//! Admin dashboard table.

use serde::Serialize;

use super::format::short_date;
use crate::domain::{PostCollection, ProfileState};

/// One post row in the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    /// 1-based position in the table.
    pub position: usize,
    /// Post id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Category label.
    pub category: String,
    /// Short date or `Unknown`.
    pub date: String,
    /// Normalised tags.
    pub tags: Vec<String>,
    /// Link to the editor for this post.
    pub edit_href: String,
}

/// Dashboard view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Saved display name shown in the "uploaded by" column.
    pub display_name: Option<String>,
    /// Whether a profile save is in flight.
    pub saving: bool,
    /// Last profile error, rendered as a banner.
    pub profile_error: Option<String>,
    /// One row per post, newest first.
    pub rows: Vec<DashboardRow>,
}

/// Build the dashboard from the collection and profile state.
pub fn dashboard(posts: &PostCollection, profile: &ProfileState) -> Dashboard {
    let rows = posts
        .posts()
        .iter()
        .enumerate()
        .map(|(index, post)| DashboardRow {
            position: index + 1,
            id: post.id.to_string(),
            title: post.title.clone(),
            category: post.category.to_string(),
            date: short_date(post.created_at),
            tags: post.tags.as_slice().to_vec(),
            edit_href: format!("/EditBlog/{}", post.id),
        })
        .collect();
    Dashboard {
        display_name: profile.display_name().map(ToString::to_string),
        saving: profile.is_saving(),
        profile_error: profile.last_error().map(|err| err.message().to_owned()),
        rows,
    }
}
