//! Blog post aggregate and the drafts used to create or change it.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DisplayName, EmailAddress};

/// Category used when the editor leaves the field blank.
pub const DEFAULT_CATEGORY: &str = "General";

/// Categories offered by the post editor.
pub const KNOWN_CATEGORIES: [&str; 4] = ["General", "Programming", "Technology", "News"];

/// Validation errors for post value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostValidationError {
    /// The post id was empty.
    EmptyId,
}

impl fmt::Display for PostValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "post id must not be empty"),
        }
    }
}

impl std::error::Error for PostValidationError {}

/// Store-assigned post identifier. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostId(String);

impl PostId {
    /// Validate and construct a [`PostId`].
    pub fn new(id: impl Into<String>) -> Result<Self, PostValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PostValidationError::EmptyId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for PostId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PostId> for String {
    fn from(value: PostId) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostId {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Post category; matched case-insensitively by category pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Trim the input, falling back to [`DEFAULT_CATEGORY`] when blank.
    pub fn new(category: impl AsRef<str>) -> Self {
        let trimmed = category.as_ref().trim();
        if trimmed.is_empty() {
            Self(DEFAULT_CATEGORY.to_owned())
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Case-insensitive exact comparison with a route segment.
    ///
    /// # Examples
    /// ```
    /// use blogverse::domain::Category;
    ///
    /// assert!(Category::new("Programming").matches("programming"));
    /// assert!(!Category::new("Programming").matches("program"));
    /// ```
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.trim().to_lowercase()
    }
}

impl Default for Category {
    fn default() -> Self {
        Self(DEFAULT_CATEGORY.to_owned())
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

/// Ordered tag list.
///
/// ## Invariants
/// - Every tag is trimmed and non-empty.
/// - No tag appears twice; the first occurrence keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);

impl Tags {
    /// Parse the comma separated editor input.
    ///
    /// # Examples
    /// ```
    /// use blogverse::domain::Tags;
    ///
    /// let tags = Tags::parse("react, , firebase ,react");
    /// assert_eq!(tags.as_slice(), ["react", "firebase"]);
    /// ```
    pub fn parse(input: &str) -> Self {
        input.split(',').collect()
    }

    /// Borrow the tags in order.
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }

    /// Join back into the editor's comma separated form.
    pub fn to_input(&self) -> String {
        self.0.join(", ")
    }

    /// Whether no tags remain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let tags = iter
            .into_iter()
            .filter_map(|tag| {
                let trimmed = tag.as_ref().trim();
                (!trimmed.is_empty() && seen.insert(trimmed.to_owned()))
                    .then(|| trimmed.to_owned())
            })
            .collect();
        Self(tags)
    }
}

impl From<Vec<String>> for Tags {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Tags> for Vec<String> {
    fn from(value: Tags) -> Self {
        value.0
    }
}

/// A stored blog post in its normalised, typed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Store-assigned identifier.
    pub id: PostId,
    /// Headline.
    pub title: String,
    /// Raw editor HTML; sanitise before rendering.
    pub body_html: String,
    /// Public image URL, empty when no image was attached or upload failed.
    pub image_url: String,
    /// Category the post is filed under.
    pub category: Category,
    /// Normalised tags.
    pub tags: Tags,
    /// Email of the author at write time.
    pub author_email: String,
    /// Display name of the author at write time, possibly empty.
    pub author_display_name: String,
    /// Store write time; `None` when the stored value was unreadable.
    pub created_at: Option<DateTime<Utc>>,
    /// Show the post under the author's own section.
    pub user_section: bool,
}

/// Image selected in the editor, uploaded before the post is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name.
    pub file_name: String,
    /// MIME type reported by the picker, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Client-held fields for a post that has not been written yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    /// Headline.
    pub title: String,
    /// Editor HTML.
    pub body_html: String,
    /// Category picked in the editor.
    pub category: Category,
    /// Comma separated tag input.
    pub tags_input: String,
    /// Show under the author's section.
    pub user_section: bool,
    /// Optional image to upload first.
    pub image: Option<ImageFile>,
}

/// Partial update for an existing post. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement editor HTML.
    pub body_html: Option<String>,
    /// Replacement category.
    pub category: Option<Category>,
    /// Replacement comma separated tag input.
    pub tags_input: Option<String>,
    /// Replacement visibility flag.
    pub user_section: Option<bool>,
    /// Replacement image to upload.
    pub image: Option<ImageFile>,
}

impl PostPatch {
    /// Patch that only replaces the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Resolve the patch into store-ready changes once any image upload has
    /// finished.
    pub fn into_changes(self, image_url: Option<String>) -> PostChanges {
        PostChanges {
            title: self.title,
            body_html: self.body_html,
            image_url,
            category: self.category,
            tags: self.tags_input.as_deref().map(Tags::parse),
            user_section: self.user_section,
        }
    }
}

/// Store-ready partial update, produced from a [`PostPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement editor HTML.
    pub body_html: Option<String>,
    /// Replacement image URL.
    pub image_url: Option<String>,
    /// Replacement category.
    pub category: Option<Category>,
    /// Replacement tags.
    pub tags: Option<Tags>,
    /// Replacement visibility flag.
    pub user_section: Option<bool>,
}

impl PostChanges {
    /// Whether the changes would leave every field untouched.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the present fields onto `post`.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title.clone_from(title);
        }
        if let Some(body_html) = &self.body_html {
            post.body_html.clone_from(body_html);
        }
        if let Some(image_url) = &self.image_url {
            post.image_url.clone_from(image_url);
        }
        if let Some(category) = &self.category {
            post.category = category.clone();
        }
        if let Some(tags) = &self.tags {
            post.tags = tags.clone();
        }
        if let Some(user_section) = self.user_section {
            post.user_section = user_section;
        }
    }
}

/// Proof that the caller holds the allowed, authenticated identity.
///
/// Only the identity gate hands these out, so repository writes cannot be
/// issued without passing through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    email: EmailAddress,
    display_name: Option<DisplayName>,
}

impl Author {
    pub(crate) fn new(email: EmailAddress, display_name: Option<DisplayName>) -> Self {
        Self {
            email,
            display_name,
        }
    }

    /// Email stamped onto new posts.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Display name stamped onto new posts, if one has been saved.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }
}
