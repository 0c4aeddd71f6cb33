//! Boundary between raw store documents and typed posts.
//!
//! Raw data becomes a [`Post`] only through [`post_from_document`]; writes
//! are shaped only through [`fields_for_create`] and [`fields_for_changes`].
//! Field names follow the stored document shape of the `blogs` collection.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::ports::{CREATED_AT_FIELD, DocumentFields, StoredDocument};
use super::{Author, Category, Error, Post, PostChanges, PostDraft, PostId, Tags};

/// Collection holding blog posts.
pub const POSTS_COLLECTION: &str = "blogs";

const TITLE: &str = "title";
const CONTENT_HTML: &str = "contentHtml";
const IMAGE_URL: &str = "imageUrl";
const AUTHOR_EMAIL: &str = "authorEmail";
const AUTHOR_NAME: &str = "authorName";
const CATEGORY: &str = "category";
const USER_SECTION: &str = "userSection";
const TAGS: &str = "tags";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PostFields {
    title: Option<String>,
    content_html: Option<String>,
    image_url: Option<String>,
    author_email: Option<String>,
    author_name: Option<String>,
    category: Option<String>,
    user_section: Option<bool>,
    tags: Option<Vec<String>>,
    created_at: Option<Value>,
}

/// Turn a stored document into a typed post.
///
/// Missing or null fields normalise to empty values; the category falls back
/// to the default and the timestamp to `None` when unreadable.
///
/// # Errors
/// Returns an internal error when the id is blank or a present field has the
/// wrong JSON type.
pub fn post_from_document(document: StoredDocument) -> Result<Post, Error> {
    let StoredDocument { id, fields } = document;
    let post_id = PostId::new(id)
        .map_err(|err| Error::internal(format!("stored post has an invalid id: {err}")))?;
    let raw: PostFields = serde_json::from_value(Value::Object(fields)).map_err(|err| {
        Error::internal(format!("stored post {post_id} could not be decoded: {err}"))
    })?;

    Ok(Post {
        title: raw.title.unwrap_or_default(),
        body_html: raw.content_html.unwrap_or_default(),
        image_url: raw.image_url.unwrap_or_default(),
        category: Category::new(raw.category.unwrap_or_default()),
        tags: raw.tags.map(Tags::from).unwrap_or_default(),
        author_email: raw.author_email.unwrap_or_default(),
        author_display_name: raw.author_name.unwrap_or_default(),
        created_at: raw.created_at.as_ref().and_then(normalize_timestamp),
        user_section: raw.user_section.unwrap_or(false),
        id: post_id,
    })
}

/// Read a store timestamp in any of the shapes it may take.
///
/// Accepts `{seconds, nanoseconds}` objects (optionally underscore
/// prefixed), epoch milliseconds and RFC 3339 strings.
///
/// # Examples
/// ```
/// use blogverse::domain::normalize_timestamp;
/// use serde_json::json;
///
/// let parsed = normalize_timestamp(&json!({"seconds": 0, "nanoseconds": 0}));
/// assert_eq!(parsed.map(|ts| ts.timestamp()), Some(0));
/// assert!(normalize_timestamp(&json!("not a date")).is_none());
/// ```
pub fn normalize_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .and_then(|nanos| u32::try_from(nanos).ok())
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, nanos).single()
        }
        Value::Number(number) => Utc.timestamp_millis_opt(number.as_i64()?).single(),
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc)),
        _ => None,
    }
}

/// Shape the stored fields for a new post.
///
/// [`CREATED_AT_FIELD`] is left out: the store stamps it.
pub fn fields_for_create(draft: &PostDraft, author: &Author, image_url: &str) -> DocumentFields {
    let mut fields = DocumentFields::new();
    fields.insert(TITLE.to_owned(), json!(draft.title));
    fields.insert(CONTENT_HTML.to_owned(), json!(draft.body_html));
    fields.insert(IMAGE_URL.to_owned(), json!(image_url));
    fields.insert(AUTHOR_EMAIL.to_owned(), json!(author.email().as_ref()));
    fields.insert(
        AUTHOR_NAME.to_owned(),
        json!(author.display_name().map_or("", |name| name.as_ref())),
    );
    fields.insert(CATEGORY.to_owned(), json!(draft.category.as_ref()));
    fields.insert(USER_SECTION.to_owned(), json!(draft.user_section));
    fields.insert(
        TAGS.to_owned(),
        json!(Tags::parse(&draft.tags_input).as_slice()),
    );
    debug_assert!(!fields.contains_key(CREATED_AT_FIELD));
    fields
}

/// Shape a partial update containing only the changed fields.
pub fn fields_for_changes(changes: &PostChanges) -> DocumentFields {
    let mut fields = DocumentFields::new();
    if let Some(title) = &changes.title {
        fields.insert(TITLE.to_owned(), json!(title));
    }
    if let Some(body_html) = &changes.body_html {
        fields.insert(CONTENT_HTML.to_owned(), json!(body_html));
    }
    if let Some(image_url) = &changes.image_url {
        fields.insert(IMAGE_URL.to_owned(), json!(image_url));
    }
    if let Some(category) = &changes.category {
        fields.insert(CATEGORY.to_owned(), json!(category.as_ref()));
    }
    if let Some(tags) = &changes.tags {
        fields.insert(TAGS.to_owned(), json!(tags.as_slice()));
    }
    if let Some(user_section) = changes.user_section {
        fields.insert(USER_SECTION.to_owned(), json!(user_section));
    }
    fields
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{DisplayName, EmailAddress, ErrorCode};
    use rstest::rstest;

    fn document(fields: Value) -> StoredDocument {
        let Value::Object(map) = fields else {
            panic!("fixture fields must be an object");
        };
        StoredDocument::new("post-1", map)
    }

    #[rstest]
    #[case(json!({"seconds": 1_700_000_000, "nanoseconds": 5}), Some(1_700_000_000))]
    #[case(json!({"_seconds": 1_700_000_000, "_nanoseconds": 0}), Some(1_700_000_000))]
    #[case(json!(1_700_000_000_000_i64), Some(1_700_000_000))]
    #[case(json!("2023-11-14T22:13:20Z"), Some(1_700_000_000))]
    #[case(json!("yesterday"), None)]
    #[case(json!(null), None)]
    #[case(json!({"nanoseconds": 1}), None)]
    fn timestamps_normalise_from_every_shape(#[case] raw: Value, #[case] expected: Option<i64>) {
        assert_eq!(
            normalize_timestamp(&raw).map(|ts| ts.timestamp()),
            expected
        );
    }

    #[rstest]
    fn sparse_document_normalises_to_defaults() {
        let post = post_from_document(document(json!({"title": "Hello"}))).expect("decodes");
        assert_eq!(post.title, "Hello");
        assert_eq!(post.category.as_ref(), "General");
        assert!(post.tags.is_empty());
        assert!(post.created_at.is_none());
        assert!(!post.user_section);
        assert_eq!(post.image_url, "");
    }

    #[rstest]
    fn full_document_maps_every_field() {
        let post = post_from_document(document(json!({
            "title": "T",
            "contentHtml": "<p>x</p>",
            "imageUrl": "https://img/x.png",
            "authorEmail": "admin@example.com",
            "authorName": "Ada",
            "category": "News",
            "userSection": true,
            "tags": ["a", " a", "b"],
            "createdAt": {"seconds": 10, "nanoseconds": 0},
        })))
        .expect("decodes");
        assert_eq!(post.body_html, "<p>x</p>");
        assert_eq!(post.author_display_name, "Ada");
        assert_eq!(post.tags.as_slice(), ["a", "b"]);
        assert!(post.user_section);
        assert_eq!(post.created_at.map(|ts| ts.timestamp()), Some(10));
    }

    #[rstest]
    fn wrong_field_type_is_an_internal_error() {
        let err = post_from_document(document(json!({"tags": "a,b"}))).expect_err("bad tags");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    fn create_fields_carry_author_and_normalised_tags() {
        let author = Author::new(
            EmailAddress::new("admin@example.com").expect("email"),
            Some(DisplayName::new("Ada").expect("name")),
        );
        let draft = PostDraft {
            title: "Hello".to_owned(),
            tags_input: "react, , firebase ,react".to_owned(),
            ..PostDraft::default()
        };
        let fields = fields_for_create(&draft, &author, "");
        assert_eq!(fields[TAGS], json!(["react", "firebase"]));
        assert_eq!(fields[AUTHOR_NAME], json!("Ada"));
        assert_eq!(fields[CATEGORY], json!("General"));
        assert!(!fields.contains_key(CREATED_AT_FIELD));
    }

    #[rstest]
    fn change_fields_skip_absent_values() {
        let changes = PostChanges {
            title: Some("X".to_owned()),
            ..PostChanges::default()
        };
        let fields = fields_for_changes(&changes);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[TITLE], json!("X"));
    }
}
