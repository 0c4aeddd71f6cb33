//! Repository behaviour against mocked store and uploader ports.

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use url::Url;

use super::*;
use crate::domain::ports::{
    DocumentFields, ImageUploadError, MockDocumentStore, MockImageUploader,
};
use crate::domain::{DisplayName, EmailAddress, ErrorCode, Tags};

fn fields(value: Value) -> DocumentFields {
    let Value::Object(map) = value else {
        panic!("fixture fields must be an object");
    };
    map
}

fn stored(id: &str, title: &str, seconds: i64, category: &str) -> StoredDocument {
    StoredDocument::new(
        id,
        fields(json!({
            "title": title,
            "category": category,
            "createdAt": {"seconds": seconds, "nanoseconds": 0},
        })),
    )
}

#[fixture]
fn author() -> Author {
    Author::new(
        EmailAddress::new("admin@example.com").expect("email"),
        Some(DisplayName::new("Ada").expect("name")),
    )
}

fn image() -> ImageFile {
    ImageFile {
        file_name: "cover.png".to_owned(),
        content_type: Some("image/png".to_owned()),
        bytes: vec![1, 2, 3],
    }
}

fn repository(store: MockDocumentStore, uploader: MockImageUploader) -> PostRepository {
    PostRepository::new(Arc::new(store), Arc::new(uploader), "preset")
}

#[rstest]
#[tokio::test]
async fn list_all_sorts_and_fulfils() {
    let mut store = MockDocumentStore::new();
    store
        .expect_list_collection()
        .withf(|collection| collection == POSTS_COLLECTION)
        .times(1)
        .returning(|_| {
            Ok(vec![
                stored("t1", "one", 1, "News"),
                stored("t3", "three", 3, "General"),
                stored("t2", "two", 2, "Programming"),
            ])
        });
    let repo = repository(store, MockImageUploader::new());

    let posts = repo.list_all().await.expect("listed");

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_ref()).collect();
    assert_eq!(ids, ["t3", "t2", "t1"]);
    assert_eq!(repo.state().load, LoadState::Fulfilled);
}

#[rstest]
#[tokio::test]
async fn list_all_skips_undecodable_documents() {
    let mut store = MockDocumentStore::new();
    store.expect_list_collection().returning(|_| {
        Ok(vec![
            stored("ok", "fine", 1, "News"),
            StoredDocument::new("bad", fields(json!({"tags": "not a list"}))),
        ])
    });
    let repo = repository(store, MockImageUploader::new());

    let posts = repo.list_all().await.expect("listed");
    assert_eq!(posts.len(), 1);
}

#[rstest]
#[tokio::test]
async fn failed_list_keeps_previous_items() {
    let mut store = MockDocumentStore::new();
    let mut calls = 0;
    store.expect_list_collection().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(vec![stored("t1", "one", 1, "News")])
        } else {
            Err(DocumentStoreError::unavailable("offline"))
        }
    });
    let repo = repository(store, MockImageUploader::new());
    repo.list_all().await.expect("first load");

    let err = repo.list_all().await.expect_err("offline");

    assert_eq!(err.code(), ErrorCode::FetchFailed);
    let state = repo.state();
    assert_eq!(state.load, LoadState::Rejected(err));
    assert_eq!(state.posts.len(), 1);
}

#[rstest]
#[tokio::test]
async fn get_by_id_distinguishes_missing_from_failure() {
    let mut store = MockDocumentStore::new();
    store
        .expect_get_document()
        .returning(|_, id| match id {
            "gone" => Ok(None),
            "t1" => Ok(Some(stored("t1", "one", 1, "News"))),
            _ => Err(DocumentStoreError::unavailable("offline")),
        });
    let repo = repository(store, MockImageUploader::new());

    let missing = repo
        .get_by_id(&PostId::new("gone").expect("id"))
        .await
        .expect("lookup");
    assert!(missing.is_none());

    let err = repo
        .get_by_id(&PostId::new("other").expect("id"))
        .await
        .expect_err("offline");
    assert_eq!(err.code(), ErrorCode::FetchFailed);

    let found = repo
        .get_by_id(&PostId::new("t1").expect("id"))
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(found.title, "one");
    assert_eq!(repo.state().posts.len(), 1);
}

#[rstest]
#[tokio::test]
async fn create_reads_back_store_time(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_create_document()
        .withf(|collection, fields| {
            collection == POSTS_COLLECTION
                && fields.get("authorEmail") == Some(&json!("admin@example.com"))
                && fields.get("authorName") == Some(&json!("Ada"))
                && fields.get("tags") == Some(&json!(["react", "firebase"]))
        })
        .times(1)
        .returning(|_, _| Ok("new-id".to_owned()));
    store.expect_get_document().times(1).returning(|_, id| {
        let mut doc = stored(id, "Hello", 42, "General");
        doc.fields
            .insert("tags".to_owned(), json!(["react", "firebase"]));
        Ok(Some(doc))
    });
    let repo = repository(store, MockImageUploader::new());
    let draft = PostDraft {
        title: "Hello".to_owned(),
        tags_input: "react, , firebase ,react".to_owned(),
        ..PostDraft::default()
    };

    let post = repo.create(&author, draft).await.expect("created");

    assert_eq!(post.id.as_ref(), "new-id");
    assert_eq!(post.created_at.map(|ts| ts.timestamp()), Some(42));
    assert_eq!(post.tags, Tags::parse("react, firebase"));
    assert_eq!(
        repo.state().posts.featured().map(|p| p.id.as_ref()),
        Some("new-id")
    );
}

#[rstest]
#[tokio::test]
async fn create_degrades_when_upload_fails(author: Author) {
    let mut uploader = MockImageUploader::new();
    uploader
        .expect_upload()
        .withf(|file, preset| file.file_name == "cover.png" && preset == "preset")
        .times(1)
        .returning(|_, _| Err(ImageUploadError::transport("timeout")));
    let mut store = MockDocumentStore::new();
    store
        .expect_create_document()
        .withf(|_, fields| fields.get("imageUrl") == Some(&json!("")))
        .times(1)
        .returning(|_, _| Ok("p1".to_owned()));
    store.expect_get_document().returning(|_, _| Ok(None));
    let repo = repository(store, uploader);
    let draft = PostDraft {
        title: "With image".to_owned(),
        image: Some(image()),
        ..PostDraft::default()
    };

    let post = repo.create(&author, draft).await.expect("created anyway");

    assert_eq!(post.image_url, "");
    assert_eq!(post.title, "With image");
    assert!(post.created_at.is_none());
}

#[rstest]
#[tokio::test]
async fn create_stores_uploaded_url(author: Author) {
    let mut uploader = MockImageUploader::new();
    uploader.expect_upload().returning(|_, _| {
        Ok(Url::parse("https://img.example.com/cover.png").expect("url"))
    });
    let mut store = MockDocumentStore::new();
    store
        .expect_create_document()
        .withf(|_, fields| {
            fields.get("imageUrl") == Some(&json!("https://img.example.com/cover.png"))
        })
        .times(1)
        .returning(|_, _| Ok("p1".to_owned()));
    store.expect_get_document().returning(|_, _| Ok(None));
    let repo = repository(store, uploader);
    let draft = PostDraft {
        image: Some(image()),
        ..PostDraft::default()
    };

    let post = repo.create(&author, draft).await.expect("created");
    assert_eq!(post.image_url, "https://img.example.com/cover.png");
}

#[rstest]
#[tokio::test]
async fn update_changes_only_the_patched_field(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_list_collection()
        .returning(|_| Ok(vec![stored("t1", "one", 1, "News"), stored("t2", "two", 2, "News")]));
    store
        .expect_update_document()
        .withf(|_, id, fields| id == "t1" && fields.len() == 1 && fields["title"] == json!("X"))
        .times(1)
        .returning(|_, _, _| Ok(()));
    let repo = repository(store, MockImageUploader::new());
    repo.list_all().await.expect("loaded");

    let updated = repo
        .update(&author, &PostId::new("t1").expect("id"), PostPatch::title("X"))
        .await
        .expect("updated");

    assert_eq!(updated.title, "X");
    assert_eq!(updated.category.as_ref(), "News");
    let state = repo.state();
    let untouched = state
        .posts
        .get(&PostId::new("t2").expect("id"))
        .expect("t2");
    assert_eq!(untouched.title, "two");
}

#[rstest]
#[tokio::test]
async fn update_clears_image_when_replacement_upload_fails(author: Author) {
    let mut uploader = MockImageUploader::new();
    uploader
        .expect_upload()
        .returning(|_, _| Err(ImageUploadError::rejected(400_u16, "bad preset")));
    let mut store = MockDocumentStore::new();
    store
        .expect_update_document()
        .withf(|_, _, fields| fields.get("imageUrl") == Some(&json!("")))
        .times(1)
        .returning(|_, _, _| Ok(()));
    store.expect_get_document().returning(|_, id| {
        let mut doc = stored(id, "one", 1, "News");
        doc.fields.insert("imageUrl".to_owned(), json!(""));
        Ok(Some(doc))
    });
    let repo = repository(store, uploader);
    let patch = PostPatch {
        image: Some(image()),
        ..PostPatch::default()
    };

    let updated = repo
        .update(&author, &PostId::new("t1").expect("id"), patch)
        .await
        .expect("updated");
    assert_eq!(updated.image_url, "");
}

#[rstest]
#[tokio::test]
async fn update_without_new_image_keeps_current_one(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_update_document()
        .withf(|_, _, fields| !fields.contains_key("imageUrl"))
        .times(1)
        .returning(|_, _, _| Ok(()));
    store.expect_get_document().returning(|_, id| {
        let mut doc = stored(id, "one", 1, "News");
        doc.fields
            .insert("imageUrl".to_owned(), json!("https://img/old.png"));
        Ok(Some(doc))
    });
    let repo = repository(store, MockImageUploader::new());

    let updated = repo
        .update(&author, &PostId::new("t1").expect("id"), PostPatch::title("Two"))
        .await
        .expect("updated");
    assert_eq!(updated.image_url, "https://img/old.png");
}

#[rstest]
#[tokio::test]
async fn update_of_unknown_id_is_not_found(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_update_document()
        .returning(|collection, id, _| Err(DocumentStoreError::missing(collection, id)));
    let repo = repository(store, MockImageUploader::new());

    let err = repo
        .update(&author, &PostId::new("ghost").expect("id"), PostPatch::title("X"))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_twice_succeeds(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_list_collection()
        .returning(|_| Ok(vec![stored("t1", "one", 1, "News")]));
    store
        .expect_delete_document()
        .times(2)
        .returning(|_, _| Ok(()));
    let repo = repository(store, MockImageUploader::new());
    repo.list_all().await.expect("loaded");
    let id = PostId::new("t1").expect("id");

    repo.delete(&author, &id).await.expect("first delete");
    repo.delete(&author, &id).await.expect("second delete");

    assert!(repo.state().posts.is_empty());
}

#[rstest]
#[tokio::test]
async fn subscribers_see_mutations(author: Author) {
    let mut store = MockDocumentStore::new();
    store
        .expect_list_collection()
        .returning(|_| Ok(vec![stored("t1", "one", 1, "News")]));
    store.expect_delete_document().returning(|_, _| Ok(()));
    let repo = repository(store, MockImageUploader::new());
    let mut receiver = repo.subscribe();

    repo.list_all().await.expect("loaded");
    assert!(receiver.has_changed().expect("open"));
    assert_eq!(receiver.borrow_and_update().posts.len(), 1);

    repo.delete(&author, &PostId::new("t1").expect("id"))
        .await
        .expect("deleted");
    assert!(receiver.has_changed().expect("open"));
    assert!(receiver.borrow_and_update().posts.is_empty());
}
