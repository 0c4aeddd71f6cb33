//! In-memory document store adapter.
//!
//! Documents live in per-collection ordered maps behind a mutex. The adapter
//! mirrors the remote store's contract: ids are generated on create and the
//! `createdAt` field is stamped from the injected clock as a
//! `{seconds, nanoseconds}` timestamp object.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    CREATED_AT_FIELD, DocumentFields, DocumentStore, DocumentStoreError, StoredDocument,
};

type Collections = BTreeMap<String, BTreeMap<String, DocumentFields>>;

/// Document store kept entirely in process memory.
pub struct InMemoryDocumentStore {
    clock: Arc<dyn Clock>,
    collections: Mutex<Collections>,
    offline: AtomicBool,
}

impl InMemoryDocumentStore {
    /// Create an empty store stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            collections: Mutex::new(Collections::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Populate from a `{collection: {id: fields}}` JSON object.
    ///
    /// Seeded fields are stored as given, including any `createdAt`.
    ///
    /// # Errors
    /// Returns [`DocumentStoreError::Unavailable`] when the payload does not
    /// have the expected shape.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use blogverse::outbound::InMemoryDocumentStore;
    /// use mockable::DefaultClock;
    /// use serde_json::json;
    ///
    /// let store = InMemoryDocumentStore::new(Arc::new(DefaultClock));
    /// store
    ///     .seed(&json!({"blogs": {"p1": {"title": "Hello"}}}))
    ///     .unwrap();
    /// assert_eq!(store.len("blogs"), 1);
    /// ```
    pub fn seed(&self, payload: &Value) -> Result<(), DocumentStoreError> {
        let collections = payload
            .as_object()
            .ok_or_else(|| DocumentStoreError::unavailable("seed payload must be an object"))?;
        let mut guard = self.lock()?;
        for (collection, documents) in collections {
            let documents = documents.as_object().ok_or_else(|| {
                DocumentStoreError::unavailable(format!("seed collection {collection} must be an object"))
            })?;
            let target = guard.entry(collection.clone()).or_default();
            for (id, fields) in documents {
                let fields = fields.as_object().cloned().ok_or_else(|| {
                    DocumentStoreError::unavailable(format!("seed document {collection}/{id} must be an object"))
                })?;
                target.insert(id.clone(), fields);
            }
        }
        Ok(())
    }

    /// Make every subsequent call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .map(|guard| guard.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    /// Whether `collection` holds no documents.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, DocumentStoreError> {
        self.collections
            .lock()
            .map_err(|_| DocumentStoreError::unavailable("document store lock poisoned"))
    }

    fn online(&self) -> Result<MutexGuard<'_, Collections>, DocumentStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DocumentStoreError::unavailable("network unreachable"));
        }
        self.lock()
    }

    fn server_timestamp(&self) -> Value {
        let now = self.clock.utc();
        json!({
            "seconds": now.timestamp(),
            "nanoseconds": now.timestamp_subsec_nanos(),
        })
    }
}

fn merge(target: &mut DocumentFields, fields: DocumentFields) {
    for (key, value) in fields {
        target.insert(key, value);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_collection(
        &self,
        collection: &str,
    ) -> Result<Vec<StoredDocument>, DocumentStoreError> {
        let guard = self.online()?;
        Ok(guard
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| StoredDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        let guard = self.online()?;
        Ok(guard
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| StoredDocument::new(id, fields.clone())))
    }

    async fn create_document(
        &self,
        collection: &str,
        mut fields: DocumentFields,
    ) -> Result<String, DocumentStoreError> {
        fields.insert(CREATED_AT_FIELD.to_owned(), self.server_timestamp());
        let id = Uuid::new_v4().simple().to_string();
        let mut guard = self.online()?;
        guard
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), fields);
        debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), DocumentStoreError> {
        let mut guard = self.online()?;
        let target = guard
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| DocumentStoreError::missing(collection, id))?;
        merge(target, fields);
        Ok(())
    }

    async fn delete_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<(), DocumentStoreError> {
        let mut guard = self.online()?;
        if let Some(documents) = guard.get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn merge_document(
        &self,
        collection: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), DocumentStoreError> {
        let mut guard = self.online()?;
        let target = guard
            .entry(collection.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default();
        merge(target, fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Contract coverage for the in-memory store.
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;

    struct FixtureClock {
        utc_now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc_now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.utc_now
        }
    }

    fn fields(value: Value) -> DocumentFields {
        let Value::Object(map) = value else {
            panic!("fixture fields must be an object");
        };
        map
    }

    #[fixture]
    fn store() -> InMemoryDocumentStore {
        let utc_now = Utc
            .with_ymd_and_hms(2026, 10, 19, 9, 30, 0)
            .single()
            .expect("valid fixture timestamp");
        InMemoryDocumentStore::new(Arc::new(FixtureClock { utc_now }))
    }

    #[rstest]
    #[tokio::test]
    async fn create_stamps_store_time_over_client_value(store: InMemoryDocumentStore) {
        let id = store
            .create_document(
                "blogs",
                fields(json!({"title": "t", "createdAt": "client time"})),
            )
            .await
            .expect("created");

        let document = store
            .get_document("blogs", &id)
            .await
            .expect("read")
            .expect("present");
        assert_eq!(
            document.fields[CREATED_AT_FIELD],
            json!({"seconds": 1_792_402_200_i64, "nanoseconds": 0})
        );
        assert_eq!(document.fields["title"], json!("t"));
    }

    #[rstest]
    #[tokio::test]
    async fn update_merges_and_rejects_missing(store: InMemoryDocumentStore) {
        let id = store
            .create_document("blogs", fields(json!({"title": "a", "category": "News"})))
            .await
            .expect("created");

        store
            .update_document("blogs", &id, fields(json!({"title": "b"})))
            .await
            .expect("updated");
        let document = store
            .get_document("blogs", &id)
            .await
            .expect("read")
            .expect("present");
        assert_eq!(document.fields["title"], json!("b"));
        assert_eq!(document.fields["category"], json!("News"));

        let err = store
            .update_document("blogs", "ghost", DocumentFields::new())
            .await
            .expect_err("missing");
        assert_eq!(err, DocumentStoreError::missing("blogs", "ghost"));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_is_idempotent(store: InMemoryDocumentStore) {
        let id = store
            .create_document("blogs", DocumentFields::new())
            .await
            .expect("created");
        store.delete_document("blogs", &id).await.expect("first");
        store.delete_document("blogs", &id).await.expect("second");
        store
            .delete_document("empty", "nothing")
            .await
            .expect("unknown collection");
        assert!(store.is_empty("blogs"));
    }

    #[rstest]
    #[tokio::test]
    async fn merge_creates_then_merges(store: InMemoryDocumentStore) {
        store
            .merge_document("users", "u1", fields(json!({"username": "Ada"})))
            .await
            .expect("create");
        store
            .merge_document("users", "u1", fields(json!({"bio": "x"})))
            .await
            .expect("merge");
        let document = store
            .get_document("users", "u1")
            .await
            .expect("read")
            .expect("present");
        assert_eq!(document.fields["username"], json!("Ada"));
        assert_eq!(document.fields["bio"], json!("x"));
    }

    #[rstest]
    #[tokio::test]
    async fn offline_store_fails_every_call(store: InMemoryDocumentStore) {
        store.set_offline(true);
        let err = store.list_collection("blogs").await.expect_err("offline");
        assert!(matches!(err, DocumentStoreError::Unavailable { .. }));
        store.set_offline(false);
        assert!(store.list_collection("blogs").await.expect("online").is_empty());
    }

    #[rstest]
    fn seed_rejects_malformed_payloads(store: InMemoryDocumentStore) {
        assert!(store.seed(&json!(["not", "an", "object"])).is_err());
        assert!(store.seed(&json!({"blogs": {"p1": 3}})).is_err());
        store
            .seed(&json!({"blogs": {"p1": {"title": "x"}, "p2": {}}}))
            .expect("seeded");
        assert_eq!(store.len("blogs"), 2);
    }
}
