//! Port for the remote document database.
//!
//! The store is schemaless: documents are bags of JSON fields keyed by a
//! store-assigned id. Everything above this port works with typed records;
//! the conversion happens in one place, `domain::post_document`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::define_port_error;

/// Field map of a stored document.
pub type DocumentFields = Map<String, Value>;

/// Field name the store stamps with its own write time on creation.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Store-assigned identifier.
    pub id: String,
    /// Raw fields.
    pub fields: DocumentFields,
}

impl StoredDocument {
    /// Pair an id with its fields.
    pub fn new(id: impl Into<String>, fields: DocumentFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

define_port_error! {
    /// Errors raised by document store adapters.
    pub enum DocumentStoreError {
        /// Network failure or the store is unreachable.
        Unavailable {
            /// Reason reported by the transport.
            message: String,
        } => "document store unavailable: {message}",
        /// Security rules refused the operation.
        PermissionDenied {
            /// Reason reported by the security rules.
            message: String,
        } => "document store permission denied: {message}",
        /// An update targeted a document that does not exist.
        Missing {
            /// Collection that was addressed.
            collection: String,
            /// Document id that was not found.
            id: String,
        } => "document {collection}/{id} does not exist",
    }
}

/// Port over the remote document database.
///
/// # Contract
/// - `create_document` assigns the id and stamps [`CREATED_AT_FIELD`] with
///   the store's write time, overriding any client-supplied value.
/// - `update_document` merges `fields` into an existing document and fails
///   with [`DocumentStoreError::Missing`] when the id is absent.
/// - `delete_document` succeeds when the id is already absent.
/// - `merge_document` creates the document when absent and merges otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch every document in a collection, in no particular order.
    async fn list_collection(
        &self,
        collection: &str,
    ) -> Result<Vec<StoredDocument>, DocumentStoreError>;

    /// Fetch one document. `None` when it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError>;

    /// Create a document and return its new id.
    async fn create_document(
        &self,
        collection: &str,
        fields: DocumentFields,
    ) -> Result<String, DocumentStoreError>;

    /// Merge fields into an existing document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), DocumentStoreError>;

    /// Remove a document.
    async fn delete_document(&self, collection: &str, id: &str)
    -> Result<(), DocumentStoreError>;

    /// Upsert a document under a caller-chosen id with merge semantics.
    async fn merge_document(
        &self,
        collection: &str,
        id: &str,
        fields: DocumentFields,
    ) -> Result<(), DocumentStoreError>;
}
