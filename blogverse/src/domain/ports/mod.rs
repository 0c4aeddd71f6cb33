//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Each trait exposes strongly typed errors so adapters map their failures
//! into predictable variants; services translate those into
//! [`crate::domain::Error`] codes.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_provider;
mod document_store;
mod image_uploader;
mod preference_storage;

#[cfg(test)]
pub use auth_provider::MockAuthProvider;
pub use auth_provider::{AuthProvider, AuthProviderError};
#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    CREATED_AT_FIELD, DocumentFields, DocumentStore, DocumentStoreError, StoredDocument,
};
#[cfg(test)]
pub use image_uploader::MockImageUploader;
pub use image_uploader::{ImageUploadError, ImageUploader};
#[cfg(test)]
pub use preference_storage::MockPreferenceStorage;
pub use preference_storage::{PreferenceStorage, PreferenceStorageError};
