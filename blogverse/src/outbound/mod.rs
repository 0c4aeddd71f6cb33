//! Outbound adapters implementing domain ports for external collaborators.
//!
//! - **memory_store**: in-process document store with server-side timestamps
//! - **memory_auth**: fixed-account auth provider with a watch-based state stream
//! - **image_host**: reqwest-backed multipart image uploader
//! - **preferences**: file-backed and in-memory preference storage
//!
//! Adapters are thin translators between domain types and their medium. They
//! contain no business logic.

pub mod image_host;
pub mod memory_auth;
pub mod memory_store;
pub mod preferences;

pub use image_host::HttpImageUploader;
pub use memory_auth::InMemoryAuthProvider;
pub use memory_store::InMemoryDocumentStore;
pub use preferences::{FilePreferenceStorage, InMemoryPreferenceStorage};
