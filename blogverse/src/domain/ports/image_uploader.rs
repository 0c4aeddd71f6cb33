//! Port for the image hosting collaborator.

use async_trait::async_trait;
use url::Url;

use crate::domain::ImageFile;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image upload adapters.
    pub enum ImageUploadError {
        /// The request never produced a response.
        Transport {
            /// Transport error text.
            message: String,
        } => "image upload transport failed: {message}",
        /// The host answered with a non-success status.
        Rejected {
            /// HTTP status returned by the host.
            status: u16,
            /// Response body or reason phrase.
            message: String,
        } => "image upload rejected with status {status}: {message}",
        /// The response did not carry a usable public URL.
        MalformedResponse {
            /// What was wrong with the body.
            message: String,
        } => "image upload response malformed: {message}",
    }
}

/// Uploads a file and returns its public URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload `file` using the unsigned upload `preset`.
    async fn upload(&self, file: &ImageFile, preset: &str) -> Result<Url, ImageUploadError>;
}
