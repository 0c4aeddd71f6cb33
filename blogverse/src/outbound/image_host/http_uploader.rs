//! Reqwest-backed image upload adapter.
//!
//! This adapter owns transport details only: multipart form construction,
//! timeout and HTTP error mapping, and decoding of the `secure_url` field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::UploadResponseDto;
use crate::domain::ImageFile;
use crate::domain::ports::{ImageUploadError, ImageUploader};

/// Uploads images with an unsigned preset to one endpoint.
pub struct HttpImageUploader {
    client: Client,
    endpoint: Url,
}

impl HttpImageUploader {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

fn build_form(file: &ImageFile, preset: &str) -> Result<Form, ImageUploadError> {
    let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    if let Some(content_type) = &file.content_type {
        part = part.mime_str(content_type).map_err(|err| {
            ImageUploadError::transport(format!("invalid content type {content_type}: {err}"))
        })?;
    }
    Ok(Form::new()
        .part("file", part)
        .text("upload_preset", preset.to_owned()))
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
    async fn upload(&self, file: &ImageFile, preset: &str) -> Result<Url, ImageUploadError> {
        let form = build_form(file, preset)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let url = parse_secure_url(body.as_ref())?;
        debug!(file = %file.file_name, %url, "image uploaded");
        Ok(url)
    }
}

fn parse_secure_url(body: &[u8]) -> Result<Url, ImageUploadError> {
    let decoded: UploadResponseDto = serde_json::from_slice(body).map_err(|error| {
        ImageUploadError::malformed_response(format!("invalid upload JSON payload: {error}"))
    })?;
    decoded
        .into_public_url()
        .map_err(ImageUploadError::malformed_response)
}

fn map_transport_error(error: reqwest::Error) -> ImageUploadError {
    ImageUploadError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ImageUploadError {
    ImageUploadError::rejected(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
