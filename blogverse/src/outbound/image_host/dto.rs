//! DTOs for decoding image host upload responses.

use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub(super) struct UploadResponseDto {
    pub(super) secure_url: Option<String>,
}

impl UploadResponseDto {
    pub(super) fn into_public_url(self) -> Result<Url, String> {
        let raw = self
            .secure_url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| "response has no secure_url".to_owned())?;
        Url::parse(raw.trim()).map_err(|err| format!("secure_url is not a URL: {err}"))
    }
}
