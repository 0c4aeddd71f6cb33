//! Client configuration loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_ALLOWED_EMAIL: &str = "admin@blogverse.example";
const DEFAULT_UPLOAD_ENDPOINT: &str = "https://api.cloudinary.com/v1_1/blogverse/image/upload";
const DEFAULT_UPLOAD_PRESET: &str = "blogverse_unsigned";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PREFERENCES_FILE: &str = "blogverse-preferences.json";

fn default_seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("seed.json")
}

/// Settings for the BlogVerse client runtime.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BLOGVERSE")]
pub struct BlogverseSettings {
    /// The single email address permitted to sign in.
    pub allowed_email: Option<String>,
    /// Image host upload endpoint.
    pub upload_endpoint: Option<String>,
    /// Unsigned upload preset sent with every image.
    pub upload_preset: Option<String>,
    /// Upload request timeout in seconds.
    pub upload_timeout_secs: Option<u64>,
    /// File holding durable client preferences.
    pub preferences_path: Option<PathBuf>,
    /// JSON document used to seed the in-memory store.
    pub seed_path: Option<PathBuf>,
}

impl BlogverseSettings {
    /// Return the allowed email, falling back to the default.
    pub fn allowed_email(&self) -> &str {
        self.allowed_email.as_deref().unwrap_or(DEFAULT_ALLOWED_EMAIL)
    }

    /// Return the parsed upload endpoint.
    ///
    /// # Errors
    /// Returns [`url::ParseError`] when the configured value is not a URL.
    pub fn upload_endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(
            self.upload_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_UPLOAD_ENDPOINT),
        )
    }

    /// Return the upload preset, falling back to the default.
    pub fn upload_preset(&self) -> &str {
        self.upload_preset.as_deref().unwrap_or(DEFAULT_UPLOAD_PRESET)
    }

    /// Return the upload timeout.
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upload_timeout_secs
                .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
        )
    }

    /// Return the preference file path, falling back to the working directory.
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE))
    }

    /// Return the seed file path, falling back to the bundled fixture.
    pub fn seed_path(&self) -> PathBuf {
        self.seed_path.clone().unwrap_or_else(default_seed_path)
    }
}
