//! Persisted light/dark theme preference.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use super::Error;
use super::ports::PreferenceStorage;

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Colour scheme wrapping every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light scheme.
    #[default]
    Light,
    /// Dark scheme.
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored theme value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_owned())),
        }
    }
}

/// Theme preference backed by durable storage.
#[derive(Clone)]
pub struct ThemeService {
    storage: Arc<dyn PreferenceStorage>,
    current: Arc<watch::Sender<Theme>>,
}

impl ThemeService {
    /// Read the stored preference, falling back to [`Theme::Light`] when it
    /// is absent, unreadable or unknown.
    pub fn load(storage: Arc<dyn PreferenceStorage>) -> Self {
        let theme = match storage.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err: UnknownTheme| {
                warn!(error = %err, "ignoring stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(err) => {
                warn!(error = %err, "theme preference unreadable");
                Theme::default()
            }
        };
        let (current, _) = watch::channel(theme);
        Self {
            storage,
            current: Arc::new(current),
        }
    }

    /// Active theme.
    pub fn current(&self) -> Theme {
        *self.current.borrow()
    }

    /// Receiver woken on every theme change.
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }

    /// Switch to `theme` and persist it.
    ///
    /// # Errors
    /// Returns `internal_error` when the preference cannot be written; the
    /// in-memory theme still changes.
    pub fn set(&self, theme: Theme) -> Result<Theme, Error> {
        self.current.send_replace(theme);
        self.storage
            .set(THEME_KEY, theme.as_str())
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(theme)
    }

    /// Flip between light and dark and persist the result.
    ///
    /// # Errors
    /// See [`ThemeService::set`].
    pub fn toggle(&self) -> Result<Theme, Error> {
        self.set(self.current().toggled())
    }
}
