//! Per-identity profile record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::IdentityId;

/// Validation errors returned by [`DisplayName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    /// The display name was blank once trimmed.
    EmptyDisplayName,
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
        }
    }
}

impl std::error::Error for ProfileValidationError {}

/// Human readable name shown as the author of posts.
///
/// Stored trimmed; construction fails when nothing remains after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Trim and validate a display name.
    ///
    /// # Examples
    /// ```
    /// use blogverse::domain::DisplayName;
    ///
    /// let name = DisplayName::new("  Ada  ").unwrap();
    /// assert_eq!(name.as_ref(), "Ada");
    /// assert!(DisplayName::new("   ").is_err());
    /// ```
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, ProfileValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ProfileValidationError::EmptyDisplayName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Profile keyed 1:1 by identity id.
///
/// ## Invariants
/// - A missing display name is valid and means "not chosen yet".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    identity_id: IdentityId,
    display_name: Option<DisplayName>,
}

impl Profile {
    /// Build a profile from validated parts.
    pub fn new(identity_id: IdentityId, display_name: Option<DisplayName>) -> Self {
        Self {
            identity_id,
            display_name,
        }
    }

    /// Identity the profile belongs to.
    pub fn identity_id(&self) -> &IdentityId {
        &self.identity_id
    }

    /// Saved display name, if any.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }
}
