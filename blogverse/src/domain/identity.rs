//! Identity data mirrored from the external auth provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned when constructing identity values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// The provider id was empty.
    EmptyId,
    /// The provider id contained whitespace.
    InvalidId,
    /// The email was blank.
    EmptyEmail,
    /// The email did not split into a local part and a domain.
    InvalidEmail,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "identity id must not be empty"),
            Self::InvalidId => write!(f, "identity id must not contain whitespace"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a single '@'"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Provider-assigned identifier for a signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Validate and construct an [`IdentityId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityValidationError::EmptyId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(IdentityValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address as reported by the provider.
///
/// The value is kept verbatim: comparisons against the allowed email are
/// exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(IdentityValidationError::EmptyEmail);
        }
        let mut parts = email.split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !valid {
            return Err(IdentityValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Principal supplied by the auth provider.
///
/// Not owned by this system; the session only mirrors it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    id: IdentityId,
    email: Option<EmailAddress>,
    email_verified: bool,
}

impl Identity {
    /// Build an identity from validated parts.
    pub fn new(id: IdentityId, email: Option<EmailAddress>, email_verified: bool) -> Self {
        Self {
            id,
            email,
            email_verified,
        }
    }

    /// Provider identifier.
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Email, when the provider reports one.
    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Whether the provider verified the email.
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }
}

/// The single email address permitted to hold write capability.
///
/// # Examples
/// ```
/// use blogverse::domain::{AllowedEmail, EmailAddress, Identity, IdentityId};
///
/// let allowed = AllowedEmail::new("admin@example.com").unwrap();
/// let identity = Identity::new(
///     IdentityId::new("uid-1").unwrap(),
///     Some(EmailAddress::new("admin@example.com").unwrap()),
///     true,
/// );
/// assert!(allowed.permits(&identity));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedEmail(EmailAddress);

impl AllowedEmail {
    /// Validate and wrap the allowed email.
    pub fn new(email: impl Into<String>) -> Result<Self, IdentityValidationError> {
        EmailAddress::new(email).map(Self)
    }

    /// Exact, case-sensitive comparison against the identity's email.
    pub fn permits(&self, identity: &Identity) -> bool {
        identity.email().is_some_and(|email| email == &self.0)
    }

    /// Borrow the allowed address.
    pub fn as_email(&self) -> &EmailAddress {
        &self.0
    }
}
