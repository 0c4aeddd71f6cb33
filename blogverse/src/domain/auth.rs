//! Email and password pair submitted from the login view.
//!
//! [`LoginCredentials`] is the only way to reach the provider's password
//! sign-in, so a blank field or a malformed address is refused locally.

use thiserror::Error;
use zeroize::Zeroizing;

use super::{EmailAddress, IdentityValidationError};

/// Reasons a login form submission is refused before any provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// The email field was blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The email field did not hold exactly one `@` between non-empty parts.
    #[error("email must look like name@host")]
    InvalidEmail,
    /// The password field was empty.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl From<IdentityValidationError> for LoginValidationError {
    fn from(err: IdentityValidationError) -> Self {
        match err {
            IdentityValidationError::EmptyEmail => Self::EmptyEmail,
            IdentityValidationError::InvalidEmail
            | IdentityValidationError::EmptyId
            | IdentityValidationError::InvalidId => Self::InvalidEmail,
        }
    }
}

/// A parsed sign-in submission.
///
/// The email is trimmed and parsed into an [`EmailAddress`]. The password is
/// kept byte for byte, surrounding spaces included, and wiped on drop.
///
/// # Examples
/// ```
/// use blogverse::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin@example.com ", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "admin@example.com");
/// assert!(LoginCredentials::try_from_parts("admin", "secret").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Parse the raw form fields.
    ///
    /// # Errors
    /// Returns a [`LoginValidationError`] naming the first field that is
    /// blank or malformed; the email is checked before the password.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email.trim())?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Parsed address sent to the provider.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password exactly as typed.
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case(" \t ", "pw", LoginValidationError::EmptyEmail)]
    #[case("not-an-email", "pw", LoginValidationError::InvalidEmail)]
    #[case("a@b@c", "pw", LoginValidationError::InvalidEmail)]
    #[case("@example.com", "pw", LoginValidationError::InvalidEmail)]
    #[case("not-an-email", "", LoginValidationError::InvalidEmail)]
    #[case("admin@example.com", "", LoginValidationError::EmptyPassword)]
    fn malformed_submissions_are_refused(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("submission should be refused");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn email_is_trimmed_and_password_kept_verbatim() {
        let creds = LoginCredentials::try_from_parts("  writer@example.com ", " padded pw ")
            .expect("well formed");
        assert_eq!(creds.email().as_ref(), "writer@example.com");
        assert_eq!(creds.password(), " padded pw ");
    }
}
