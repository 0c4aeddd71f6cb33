//! Port for the external authentication provider.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{Identity, LoginCredentials};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth provider adapters.
    pub enum AuthProviderError {
        /// The email/password pair was refused.
        InvalidCredentials => "invalid email or password",
        /// The provider could not be reached.
        Unavailable {
            /// Reason reported by the transport.
            message: String,
        } => "auth provider unavailable: {message}",
    }
}

/// External auth collaborator.
///
/// Auth state is exposed as a watch channel: the receiver always holds the
/// current identity (or `None`) and wakes on every change. Dropping the
/// receiver is the unsubscribe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Subscribe to auth state changes.
    fn watch_auth_state(&self) -> watch::Receiver<Option<Identity>>;

    /// Sign in with email and password.
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Identity, AuthProviderError>;

    /// Sign the current identity out.
    async fn sign_out(&self) -> Result<(), AuthProviderError>;
}
