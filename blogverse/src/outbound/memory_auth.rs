//! In-memory auth provider adapter.
//!
//! Accounts are registered up front with a password. The current identity
//! is held in a watch channel so every subscriber sees sign-in and sign-out
//! events in order.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{AuthProvider, AuthProviderError};
use crate::domain::{Identity, LoginCredentials};

struct Account {
    password: Zeroizing<String>,
    identity: Identity,
}

/// Auth provider backed by a fixed account table.
pub struct InMemoryAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<Identity>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthProvider {
    /// Create a provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
        }
    }

    /// Register an account keyed by the identity's email.
    ///
    /// Identities without an email cannot sign in with a password and are
    /// ignored.
    pub fn with_account(self, identity: Identity, password: &str) -> Self {
        if let Some(email) = identity.email().map(|email| email.as_ref().to_owned())
            && let Ok(mut accounts) = self.accounts.lock()
        {
            accounts.insert(
                email,
                Account {
                    password: Zeroizing::new(password.to_owned()),
                    identity,
                },
            );
        }
        self
    }

    /// Replace the current identity as if the provider restored a session.
    pub fn set_current(&self, identity: Option<Identity>) {
        self.current.send_replace(identity);
    }

    /// Identity currently signed in at the provider.
    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Number of live auth-state subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.current.receiver_count()
    }

    fn accounts(&self) -> Result<MutexGuard<'_, HashMap<String, Account>>, AuthProviderError> {
        self.accounts
            .lock()
            .map_err(|_| AuthProviderError::unavailable("account table lock poisoned"))
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    fn watch_auth_state(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }

    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Identity, AuthProviderError> {
        let identity = {
            let accounts = self.accounts()?;
            let account = accounts
                .get::<str>(credentials.email().as_ref())
                .filter(|account| account.password.as_str() == credentials.password())
                .ok_or_else(AuthProviderError::invalid_credentials)?;
            account.identity.clone()
        };
        debug!(uid = %identity.id(), "provider sign-in succeeded");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        self.current.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Account lookup and auth-state broadcasting.
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{EmailAddress, IdentityId};

    #[fixture]
    fn provider() -> InMemoryAuthProvider {
        InMemoryAuthProvider::new().with_account(
            Identity::new(
                IdentityId::new("u1").expect("uid"),
                Some(EmailAddress::new("admin@example.com").expect("email")),
                true,
            ),
            "hunter2",
        )
    }

    fn credentials(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(email, password).expect("credentials")
    }

    #[rstest]
    #[case("admin@example.com", "wrong")]
    #[case("nobody@example.com", "hunter2")]
    #[case("Admin@example.com", "hunter2")]
    #[tokio::test]
    async fn wrong_credentials_are_refused(
        provider: InMemoryAuthProvider,
        #[case] email: &str,
        #[case] password: &str,
    ) {
        let err = provider
            .sign_in_with_password(&credentials(email, password))
            .await
            .expect_err("refused");
        assert_eq!(err, AuthProviderError::InvalidCredentials);
        assert!(provider.current().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn sign_in_and_out_reach_subscribers(provider: InMemoryAuthProvider) {
        let mut receiver = provider.watch_auth_state();
        assert_eq!(provider.subscriber_count(), 1);

        provider
            .sign_in_with_password(&credentials("admin@example.com", "hunter2"))
            .await
            .expect("signed in");
        assert!(receiver.has_changed().expect("open"));
        assert_eq!(
            receiver
                .borrow_and_update()
                .as_ref()
                .map(|identity| identity.id().as_ref().to_owned()),
            Some("u1".to_owned())
        );

        provider.sign_out().await.expect("signed out");
        assert!(receiver.borrow_and_update().is_none());

        drop(receiver);
        assert_eq!(provider.subscriber_count(), 0);
    }
}
