//! Single-identity access gate over the external auth provider.
//!
//! The gate follows the provider's auth-state stream in a spawned task and
//! publishes its own [`GateState`]. Only the allow-listed email reaches
//! [`GateState::Authenticated`]; any other signed-in identity is signed out
//! again before the gate settles on [`GateState::Anonymous`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ports::{AuthProvider, AuthProviderError};
use super::{AllowedEmail, Author, DisplayName, Error, Identity, LoginCredentials};

/// Message shown when the provider refuses the credentials.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";

/// Message shown when a valid account is not the allowed one.
pub const REJECTED_ACCOUNT_MESSAGE: &str = "This account is not allowed";

/// Observable state of the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateState {
    /// The gate has not started.
    #[default]
    Unresolved,
    /// Waiting for the first auth-state event.
    Resolving,
    /// The allowed identity is signed in.
    Authenticated(Identity),
    /// Nobody, or nobody allowed, is signed in.
    Anonymous,
}

impl GateState {
    /// Signed-in allowed identity, if any.
    pub fn current_identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// Whether write-capable views must keep waiting.
    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Unresolved | Self::Resolving)
    }
}

/// Outcome of the requires-authentication guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a loading indicator.
    Loading,
    /// Send the visitor to the login page, remembering where they were going.
    RedirectToLogin {
        /// Path the visitor attempted to open.
        from: String,
    },
    /// Render the protected view.
    Render(Identity),
}

/// Apply the guard to a gate state.
///
/// # Examples
/// ```
/// use blogverse::domain::{GateState, GuardDecision, guard};
///
/// assert_eq!(guard(&GateState::Resolving, "/Dashboard"), GuardDecision::Loading);
/// assert_eq!(
///     guard(&GateState::Anonymous, "/Dashboard"),
///     GuardDecision::RedirectToLogin { from: "/Dashboard".into() }
/// );
/// ```
pub fn guard(state: &GateState, attempted: &str) -> GuardDecision {
    match state {
        GateState::Unresolved | GateState::Resolving => GuardDecision::Loading,
        GateState::Anonymous => GuardDecision::RedirectToLogin {
            from: attempted.to_owned(),
        },
        GateState::Authenticated(identity) => GuardDecision::Render(identity.clone()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    Anonymous,
    Authenticated(Identity),
    Reject(Identity),
}

fn resolve(allowed: &AllowedEmail, identity: Option<Identity>) -> Resolution {
    match identity {
        None => Resolution::Anonymous,
        Some(identity) if allowed.permits(&identity) => Resolution::Authenticated(identity),
        Some(identity) => Resolution::Reject(identity),
    }
}

/// Handle to the gate's auth-state subscription.
///
/// Stopping or dropping the handle ends the task and releases the provider
/// subscription.
#[derive(Debug)]
pub struct AuthSubscription {
    task: Option<JoinHandle<()>>,
}

impl AuthSubscription {
    /// Stop following auth state and wait for the task to wind down.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            if let Err(err) = task.await
                && !err.is_cancelled()
            {
                debug!(error = %err, "auth subscription task ended abnormally");
            }
        }
    }

    /// Whether the subscription task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Enforces the single-allowed-identity policy.
#[derive(Clone)]
pub struct IdentityGate {
    provider: Arc<dyn AuthProvider>,
    allowed: AllowedEmail,
    state: Arc<watch::Sender<GateState>>,
}

impl IdentityGate {
    /// Create an unresolved gate.
    pub fn new(provider: Arc<dyn AuthProvider>, allowed: AllowedEmail) -> Self {
        let (state, _) = watch::channel(GateState::Unresolved);
        Self {
            provider,
            allowed,
            state: Arc::new(state),
        }
    }

    /// Start following auth state. Must be called inside a Tokio runtime.
    pub fn start(&self) -> AuthSubscription {
        self.state.send_replace(GateState::Resolving);
        let auth = self.provider.watch_auth_state();
        let task = tokio::spawn(follow_auth_state(
            auth,
            Arc::clone(&self.provider),
            self.allowed.clone(),
            Arc::clone(&self.state),
        ));
        AuthSubscription { task: Some(task) }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    /// Receiver woken on every gate state change.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Signed-in allowed identity, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().current_identity().cloned()
    }

    /// Whether the gate is still waiting for its first auth event.
    pub fn is_resolving(&self) -> bool {
        self.state.borrow().is_resolving()
    }

    /// The allow-listed address.
    pub fn allowed(&self) -> &AllowedEmail {
        &self.allowed
    }

    /// Guard decision for a protected path.
    pub fn guard(&self, attempted: &str) -> GuardDecision {
        guard(&self.state.borrow(), attempted)
    }

    /// Wait until the gate has resolved and return the settled state.
    pub async fn resolved(&self) -> GateState {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|state| !state.is_resolving()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Write capability for the current identity.
    ///
    /// `None` unless the allowed identity is signed in.
    pub fn author(&self, display_name: Option<DisplayName>) -> Option<Author> {
        let state = self.state.borrow();
        let identity = state.current_identity()?;
        let email = identity.email()?.clone();
        Some(Author::new(email, display_name))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    /// - `validation_rejected` when either input is blank or the email is
    ///   malformed,
    /// - `auth_invalid_credentials` when the provider refuses them,
    /// - `auth_rejected` when the account is not the allowed one; the
    ///   provider session is ended again before returning.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|err| Error::validation_rejected(err.to_string()))?;
        let identity = self
            .provider
            .sign_in_with_password(&credentials)
            .await
            .map_err(|err| {
                debug!(error = %err, "sign-in refused by provider");
                match err {
                    AuthProviderError::InvalidCredentials => {
                        Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE)
                    }
                    AuthProviderError::Unavailable { .. } => {
                        Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE)
                            .with_details(serde_json::json!({ "cause": err.to_string() }))
                    }
                }
            })?;

        match resolve(&self.allowed, Some(identity)) {
            Resolution::Authenticated(identity) => {
                info!(uid = %identity.id(), "allowed identity signed in");
                self.state
                    .send_replace(GateState::Authenticated(identity.clone()));
                Ok(identity)
            }
            Resolution::Reject(identity) => {
                reject(self.provider.as_ref(), &identity, &self.state).await;
                Err(Error::auth_rejected(REJECTED_ACCOUNT_MESSAGE))
            }
            Resolution::Anonymous => Err(Error::invalid_credentials(INVALID_CREDENTIALS_MESSAGE)),
        }
    }

    /// End the provider session.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the provider cannot be reached.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.provider
            .sign_out()
            .await
            .map_err(|err| Error::fetch_failed(err.to_string()))?;
        self.state.send_replace(GateState::Anonymous);
        Ok(())
    }
}

async fn reject(
    provider: &dyn AuthProvider,
    identity: &Identity,
    state: &watch::Sender<GateState>,
) {
    warn!(uid = %identity.id(), "identity is not allowed; signing out");
    if let Err(err) = provider.sign_out().await {
        warn!(error = %err, "sign-out of rejected identity failed");
    }
    state.send_replace(GateState::Anonymous);
}

async fn follow_auth_state(
    mut auth: watch::Receiver<Option<Identity>>,
    provider: Arc<dyn AuthProvider>,
    allowed: AllowedEmail,
    state: Arc<watch::Sender<GateState>>,
) {
    loop {
        let current = auth.borrow_and_update().clone();
        match resolve(&allowed, current) {
            Resolution::Anonymous => {
                state.send_replace(GateState::Anonymous);
            }
            Resolution::Authenticated(identity) => {
                debug!(uid = %identity.id(), "auth state resolved to allowed identity");
                state.send_replace(GateState::Authenticated(identity));
            }
            Resolution::Reject(identity) => reject(provider.as_ref(), &identity, &state).await,
        }
        if auth.changed().await.is_err() {
            debug!("auth provider closed its state stream");
            break;
        }
    }
}
