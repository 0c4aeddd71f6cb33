//! Session context wiring the gate, profile store, repository and theme.
//!
//! A [`Session`] is built once at start-up from the outbound ports and
//! replaces global singletons: views receive it explicitly.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::identity_gate::{AuthSubscription, GateState, IdentityGate};
use super::ports::{AuthProvider, DocumentStore, ImageUploader, PreferenceStorage};
use super::post_repository::PostRepository;
use super::profile_store::ProfileStore;
use super::theme::ThemeService;
use super::{AllowedEmail, Author, Error, Identity, IdentityId, Profile};

/// Outbound adapters a session is built from.
#[derive(Clone)]
pub struct SessionPorts {
    /// External auth provider.
    pub auth: Arc<dyn AuthProvider>,
    /// Remote document database.
    pub documents: Arc<dyn DocumentStore>,
    /// Image host.
    pub images: Arc<dyn ImageUploader>,
    /// Durable client preferences.
    pub preferences: Arc<dyn PreferenceStorage>,
}

/// Application state shared by every view.
#[derive(Clone)]
pub struct Session {
    gate: IdentityGate,
    profiles: ProfileStore,
    repository: PostRepository,
    theme: ThemeService,
}

/// Running background work of a started session.
///
/// Stopping or dropping the handle ends the auth subscription and the
/// profile follower.
#[derive(Debug)]
pub struct SessionHandle {
    auth: Option<AuthSubscription>,
    profile_follower: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Stop background work and wait for it to end.
    pub async fn stop(mut self) {
        if let Some(follower) = self.profile_follower.take() {
            follower.abort();
            if let Err(err) = follower.await
                && !err.is_cancelled()
            {
                debug!(error = %err, "profile follower ended abnormally");
            }
        }
        if let Some(auth) = self.auth.take() {
            auth.stop().await;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(follower) = self.profile_follower.take() {
            follower.abort();
        }
    }
}

impl Session {
    /// Assemble a session. Nothing runs until [`Session::start`].
    pub fn new(ports: SessionPorts, allowed: AllowedEmail, upload_preset: impl Into<String>) -> Self {
        Self {
            gate: IdentityGate::new(ports.auth, allowed),
            profiles: ProfileStore::new(Arc::clone(&ports.documents)),
            repository: PostRepository::new(ports.documents, ports.images, upload_preset),
            theme: ThemeService::load(ports.preferences),
        }
    }

    /// Start the identity gate and keep the profile in step with it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(&self) -> SessionHandle {
        let auth = self.gate.start();
        let follower = tokio::spawn(follow_identity(
            self.gate.subscribe(),
            self.profiles.clone(),
        ));
        SessionHandle {
            auth: Some(auth),
            profile_follower: Some(follower),
        }
    }

    /// Identity gate.
    pub fn gate(&self) -> &IdentityGate {
        &self.gate
    }

    /// Profile store.
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Content repository.
    pub fn repository(&self) -> &PostRepository {
        &self.repository
    }

    /// Theme preference.
    pub fn theme(&self) -> &ThemeService {
        &self.theme
    }

    /// Write capability for the signed-in allowed identity.
    pub fn author(&self) -> Option<Author> {
        self.gate.author(self.profiles.display_name())
    }

    /// Like [`Session::author`] but as an error for write paths.
    ///
    /// # Errors
    /// Returns `auth_rejected` when nobody allowed is signed in.
    pub fn require_author(&self) -> Result<Author, Error> {
        self.author()
            .ok_or_else(|| Error::auth_rejected("sign in with the allowed account to write"))
    }

    /// Sign in through the gate and load the profile.
    ///
    /// # Errors
    /// See [`IdentityGate::sign_in`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let identity = self.gate.sign_in(email, password).await?;
        // A failed profile read is kept as `last_error`; sign-in still holds.
        if let Err(err) = self.profiles.load(Some(&identity)).await {
            debug!(uid = %identity.id(), error = %err, "profile load after sign-in failed");
        }
        Ok(identity)
    }

    /// Sign out and clear the cached profile.
    ///
    /// # Errors
    /// See [`IdentityGate::sign_out`].
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.gate.sign_out().await?;
        self.profiles.load(None).await?;
        Ok(())
    }

    /// Save the display name of the signed-in identity.
    ///
    /// # Errors
    /// See [`ProfileStore::save`].
    pub async fn save_display_name(&self, display_name: &str) -> Result<Profile, Error> {
        let identity = self.gate.current_identity();
        self.profiles.save(identity.as_ref(), display_name).await
    }
}

async fn follow_identity(mut gate: watch::Receiver<GateState>, profiles: ProfileStore) {
    let mut last_seen: Option<Option<IdentityId>> = None;
    loop {
        let state = gate.borrow_and_update().clone();
        if !state.is_resolving() {
            let identity = state.current_identity().cloned();
            let uid = identity.as_ref().map(|identity| identity.id().clone());
            if last_seen.as_ref() != Some(&uid) {
                debug!(uid = ?uid, "identity changed; loading profile");
                last_seen = Some(uid);
                let profiles = profiles.clone();
                tokio::spawn(async move {
                    if let Err(err) = profiles.load(identity.as_ref()).await {
                        debug!(error = %err, "profile load for new identity failed");
                    }
                });
            }
        }
        if gate.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Session wiring between gate, profile store and repository.
    use std::time::Duration;

    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        DocumentStoreError, MockAuthProvider, MockDocumentStore, MockImageUploader,
        MockPreferenceStorage, StoredDocument,
    };
    use crate::domain::{EmailAddress, ErrorCode};

    const ALLOWED: &str = "admin@example.com";

    fn admin() -> Identity {
        Identity::new(
            IdentityId::new("admin-uid").expect("uid"),
            Some(EmailAddress::new(ALLOWED).expect("email")),
            true,
        )
    }

    fn session(auth: MockAuthProvider, documents: MockDocumentStore) -> Session {
        let mut preferences = MockPreferenceStorage::new();
        preferences.expect_get().returning(|_| Ok(None));
        Session::new(
            SessionPorts {
                auth: Arc::new(auth),
                documents: Arc::new(documents),
                images: Arc::new(MockImageUploader::new()),
                preferences: Arc::new(preferences),
            },
            AllowedEmail::new(ALLOWED).expect("allowed"),
            "preset",
        )
    }

    fn profile_documents() -> MockDocumentStore {
        let mut documents = MockDocumentStore::new();
        documents.expect_get_document().returning(|_, id| {
            let Value::Object(fields) = json!({"username": "Ada"}) else {
                panic!("object literal");
            };
            Ok(Some(StoredDocument::new(id, fields)))
        });
        documents
    }

    #[rstest]
    #[tokio::test]
    async fn author_requires_allowed_identity() {
        let session = session(MockAuthProvider::new(), MockDocumentStore::new());
        assert!(session.author().is_none());
        let err = session.require_author().expect_err("anonymous");
        assert_eq!(err.code(), ErrorCode::AuthRejected);
    }

    #[rstest]
    #[tokio::test]
    async fn started_session_loads_profile_for_allowed_identity() {
        let (_tx, rx) = watch::channel(Some(admin()));
        let mut auth = MockAuthProvider::new();
        auth.expect_watch_auth_state().return_once(move || rx);
        let session = session(auth, profile_documents());

        let handle = session.start();
        let mut profiles = session.profiles().subscribe();
        tokio::time::timeout(
            Duration::from_secs(1),
            profiles.wait_for(|state| state.display_name().is_some()),
        )
        .await
        .expect("profile loads in time")
        .expect("profile channel open");

        let author = session.author().expect("author");
        assert_eq!(author.email().as_ref(), ALLOWED);
        assert_eq!(author.display_name().map(AsRef::as_ref), Some("Ada"));
        handle.stop().await;
    }

    #[rstest]
    #[tokio::test]
    async fn sign_in_then_sign_out_clears_profile() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_in_with_password()
            .returning(|_| Ok(admin()));
        auth.expect_sign_out().returning(|| Ok(()));
        let session = session(auth, profile_documents());

        session.sign_in(ALLOWED, "pw").await.expect("signed in");
        assert_eq!(
            session.profiles().display_name().as_ref().map(AsRef::as_ref),
            Some("Ada")
        );

        session.sign_out().await.expect("signed out");
        assert!(session.profiles().display_name().is_none());
        assert!(session.author().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn save_display_name_uses_current_identity() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_in_with_password()
            .returning(|_| Ok(admin()));
        let mut documents = profile_documents();
        documents
            .expect_merge_document()
            .withf(|_, id, _| id == "admin-uid")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let session = session(auth, documents);
        session.sign_in(ALLOWED, "pw").await.expect("signed in");

        let profile = session
            .save_display_name(" Grace ")
            .await
            .expect("saved");

        assert_eq!(profile.display_name().map(AsRef::as_ref), Some("Grace"));
        assert_eq!(
            session
                .author()
                .and_then(|author| author.display_name().cloned())
                .map(String::from),
            Some("Grace".to_owned())
        );
    }

    #[rstest]
    #[tokio::test]
    async fn sign_in_holds_when_profile_read_fails() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_in_with_password()
            .returning(|_| Ok(admin()));
        let mut documents = MockDocumentStore::new();
        documents
            .expect_get_document()
            .times(1)
            .returning(|_, _| Err(DocumentStoreError::unavailable("offline")));
        let session = session(auth, documents);

        let identity = session.sign_in(ALLOWED, "pw").await.expect("signed in");

        assert_eq!(identity, admin());
        let state = session.profiles().state();
        assert_eq!(
            state.last_error().map(Error::code),
            Some(ErrorCode::FetchFailed)
        );
        assert!(session.author().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn stop_after_streams_close_returns() {
        let (tx, rx) = watch::channel(None);
        let mut auth = MockAuthProvider::new();
        auth.expect_watch_auth_state().return_once(move || rx);
        let session = session(auth, MockDocumentStore::new());

        let handle = session.start();
        session.gate().resolved().await;
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), async {
            while handle.auth.as_ref().is_some_and(|auth| !auth.is_finished()) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("gate task ends once the provider stream closes");

        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("stop returns promptly");
    }
}
