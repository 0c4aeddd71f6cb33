//! Per-identity display-name record.
//!
//! Profiles live in the `users` collection keyed by identity id with a single
//! `username` field. The store caches the current identity's profile for the
//! session; every identity change bumps a generation counter so a load that
//! finishes after the identity moved on is discarded. Overlapping loads for
//! the same identity share a generation and all of them apply.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::ports::{DocumentFields, DocumentStore, StoredDocument};
use super::{DisplayName, Error, Identity, IdentityId, Profile};

/// Collection holding profiles.
pub const USERS_COLLECTION: &str = "users";

/// Field carrying the display name.
pub const USERNAME_FIELD: &str = "username";

/// Observable profile state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    identity: Option<IdentityId>,
    generation: u64,
    loaded: bool,
    profile: Option<Profile>,
    saving: bool,
    last_error: Option<Error>,
}

impl ProfileState {
    /// Cached profile of the current identity.
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Saved display name of the current identity.
    pub fn display_name(&self) -> Option<&DisplayName> {
        self.profile.as_ref().and_then(Profile::display_name)
    }

    /// Whether a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Most recent non-fatal store failure.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }
}

fn profile_from_document(identity_id: IdentityId, document: StoredDocument) -> Profile {
    let display_name = document
        .fields
        .get(USERNAME_FIELD)
        .and_then(Value::as_str)
        .and_then(|name| DisplayName::new(name).ok());
    Profile::new(identity_id, display_name)
}

/// Session cache of the signed-in identity's profile.
#[derive(Clone)]
pub struct ProfileStore {
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<ProfileState>>,
}

impl ProfileStore {
    /// Create an empty store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(ProfileState::default());
        Self {
            store,
            state: Arc::new(state),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    /// Receiver woken on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    /// Saved display name of the current identity.
    pub fn display_name(&self) -> Option<DisplayName> {
        self.state.borrow().display_name().cloned()
    }

    /// Load the profile for `identity`.
    ///
    /// Repeated calls for the same identity return the cached value without a
    /// store call. A call that overlaps an unfinished load for the same
    /// identity reads the store again and both results apply. `None` clears
    /// the cache.
    ///
    /// # Errors
    /// Returns `fetch_failed` when the store read fails; the failure is also
    /// recorded as `last_error`.
    pub async fn load(&self, identity: Option<&Identity>) -> Result<Option<Profile>, Error> {
        let Some(identity) = identity else {
            self.state.send_modify(|state| {
                *state = ProfileState {
                    generation: state.generation + 1,
                    ..ProfileState::default()
                };
            });
            return Ok(None);
        };

        let uid = identity.id().clone();
        let mut cached = None;
        let mut generation = 0;
        self.state.send_if_modified(|state| {
            if state.identity.as_ref() == Some(&uid) {
                if state.loaded {
                    cached = Some(state.profile.clone());
                }
                generation = state.generation;
                return false;
            }
            state.generation += 1;
            state.identity = Some(uid.clone());
            state.loaded = false;
            state.profile = None;
            generation = state.generation;
            true
        });
        if let Some(profile) = cached {
            return Ok(profile);
        }

        let fetched = self.store.get_document(USERS_COLLECTION, uid.as_ref()).await;
        let outcome = fetched
            .map(|document| document.map(|doc| profile_from_document(uid.clone(), doc)))
            .map_err(|err| {
                warn!(uid = %uid, error = %err, "profile load failed");
                Error::fetch_failed(err.to_string())
            });

        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            applied = true;
            match &outcome {
                Ok(profile) => {
                    state.loaded = true;
                    state.profile = profile.clone();
                }
                Err(error) => state.last_error = Some(error.clone()),
            }
            true
        });
        if !applied {
            debug!(uid = %uid, "discarding profile load for a stale identity");
            return Ok(None);
        }
        outcome
    }

    /// Save a display name for `identity`.
    ///
    /// # Errors
    /// - `validation_rejected` without an identity or with a blank name; the
    ///   store is not called and the state is left untouched,
    /// - `fetch_failed` when the store write fails, also recorded as
    ///   `last_error`.
    pub async fn save(&self, identity: Option<&Identity>, display_name: &str) -> Result<Profile, Error> {
        let identity = identity
            .ok_or_else(|| Error::validation_rejected("sign in before saving a profile"))?;
        let display_name = DisplayName::new(display_name)
            .map_err(|err| Error::validation_rejected(err.to_string()))?;
        let uid = identity.id().clone();

        let mut fields = DocumentFields::new();
        fields.insert(USERNAME_FIELD.to_owned(), json!(display_name.as_ref()));

        self.state.send_modify(|state| state.saving = true);
        let written = self
            .store
            .merge_document(USERS_COLLECTION, uid.as_ref(), fields)
            .await;

        let profile = Profile::new(uid.clone(), Some(display_name));
        match written {
            Ok(()) => {
                debug!(uid = %uid, "profile saved");
                self.state.send_modify(|state| {
                    state.saving = false;
                    state.last_error = None;
                    if state.identity.is_none() || state.identity.as_ref() == Some(&uid) {
                        state.identity = Some(uid.clone());
                        state.loaded = true;
                        state.profile = Some(profile.clone());
                    }
                });
                Ok(profile)
            }
            Err(err) => {
                warn!(uid = %uid, error = %err, "profile save failed");
                let error = Error::fetch_failed(err.to_string());
                self.state.send_modify(|state| {
                    state.saving = false;
                    state.last_error = Some(error.clone());
                });
                Err(error)
            }
        }
    }
}
