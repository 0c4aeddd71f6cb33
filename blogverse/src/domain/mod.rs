//! Domain primitives, services and ports.
//!
//! Purpose: Define the strongly typed records of the blog (identities,
//! profiles, posts) and the services that keep the client copy of them in
//! sync with the external collaborators behind [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::DomainError`): failure value with a stable code.
//! - IdentityGate: single-allowed-identity access gate.
//! - ProfileStore: per-identity display name cache.
//! - PostRepository: CRUD facade over the `blogs` collection.
//! - PostCollection: sorted, id-keyed reducer state.
//! - sanitize / excerpt: HTML clean-up for rendering.
//! - Session: the context object wiring all of the above.

pub mod auth;
pub mod collection;
pub mod error;
pub mod identity;
pub mod identity_gate;
pub mod ports;
pub mod post;
pub mod post_document;
pub mod post_repository;
pub mod profile;
pub mod profile_store;
pub mod sanitizer;
pub mod session;
pub mod theme;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::collection::{LoadState, PostCollection};
pub use self::error::{DomainError, DomainError as Error, DomainErrorValidationError, ErrorCode};
pub use self::identity::{AllowedEmail, EmailAddress, Identity, IdentityId, IdentityValidationError};
pub use self::identity_gate::{AuthSubscription, GateState, GuardDecision, IdentityGate, guard};
pub use self::post::{
    Author, Category, DEFAULT_CATEGORY, ImageFile, KNOWN_CATEGORIES, Post, PostChanges, PostDraft,
    PostId, PostPatch, PostValidationError, Tags,
};
pub use self::post_document::{POSTS_COLLECTION, normalize_timestamp, post_from_document};
pub use self::post_repository::{PostRepository, RepositoryState};
pub use self::profile::{DisplayName, Profile, ProfileValidationError};
pub use self::profile_store::{ProfileState, ProfileStore, USERS_COLLECTION};
pub use self::sanitizer::{
    CATEGORY_EXCERPT_CHARS, HOME_EXCERPT_CHARS, excerpt, sanitize, strip_editor_classes,
};
pub use self::session::{Session, SessionHandle, SessionPorts};
pub use self::theme::{THEME_KEY, Theme, ThemeService, UnknownTheme};

/// Result alias for domain operations.
///
/// # Examples
/// ```
/// use blogverse::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("no such post"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
