//! Route table and access rules.

use std::fmt;

use serde::Serialize;

use crate::domain::{GateState, GuardDecision, PostId, guard};

/// Every page the client can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "param", rename_all = "camelCase")]
pub enum Route {
    /// `/` or `/home`.
    Home,
    /// `/:category`.
    Category(String),
    /// `/Blog/:id`.
    PostDetail(PostId),
    /// `/Dashboard`.
    Dashboard,
    /// `/AddBlog`.
    AddPost,
    /// `/EditBlog/:id`.
    EditPost(PostId),
    /// `/Login`.
    Login,
}

/// Whether a route may be shown right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Public route; render without consulting the gate.
    Open,
    /// Protected route; follow the guard decision.
    Guarded(GuardDecision),
}

impl Route {
    /// Parse a path. Fixed segments match case-insensitively; unknown
    /// multi-segment paths yield `None`.
    ///
    /// # Examples
    /// ```
    /// use blogverse::views::Route;
    ///
    /// assert_eq!(Route::parse("/dashboard"), Some(Route::Dashboard));
    /// assert_eq!(Route::parse("/News"), Some(Route::Category("News".into())));
    /// assert_eq!(Route::parse("/a/b/c"), None);
    /// ```
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Self::Home),
            [single] => Some(match single.to_ascii_lowercase().as_str() {
                "home" => Self::Home,
                "dashboard" => Self::Dashboard,
                "addblog" => Self::AddPost,
                "login" => Self::Login,
                _ => Self::Category((*single).to_owned()),
            }),
            [prefix, id] if prefix.eq_ignore_ascii_case("blog") => {
                PostId::new(*id).ok().map(Self::PostDetail)
            }
            [prefix, id] if prefix.eq_ignore_ascii_case("editblog") => {
                PostId::new(*id).ok().map(Self::EditPost)
            }
            _ => None,
        }
    }

    /// Whether the route is write-capable and needs the allowed identity.
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard | Self::AddPost | Self::EditPost(_))
    }

    /// Access decision for this route under `state`.
    pub fn access(&self, state: &GateState) -> Access {
        if self.requires_auth() {
            Access::Guarded(guard(state, &self.to_string()))
        } else {
            Access::Open
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Category(category) => write!(f, "/{category}"),
            Self::PostDetail(id) => write!(f, "/Blog/{id}"),
            Self::Dashboard => f.write_str("/Dashboard"),
            Self::AddPost => f.write_str("/AddBlog"),
            Self::EditPost(id) => write!(f, "/EditBlog/{id}"),
            Self::Login => f.write_str("/Login"),
        }
    }
}
