//! Pure view models consumed by the page renderers.
//!
//! Each view reads repository, profile or gate state and shapes it for one
//! page. Nothing here talks to a port directly except the post detail
//! loader, which goes through [`crate::domain::PostRepository`].

pub mod dashboard;
pub mod feed;
pub mod format;
pub mod post_detail;
pub mod routes;

pub use dashboard::{Dashboard, DashboardRow, dashboard};
pub use feed::{CategoryPage, HomeFeed, PostCard, category_page, home_feed};
pub use format::{long_date, short_date};
pub use post_detail::{LOAD_FAILED_MESSAGE, PostDetail, PostDetailView, ReadyPost};
pub use routes::{Access, Route};
