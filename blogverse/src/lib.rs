//! BlogVerse client library: state synchronisation, access control and
//! sanitisation for the blog's reader and admin surfaces.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod views;

pub use config::BlogverseSettings;
pub use domain::{Session, SessionPorts};
