//! Keep a Notion database in sync with a GitHub repository's issues and
//! pull requests.
//!
//! The engines in [`sync`] and [`events`] never speak HTTP themselves; they
//! operate on the [`github::IssueSource`] and [`notion::PageStore`]
//! capability traits, which the reqwest-backed clients implement.

pub mod config;
pub mod error;
pub mod events;
pub mod github;
pub mod model;
pub mod notion;
pub mod pagination;
pub mod placement;
pub mod properties;
pub mod reconcile;
pub mod sync;
