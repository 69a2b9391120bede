//! Client for the remote job-listing source.
//!
//! [`ListingSource`] is the seam the watcher polls through; [`UpworkSource`]
//! is the production implementation, speaking the public visitor job-search
//! GraphQL endpoint.

pub mod client;
pub mod error;
mod query;
mod response;

pub use client::{ListingSource, UpworkSource};
pub use error::SourceError;
