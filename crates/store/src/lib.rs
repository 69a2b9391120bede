//! Bounded, order-preserving history of recently seen listings.
//!
//! The whole history lives in a single JSON file so it survives restarts and
//! stays trivially inspectable. [`compute_new`] and [`merge`] are the pure
//! dedup/bounding steps; [`ListingStore`] is the file around them.

mod store;

pub use store::{compute_new, merge, ListingStore, StoreError};
