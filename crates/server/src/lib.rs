//! The gigwatch service: poll loop, retry policy, and liveness endpoint.
//!
//! Wires the other crates together: fetch a page from the source, dedup
//! against the store, persist, broadcast. The `gigwatch` binary lives in
//! `src/bin/`.

pub mod cycle;
pub mod health;
pub mod retry;
pub mod watcher;
