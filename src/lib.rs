//! Hierarchical cache keys for intercepted method calls.
//!
//! See [`cache`] for the key builder and its extension points. The `application`,
//! `config` and `infra` modules back the `callkey` inspection binary.

pub mod application;
pub mod cache;
pub mod config;
pub mod infra;
