//! Media library module
//!
//! Filename validation, metadata lookup with caching, and the byte-range stream transport.

pub mod filename;
pub mod metadata;
pub mod stream;

pub use metadata::{lookup, DiskStorage, MetadataCache, Storage};
pub use stream::open_window;
