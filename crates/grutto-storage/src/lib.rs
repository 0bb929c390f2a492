//! # grutto-storage
//!
//! Blob store implementations for Grutto Study: a local filesystem store
//! and an in-memory store, both issuing signed read URLs.

pub mod factory;
pub mod providers;
pub mod signed;

pub use factory::build_blob_store;
pub use providers::{LocalBlobStore, MemoryBlobStore};
pub use signed::SignedUrlIssuer;
