//! Core traits defined in `grutto-core` and implemented by other crates.

pub mod storage;

pub use storage::{BlobStore, ByteStream, SignedUrl};
