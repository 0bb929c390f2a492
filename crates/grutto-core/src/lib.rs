//! # grutto-core
//!
//! Core crate for Grutto Study. Contains the unified error system,
//! configuration schemas, the blob-store trait, and the sort/filter
//! value types shared by the service layer.
//!
//! This crate has **no** internal dependencies on other Grutto crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
