//! User profile service.

pub mod service;

pub use service::{ProfileService, RegisterProfile};
