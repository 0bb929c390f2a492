//! File sharing: grants, recipient search and share notifications.

pub mod service;

pub use service::{ShareOutcome, ShareRecipient, ShareService};
