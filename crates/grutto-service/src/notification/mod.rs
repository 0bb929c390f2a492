//! Notification panel service and retention sweep.

pub mod service;

pub use service::{NotificationEntry, NotificationService};
