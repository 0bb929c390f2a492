//! Core type definitions used across the Grutto workspace.

pub mod sorting;

pub use sorting::{FileSort, SortDirection};
