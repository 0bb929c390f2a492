//! Blob store implementations.

pub mod local;
pub mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;

/// Reject keys that are empty, absolute or climb out of the store.
pub(crate) fn validate_key(key: &str) -> AppResult<()> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::validation("Blob key cannot be empty"));
    }
    if trimmed.split(['/', '\\']).any(|part| part == "..") {
        return Err(AppError::validation(format!(
            "Blob key must not contain '..': {key}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user/abc.pdf").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/").is_err());
        assert!(validate_key("user/../other/abc.pdf").is_err());
        assert!(validate_key("..\\secret").is_err());
    }
}
