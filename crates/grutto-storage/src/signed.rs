//! Signed read URLs for external document viewers.
//!
//! A URL has the form `{base_url}/{key}?expires={unix}&signature={sig}`
//! where `sig` is the URL-safe base64 SHA-256 digest of
//! `secret|key|expires`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

use grutto_core::config::SignedUrlConfig;
use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_core::traits::SignedUrl;

/// Issues and verifies signed read URLs.
#[derive(Clone)]
pub struct SignedUrlIssuer {
    base_url: String,
    secret: String,
}

impl std::fmt::Debug for SignedUrlIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlIssuer")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SignedUrlIssuer {
    /// Create an issuer from configuration.
    pub fn new(config: &SignedUrlConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret: config.secret.clone(),
        }
    }

    /// Issue a URL for `key` that expires `ttl` after `now`.
    pub fn issue_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> AppResult<SignedUrl> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AppError::validation("Signed URL lifetime is too long"))?;
        let expires_at = now + ttl;
        let expires = expires_at.timestamp();
        let signature = self.sign(key, expires);
        Ok(SignedUrl {
            url: format!(
                "{}/{}?expires={expires}&signature={signature}",
                self.base_url,
                key.trim_start_matches('/')
            ),
            expires_at: Utc
                .timestamp_opt(expires, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }

    /// Issue a URL for `key` valid for `ttl` from now.
    pub fn issue(&self, key: &str, ttl: Duration) -> AppResult<SignedUrl> {
        self.issue_at(key, ttl, Utc::now())
    }

    /// Check a presented signature and expiry at `now`.
    pub fn verify_at(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() >= expires {
            return false;
        }
        constant_time_eq(self.sign(key, expires).as_bytes(), signature.as_bytes())
    }

    /// Check a presented signature and expiry against the current time.
    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> bool {
        self.verify_at(key, expires, signature, Utc::now())
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(key.trim_start_matches('/').as_bytes());
        hasher.update(b"|");
        hasher.update(expires.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
