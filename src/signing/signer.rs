//! Deterministic request signatures.
//!
//! The signature is a fast MD5 digest intended to resist casual tampering
//! and replay, not a cryptographic security measure. The `-`-joined formats
//! must match the verifying server byte for byte:
//!
//! ```text
//! hash = md5(join('-', url_path, timestamp, nonce, caller_id, secret_key))
//! sign = join('-', timestamp, nonce, caller_id, hash)
//! ```

use rand::Rng;

use crate::signing::clock::{epoch_ms_i64, ClockSync};

/// Caller identity baked into every signature; no authenticated user
/// identity exists at this layer.
const CALLER_ID: u32 = 0;
/// Exclusive upper bound of the signature nonce.
const NONCE_BOUND: u32 = 99_999;

/// Digest over the joined signing tuple. Deterministic in all inputs.
pub fn signature(url_path: &str, timestamp: u64, nonce: u32, caller_id: u32, key: &str) -> String {
    let joined = format!("{}-{}-{}-{}-{}", url_path, timestamp, nonce, caller_id, key);
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Value of the `sign` query parameter for a request path, or `None` when
/// signing does not apply: no key configured, or the path is not
/// root-relative (absolute external URLs are never signed).
pub async fn sign_path(path: &str, key: &str, clock: &ClockSync) -> Option<String> {
    if key.is_empty() || !path.starts_with('/') {
        return None;
    }

    let offset_ms = clock.offset_ms().await;
    let timestamp = ((epoch_ms_i64() + offset_ms) / 1000) as u64;
    let nonce = rand::thread_rng().gen_range(0..NONCE_BOUND);

    // The hash covers the path component only, query excluded.
    let url_path = path.split('?').next().unwrap_or(path);
    let hash = signature(url_path, timestamp, nonce, CALLER_ID, key);

    Some(format!("{}-{}-{}-{}", timestamp, nonce, CALLER_ID, hash))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::signing::clock::{RemoteTime, TimeSource};

    struct FixedSource(u64);

    #[async_trait]
    impl TimeSource for FixedSource {
        async fn fetch(&self) -> Result<RemoteTime> {
            Ok(RemoteTime { t: self.0 })
        }
    }

    fn fixed_clock() -> ClockSync {
        ClockSync::new(Arc::new(FixedSource(1_700_000_000)))
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = signature("/api/items", 1_700_000_000, 42, 0, "secret");
        let b = signature("/api/items", 1_700_000_000, 42, 0, "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_sensitive_to_every_input() {
        let base = signature("/api/items", 1_700_000_000, 42, 0, "secret");
        assert_ne!(base, signature("/api/other", 1_700_000_000, 42, 0, "secret"));
        assert_ne!(base, signature("/api/items", 1_700_000_001, 42, 0, "secret"));
        assert_ne!(base, signature("/api/items", 1_700_000_000, 43, 0, "secret"));
        assert_ne!(base, signature("/api/items", 1_700_000_000, 42, 1, "secret"));
        assert_ne!(base, signature("/api/items", 1_700_000_000, 42, 0, "other"));
    }

    #[tokio::test]
    async fn test_sign_skips_without_key_or_relative_path() {
        let clock = fixed_clock();
        assert!(sign_path("/api/items", "", &clock).await.is_none());
        assert!(sign_path("https://elsewhere.example.com/x", "secret", &clock)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_sign_format_and_query_stripping() {
        let clock = fixed_clock();
        let sign = sign_path("/api/items?page=2", "secret", &clock)
            .await
            .unwrap();

        let parts: Vec<&str> = sign.split('-').collect();
        assert_eq!(parts.len(), 4);

        let timestamp: u64 = parts[0].parse().unwrap();
        let nonce: u32 = parts[1].parse().unwrap();
        assert_eq!(parts[2], "0");
        assert!(nonce < 99_999);

        // The hash must cover the path only, query excluded.
        let expected = signature("/api/items", timestamp, nonce, 0, "secret");
        assert_eq!(parts[3], expected);
    }
}
