//! API Key Rotator
//!
//! Hands out market API credentials in round-robin order so that request
//! volume is spread across each key's daily quota.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum KeyPoolError {
    #[error("API key pool is empty - at least one key is required")]
    Empty,
}

/// Round-robin credential pool.
///
/// The cursor is the only state; it wraps modulo the pool size.
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRotator {
    /// Build a rotator, trimming keys and dropping blanks.
    /// Fails if nothing usable remains.
    pub fn new<I, S>(keys: I) -> Result<Self, KeyPoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(KeyPoolError::Empty);
        }

        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Next credential in circular order
    pub fn next(&self) -> &str {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[idx]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeyRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRotator")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_order() {
        let rotator = KeyRotator::new(["k1", "k2", "k3"]).unwrap();
        let handed_out: Vec<&str> = (0..5).map(|_| rotator.next()).collect();
        assert_eq!(handed_out, vec!["k1", "k2", "k3", "k1", "k2"]);
    }

    #[test]
    fn test_single_key_repeats() {
        let rotator = KeyRotator::new(vec!["only".to_string()]).unwrap();
        assert_eq!(rotator.next(), "only");
        assert_eq!(rotator.next(), "only");
    }

    #[test]
    fn test_empty_pool_rejected() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(KeyRotator::new(empty).unwrap_err(), KeyPoolError::Empty);
    }

    #[test]
    fn test_blank_keys_dropped() {
        assert!(KeyRotator::new(["", "   "]).is_err());

        let rotator = KeyRotator::new([" a ", "", "b"]).unwrap();
        assert_eq!(rotator.len(), 2);
        assert_eq!(rotator.next(), "a");
        assert_eq!(rotator.next(), "b");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let rotator = KeyRotator::new(["secret-key-value"]).unwrap();
        let rendered = format!("{:?}", rotator);
        assert!(!rendered.contains("secret-key-value"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let rotator = Arc::new(KeyRotator::new(["a", "b"]).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = Arc::clone(&rotator);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        r.next();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 40 draws total, so the cursor is back on the first key
        assert_eq!(rotator.next(), "a");
    }
}
