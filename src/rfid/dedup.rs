//! Repeat-read suppression.

use super::packet::TagKey;

/// Drops a key seen again within `window_ms` of its last acceptance.
///
/// Only the most recently accepted key is remembered, so alternating tags
/// are never suppressed.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    window_ms: u64,
    last: Option<(TagKey, u64)>,
}

impl Deduplicator {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last: None,
        }
    }

    /// `true` if `key` should be delivered; accepted keys reset the window.
    pub fn accept(&mut self, key: &str, now_ms: u64) -> bool {
        if let Some((last_key, last_ms)) = &self.last {
            if last_key.as_str() == key && now_ms.saturating_sub(*last_ms) < self.window_ms {
                return false;
            }
        }
        let Ok(key) = TagKey::try_from(key) else {
            // Longer than any real tag key; never remembered.
            return true;
        };
        self.last = Some((key, now_ms));
        true
    }

    pub fn set_window(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
    }
}
