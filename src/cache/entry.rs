//! Cache Entry Module
//!
//! One slot of the fixed-size response cache.

// == Cache Entry ==
/// A single cache slot.
///
/// A slot with `occupied == false` is free no matter what `key` and
/// `payload` still hold from an earlier tenant.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Request URI exactly as the client sent it (case-sensitive).
    pub key: String,
    /// Raw origin response bytes.
    pub payload: Vec<u8>,
    /// Whether the slot currently holds a live entry.
    pub occupied: bool,
    /// Logical clock value of the last hit or insert.
    pub last_use: u64,
}

impl CacheEntry {
    // == Size ==
    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    // == Matches ==
    /// True when the slot is live and holds `uri`.
    pub fn matches(&self, uri: &str) -> bool {
        self.occupied && self.key == uri
    }

    // == Fill ==
    /// Overwrite the slot in place with a new tenant.
    pub fn fill(&mut self, key: String, payload: Vec<u8>, last_use: u64) {
        self.key = key;
        self.payload = payload;
        self.occupied = true;
        self.last_use = last_use;
    }
}
