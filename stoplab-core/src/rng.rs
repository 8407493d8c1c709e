//! Deterministic seed hierarchy.
//!
//! A master seed generates a sub-seed for each `(instrument, combination)`
//! pair of a sweep. Sub-seeds are derived via BLAKE3 hashing, independently
//! of thread scheduling order, so parallel and sequential sweeps agree.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derive the seed for one instrument and parameter combination.
    ///
    /// Order independent: deriving `("SPY", 0)` before or after `("QQQ", 0)`
    /// yields the same values.
    pub fn sub_seed(&self, instrument: &str, combination: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(instrument.as_bytes());
        hasher.update(&combination.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}
