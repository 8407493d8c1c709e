//! Ratchet enforcement for trailing thresholds
//!
//! **Core Rule:** a threshold may tighten, never loosen, until it is
//! explicitly reset on a position transition.
//!
//! - Long side: the stoploss under the price can only rise.
//! - Flat side: the re-entry trigger above the price can only fall.

/// A single ratcheting price level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratchet {
    level: f64,
}

impl Ratchet {
    pub fn new(level: f64) -> Self {
        Self { level }
    }

    /// Raise the level to `proposed` if that is higher.
    ///
    /// # Example
    /// ```
    /// use stoplab_core::strategy::Ratchet;
    ///
    /// let mut stop = Ratchet::new(95.0);
    /// assert_eq!(stop.tighten_up(100.0), 100.0);
    /// // Loosening is blocked
    /// assert_eq!(stop.tighten_up(90.0), 100.0);
    /// ```
    pub fn tighten_up(&mut self, proposed: f64) -> f64 {
        self.level = self.level.max(proposed);
        self.level
    }

    /// Lower the level to `proposed` if that is lower.
    pub fn tighten_down(&mut self, proposed: f64) -> f64 {
        self.level = self.level.min(proposed);
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Overwrite the level, bypassing the ratchet rule.
    pub fn reset(&mut self, level: f64) {
        self.level = level;
    }
}

impl Default for Ratchet {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tighten_up_allows_raise() {
        let mut ratchet = Ratchet::new(95.0);
        assert_eq!(ratchet.tighten_up(100.0), 100.0);
        assert_eq!(ratchet.level(), 100.0);
    }

    #[test]
    fn tighten_up_blocks_lowering() {
        let mut ratchet = Ratchet::new(100.0);
        assert_eq!(ratchet.tighten_up(90.0), 100.0);
    }

    #[test]
    fn tighten_down_allows_lowering() {
        let mut ratchet = Ratchet::new(105.0);
        assert_eq!(ratchet.tighten_down(100.0), 100.0);
    }

    #[test]
    fn tighten_down_blocks_raise() {
        let mut ratchet = Ratchet::new(100.0);
        assert_eq!(ratchet.tighten_down(110.0), 100.0);
    }

    #[test]
    fn reset_bypasses_rule() {
        let mut ratchet = Ratchet::new(110.0);
        ratchet.reset(80.0);
        assert_eq!(ratchet.level(), 80.0);

        // Rule applies again from the new level
        assert_eq!(ratchet.tighten_up(75.0), 80.0);
    }

    #[test]
    fn default_level_is_zero() {
        assert_eq!(Ratchet::default().level(), 0.0);
    }
}
