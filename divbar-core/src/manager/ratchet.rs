//! Ratchet invariant enforcement.
//!
//! **Core Rule:** Stops may tighten, never loosen.
//! - Long positions: stop can only rise
//! - Short positions: stop can only fall

use crate::domain::Direction;

/// Ratchet state for one position's stop-loss.
#[derive(Debug, Clone, PartialEq)]
pub struct RatchetState {
    /// High-water mark for longs, low-water mark for shorts.
    current_level: Option<f64>,
    direction: Direction,
}

impl RatchetState {
    pub fn new(direction: Direction) -> Self {
        Self {
            current_level: None,
            direction,
        }
    }

    pub fn with_initial_level(direction: Direction, initial_level: f64) -> Self {
        Self {
            current_level: Some(initial_level),
            direction,
        }
    }

    /// Apply ratchet to a proposed stop level.
    ///
    /// Returns the ratcheted level: max(current, proposed) for longs,
    /// min(current, proposed) for shorts. The first call initializes.
    ///
    /// # Example
    /// ```
    /// use divbar_core::domain::Direction;
    /// use divbar_core::manager::RatchetState;
    ///
    /// let mut ratchet = RatchetState::with_initial_level(Direction::Long, 95.0);
    /// assert_eq!(ratchet.apply(100.0), 100.0);
    /// assert_eq!(ratchet.apply(90.0), 100.0);
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        let ratcheted = match self.current_level {
            None => proposed,
            Some(current) => match self.direction {
                Direction::Long => current.max(proposed),
                Direction::Short => current.min(proposed),
            },
        };
        self.current_level = Some(ratcheted);
        ratcheted
    }

    /// Whether `proposed` would tighten the current level.
    pub fn would_tighten(&self, proposed: f64) -> bool {
        match self.current_level {
            None => true,
            Some(current) => match self.direction {
                Direction::Long => proposed > current,
                Direction::Short => proposed < current,
            },
        }
    }

    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Overwrite the level (engine resync).
    pub fn reset(&mut self, new_level: f64) {
        self.current_level = Some(new_level);
    }
}
