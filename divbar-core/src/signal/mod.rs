//! Divergent-bar detection: flags bars that diverge from the envelope and oscillator.
//!
//! Detection is portfolio-agnostic: it receives bar history and indicator
//! values, never order or position state, and carries nothing across bars.

pub mod detector;
pub mod diagnostics;

pub use detector::{ConditionRow, DivergenceDetector};
pub use diagnostics::{condition_diagnostics, ConditionDiagnostic};

use serde::{Deserialize, Serialize};

use crate::domain::Direction;

/// Per-bar detector output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    #[default]
    None,
    Bullish,
    Bearish,
}

impl Signal {
    /// Numeric encoding used in trade records: 1 bullish, -1 bearish, 0 none.
    pub fn value(self) -> i8 {
        match self {
            Signal::None => 0,
            Signal::Bullish => 1,
            Signal::Bearish => -1,
        }
    }

    /// Entry direction implied by the signal.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Signal::None => None,
            Signal::Bullish => Some(Direction::Long),
            Signal::Bearish => Some(Direction::Short),
        }
    }

    pub fn is_some(self) -> bool {
        self != Signal::None
    }
}
