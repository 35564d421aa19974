//! Manager parameters.

use serde::{Deserialize, Serialize};

/// Which extreme of the signal bar seeds the cancel threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelThresholdMode {
    /// Long orders watch the signal bar's low, short orders its high.
    #[default]
    OppositeExtreme,
    /// Long orders watch the signal bar's high, short orders its low.
    ///
    /// The threshold then equals the stop trigger. A bar that does not fill
    /// the order has its high below a long trigger, so its low is below the
    /// threshold too (short: mirrored). The order is therefore cancelled on
    /// the first bar after placement unless that bar fills it.
    SameExtreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Bars (ending at the current bar) scanned for the structural stop.
    pub structural_lookback: usize,
    /// Distance kept between the structural extreme and the stop.
    pub structural_buffer: f64,
    pub cancel_threshold: CancelThresholdMode,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            structural_lookback: 3,
            structural_buffer: 0.0,
            cancel_threshold: CancelThresholdMode::OppositeExtreme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ManagerConfig::default();
        assert_eq!(cfg.structural_lookback, 3);
        assert_eq!(cfg.structural_buffer, 0.0);
        assert_eq!(cfg.cancel_threshold, CancelThresholdMode::OppositeExtreme);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ManagerConfig =
            serde_json::from_str(r#"{"cancel_threshold":"same_extreme"}"#).unwrap();
        assert_eq!(cfg.cancel_threshold, CancelThresholdMode::SameExtreme);
        assert_eq!(cfg.structural_lookback, 3);
    }
}
