//! Awesome-Oscillator-style momentum.
//!
//! median[t] = (high[t] + low[t]) / 2
//! osc[t]    = SMA(median, fast)[t] - SMA(median, slow)[t]
//! Lookback: slow - 1 (first valid value at index 33 for the 5/34 default).

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct AwesomeOscillator {
    fast: usize,
    slow: usize,
    name: String,
}

impl AwesomeOscillator {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1, "fast period must be >= 1");
        assert!(slow > fast, "slow period must exceed fast period");
        Self {
            fast,
            slow,
            name: format!("oscillator_{fast}_{slow}"),
        }
    }

    pub fn default_params() -> Self {
        Self::new(5, 34)
    }
}

impl Indicator for AwesomeOscillator {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let median: Vec<f64> = bars.iter().map(Bar::median).collect();
        let fast = rolling_mean(&median, self.fast);
        let slow = rolling_mean(&median, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn undefined_before_slow_window() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let osc = AwesomeOscillator::default_params().compute(&bars);
        assert!(osc[..33].iter().all(|v| v.is_nan()));
        assert!(!osc[33].is_nan());
    }

    #[test]
    fn flat_market_is_zero() {
        let bars = make_bars(&[100.0; 40]);
        let osc = AwesomeOscillator::default_params().compute(&bars);
        for v in &osc[33..] {
            assert_approx(*v, 0.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rising_market_is_positive() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let osc = AwesomeOscillator::default_params().compute(&bars);
        // Linear trend: fast mean leads slow mean by (34 - 5) / 2 = 14.5 bars.
        assert_approx(osc[45], 14.5, 1e-9);
    }

    #[test]
    fn short_history_is_all_undefined() {
        let bars = make_bars(&[100.0; 20]);
        let osc = AwesomeOscillator::default_params().compute(&bars);
        assert!(osc.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lookback_and_name() {
        let osc = AwesomeOscillator::default_params();
        assert_eq!(osc.lookback(), 33);
        assert_eq!(osc.name(), "oscillator_5_34");
    }
}
