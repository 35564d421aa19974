//! Divbar Core: bars, indicators, divergent-bar detection, the order/position
//! state machine, and a reference execution engine.
//!
//! Data flows one way per bar:
//! - OHLC history → `indicators::IndicatorSet` (oscillator + three-line envelope)
//! - → `signal::DivergenceDetector` (bullish / bearish / none, plus condition rows)
//! - → `manager::OrderPositionManager` (place, cancel, reverse, tighten intents)
//! - → `engine::ExecutionEngine` (fills, stop-loss exits, trade records)

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod manager;
pub mod signal;
