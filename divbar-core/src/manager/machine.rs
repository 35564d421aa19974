//! The order/position state machine.
//!
//! Per bar, in fixed order:
//! 1. Position management (reverse on a profitable opposite signal, else
//!    tighten the structural stop while profitable)
//! 2. Stale-order invalidation via the cancel threshold
//! 3. New-signal invalidation of any pending order
//! 4. Placement of a new stop-entry order

use tracing::debug;

use super::action::{ManagerAction, ManagerState, ManagerStats};
use super::config::{CancelThresholdMode, ManagerConfig};
use super::ratchet::RatchetState;
use super::structural::StructuralLevels;
use crate::domain::{
    crosses_cancel_threshold, Bar, Direction, PendingOrder, Position, PositionSnapshot,
};
use crate::engine::EngineSnapshot;
use crate::signal::Signal;

/// Stateful manager for a single instrument.
///
/// Holds the pending order, the position, and the cancel-price watchdog.
/// Only this type mutates them, and only from [`OrderPositionManager::on_bar`]
/// and [`OrderPositionManager::sync`].
#[derive(Debug, Clone)]
pub struct OrderPositionManager {
    config: ManagerConfig,
    pending: Option<PendingOrder>,
    position: Option<Position>,
    cancel_price: Option<f64>,
    ratchet: Option<RatchetState>,
    stats: ManagerStats,
}

impl OrderPositionManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            pending: None,
            position: None,
            cancel_price: None,
            ratchet: None,
            stats: ManagerStats::default(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn cancel_price(&self) -> Option<f64> {
        self.cancel_price
    }

    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    pub fn state(&self) -> ManagerState {
        if self.position.is_some() {
            ManagerState::InPosition
        } else if self.pending.is_some() {
            ManagerState::PendingEntry
        } else {
            ManagerState::Flat
        }
    }

    /// Adopt the engine's authoritative view of the order and position.
    ///
    /// Fills and stop-loss exits are expected transitions. Anything else the
    /// cached state did not anticipate is counted as a resync.
    pub fn sync(&mut self, snapshot: &EngineSnapshot) {
        let engine_position = snapshot.position.map(|p| p.position);
        let mut filled = false;
        let mut diverged = false;

        match (self.position, engine_position) {
            (Some(ours), None) => {
                debug!(entry_bar = ours.entry_bar, "position closed by engine");
                self.position = None;
                self.ratchet = None;
            }
            (None, None) => {}
            (Some(ours), Some(theirs))
                if ours.entry_bar == theirs.entry_bar && ours.direction == theirs.direction =>
            {
                if ours.stop_loss != theirs.stop_loss {
                    diverged = true;
                    if let Some(ratchet) = self.ratchet.as_mut() {
                        ratchet.reset(theirs.stop_loss);
                    }
                }
                self.position = Some(theirs);
            }
            (_, Some(theirs)) => {
                filled = self
                    .pending
                    .is_some_and(|order| order.direction == theirs.direction);
                diverged |= !filled;
                debug!(
                    direction = ?theirs.direction,
                    entry_price = theirs.entry_price,
                    entry_bar = theirs.entry_bar,
                    "position opened by engine"
                );
                self.position = Some(theirs);
                self.ratchet = Some(RatchetState::with_initial_level(
                    theirs.direction,
                    theirs.stop_loss,
                ));
            }
        }

        if self.pending != snapshot.pending {
            let consumed_by_fill = filled && snapshot.pending.is_none();
            diverged |= !consumed_by_fill;
            self.pending = snapshot.pending;
            self.cancel_price = snapshot.pending.map(|order| order.cancel_threshold);
        }

        if diverged {
            self.stats.resyncs += 1;
            debug!(state = ?self.state(), "resynchronised from engine snapshot");
        }
    }

    /// Decide this bar's actions.
    ///
    /// `snapshot` is the engine's state after it processed `bar_index`;
    /// `signal` is the detector output for the same bar.
    pub fn on_bar(
        &mut self,
        bars: &[Bar],
        bar_index: usize,
        signal: Signal,
        snapshot: &EngineSnapshot,
    ) -> Vec<ManagerAction> {
        self.sync(snapshot);
        let mut actions = Vec::new();
        let Some(bar) = bars.get(bar_index) else {
            return actions;
        };

        if let Some(held) = snapshot.position {
            self.manage_position(bars, bar_index, signal, held, &mut actions);
            return actions;
        }

        if let (Some(order), Some(threshold)) = (self.pending, self.cancel_price) {
            if crosses_cancel_threshold(order.direction, threshold, bar.low, bar.high) {
                debug!(bar = bar_index, threshold, "pending order went stale");
                self.cancel_pending(&mut actions);
                self.stats.cancelled_stale += 1;
            }
        }

        if self.pending.is_some() && signal.is_some() {
            debug!(bar = bar_index, ?signal, "pending order superseded by new signal");
            self.cancel_pending(&mut actions);
            self.stats.cancelled_superseded += 1;
        }

        if let Some(direction) = signal.direction() {
            self.place(direction, bar, bar_index, &mut actions);
        }

        actions
    }

    fn manage_position(
        &mut self,
        bars: &[Bar],
        bar_index: usize,
        signal: Signal,
        held: PositionSnapshot,
        actions: &mut Vec<ManagerAction>,
    ) {
        let position = held.position;
        let opposite = signal.direction() == Some(position.direction.opposite());

        if opposite && held.is_profitable() {
            debug!(
                bar = bar_index,
                from = ?position.direction,
                unrealized_pnl = held.unrealized_pnl,
                "reversing profitable position"
            );
            actions.push(ManagerAction::ClosePosition);
            self.position = None;
            self.ratchet = None;
            if self.pending.is_some() {
                self.cancel_pending(actions);
            }
            self.place(position.direction.opposite(), &bars[bar_index], bar_index, actions);
            self.stats.reversals += 1;
            return;
        }

        if held.is_profitable() {
            if let Some(stop_loss) = self.tighten(bars, bar_index, &position) {
                actions.push(ManagerAction::SetStopLoss { stop_loss });
            }
        }
    }

    fn tighten(&mut self, bars: &[Bar], bar_index: usize, position: &Position) -> Option<f64> {
        debug_assert!(self.position.is_some(), "tightening a stop without a position");
        let levels = StructuralLevels::compute(
            bars,
            bar_index,
            self.config.structural_lookback,
            self.config.structural_buffer,
        )?;
        let candidate = levels.tightened_stop(position)?;

        let ratchet = self.ratchet.get_or_insert_with(|| {
            RatchetState::with_initial_level(position.direction, position.stop_loss)
        });
        if !ratchet.would_tighten(candidate) {
            return None;
        }
        let stop_loss = ratchet.apply(candidate);

        if let Some(held) = self.position.as_mut() {
            held.stop_loss = stop_loss;
        }
        self.stats.stop_adjustments += 1;
        debug!(bar = bar_index, stop_loss, "structural stop tightened");
        Some(stop_loss)
    }

    fn place(
        &mut self,
        direction: Direction,
        bar: &Bar,
        bar_index: usize,
        actions: &mut Vec<ManagerAction>,
    ) {
        debug_assert!(self.pending.is_none(), "placing an order while one is pending");

        let range = bar.range();
        let (stop_price, stop_loss) = match direction {
            Direction::Long => (bar.high, bar.low - range),
            Direction::Short => (bar.low, bar.high + range),
        };
        let cancel_threshold = match (self.config.cancel_threshold, direction) {
            (CancelThresholdMode::OppositeExtreme, Direction::Long)
            | (CancelThresholdMode::SameExtreme, Direction::Short) => bar.low,
            (CancelThresholdMode::OppositeExtreme, Direction::Short)
            | (CancelThresholdMode::SameExtreme, Direction::Long) => bar.high,
        };

        let order = PendingOrder {
            direction,
            stop_price,
            stop_loss,
            cancel_threshold,
            placed_bar: bar_index,
        };
        debug!(
            bar = bar_index,
            ?direction,
            stop_price,
            stop_loss,
            cancel_threshold,
            "stop-entry order placed"
        );
        self.pending = Some(order);
        self.cancel_price = Some(cancel_threshold);
        self.stats.orders_placed += 1;
        actions.push(ManagerAction::PlaceStopEntry(order));
    }

    fn cancel_pending(&mut self, actions: &mut Vec<ManagerAction>) {
        self.pending = None;
        self.cancel_price = None;
        actions.push(ManagerAction::CancelOrder);
    }
}

impl Default for OrderPositionManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}
