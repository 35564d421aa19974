//! `SimBroker`: the reference single-instrument execution engine.
//!
//! Price-touch stop fills, market-on-close exits, whole-unit sizing and a
//! flat commission rate. No slippage and no partial fills.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::interface::{EngineError, EngineSnapshot, ExecutionEngine};
use super::trigger::{check_stop, StopSide};
use crate::domain::{Bar, Direction, ExitReason, PendingOrder, Position, TradeRecord};
use crate::manager::ManagerAction;

/// Capital, cost and sizing parameters for the broker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub initial_capital: f64,
    /// Fraction of notional charged on every fill.
    pub commission_rate: f64,
    /// Fraction of current equity committed to each entry.
    pub position_size_pct: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            commission_rate: 0.002,
            position_size_pct: 0.9999,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    position: Position,
    entry_time: NaiveDateTime,
    entry_commission: f64,
}

/// Simulated broker holding at most one pending order and one position.
#[derive(Debug, Clone)]
pub struct SimBroker {
    config: BrokerConfig,
    pending: Option<PendingOrder>,
    open: Option<OpenTrade>,
    /// Closed-trade PnL net of every commission paid so far.
    realized_pnl: f64,
    last_close: Option<f64>,
    trades: Vec<TradeRecord>,
    dropped_orders: usize,
}

impl SimBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            pending: None,
            open: None,
            realized_pnl: 0.0,
            last_close: None,
            trades: Vec::new(),
            dropped_orders: 0,
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn position(&self) -> Option<&Position> {
        self.open.as_ref().map(|open| &open.position)
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    /// Triggered orders that sized to zero units.
    pub fn dropped_orders(&self) -> usize {
        self.dropped_orders
    }

    pub fn unrealized_pnl(&self) -> f64 {
        match (self.open, self.last_close) {
            (Some(open), Some(close)) => open.position.unrealized_pnl(close),
            _ => 0.0,
        }
    }

    /// Initial capital plus realised net PnL plus unrealised PnL at the last close.
    pub fn equity(&self) -> f64 {
        self.config.initial_capital + self.realized_pnl + self.unrealized_pnl()
    }

    /// Record `bar`'s close as the mark price and return equity.
    ///
    /// Void bars carry the previous mark forward.
    pub fn mark(&mut self, bar: &Bar) -> f64 {
        if bar.close.is_finite() {
            self.last_close = Some(bar.close);
        }
        self.equity()
    }

    /// Close any open position at `bar`'s close and drop the pending order.
    pub fn finalize(&mut self, bar_index: usize, bar: &Bar) {
        self.pending = None;
        if self.open.is_some() {
            let price = self.last_close.unwrap_or(bar.close);
            self.close_position(bar_index, bar.timestamp, price, ExitReason::EndOfData);
        }
    }

    fn fill_entry(&mut self, order: PendingOrder, price: f64, bar_index: usize, bar: &Bar) {
        let budget = self.equity() * self.config.position_size_pct;
        let size = (budget / price).floor();
        if size.is_nan() || size < 1.0 {
            warn!(
                bar = bar_index,
                direction = ?order.direction,
                price,
                budget,
                "entry sized to zero units, order dropped"
            );
            self.dropped_orders += 1;
            return;
        }

        let entry_commission = self.config.commission_rate * price * size;
        self.realized_pnl -= entry_commission;
        self.open = Some(OpenTrade {
            position: Position {
                direction: order.direction,
                entry_price: price,
                entry_bar: bar_index,
                stop_loss: order.stop_loss,
                size,
            },
            entry_time: bar.timestamp,
            entry_commission,
        });
        debug!(
            bar = bar_index,
            direction = ?order.direction,
            price,
            size,
            stop_loss = order.stop_loss,
            "entry filled"
        );
    }

    fn close_position(
        &mut self,
        bar_index: usize,
        exit_time: NaiveDateTime,
        price: f64,
        reason: ExitReason,
    ) {
        let Some(open) = self.open.take() else {
            return;
        };
        let position = open.position;
        let gross_pnl = position.unrealized_pnl(price);
        let exit_commission = self.config.commission_rate * price * position.size;
        let commission = open.entry_commission + exit_commission;
        let net_pnl = gross_pnl - commission;
        let notional = position.entry_price * position.size;

        self.realized_pnl += gross_pnl - exit_commission;
        debug!(
            bar = bar_index,
            direction = ?position.direction,
            price,
            net_pnl,
            ?reason,
            "position closed"
        );

        self.trades.push(TradeRecord {
            direction: position.direction,
            size: position.size,
            entry_bar: position.entry_bar,
            entry_time: open.entry_time,
            entry_price: position.entry_price,
            exit_bar: bar_index,
            exit_time,
            exit_price: price,
            exit_reason: reason,
            stop_loss: position.stop_loss,
            gross_pnl,
            commission,
            net_pnl,
            return_pct: if notional > 0.0 { net_pnl / notional } else { 0.0 },
            entry_signal: 0,
            exit_signal: 0,
        });
    }
}

impl Default for SimBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl ExecutionEngine for SimBroker {
    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            position: self.open.map(|open| match self.last_close {
                Some(close) => open.position.snapshot(close),
                None => open.position.snapshot(open.position.entry_price),
            }),
            pending: self.pending,
        }
    }

    fn process_bar(&mut self, bar_index: usize, bar: &Bar) {
        if bar.is_void() {
            return;
        }

        // Stop-loss first; never on the entry bar.
        if let Some(open) = self.open {
            let position = open.position;
            if bar_index > position.entry_bar {
                let side = StopSide::exit(position.direction);
                if let Some(fill) = check_stop(side, position.stop_loss, bar) {
                    self.close_position(bar_index, bar.timestamp, fill.price, ExitReason::StopLoss);
                }
            }
        }

        if self.open.is_some() {
            return;
        }
        let Some(order) = self.pending else {
            return;
        };
        if bar_index <= order.placed_bar {
            return;
        }
        if let Some(fill) = check_stop(StopSide::entry(order.direction), order.stop_price, bar) {
            self.pending = None;
            self.fill_entry(order, fill.price, bar_index, bar);
        }
    }

    fn apply(
        &mut self,
        action: &ManagerAction,
        bar_index: usize,
        bar: &Bar,
    ) -> Result<(), EngineError> {
        match *action {
            ManagerAction::PlaceStopEntry(order) => {
                if self.pending.is_some() {
                    return Err(EngineError::OrderAlreadyPending { bar_index });
                }
                if self.open.is_some() {
                    return Err(EngineError::PositionAlreadyOpen { bar_index });
                }
                self.pending = Some(order);
            }
            ManagerAction::CancelOrder => {
                if self.pending.take().is_none() {
                    return Err(EngineError::NoPendingOrder { bar_index });
                }
            }
            ManagerAction::ClosePosition => {
                if self.open.is_none() {
                    return Err(EngineError::NoOpenPosition {
                        bar_index,
                        action: "close",
                    });
                }
                self.close_position(bar_index, bar.timestamp, bar.close, ExitReason::Reversal);
            }
            ManagerAction::SetStopLoss { stop_loss } => {
                let Some(open) = self.open.as_mut() else {
                    return Err(EngineError::NoOpenPosition {
                        bar_index,
                        action: "stop-loss update",
                    });
                };
                let current = open.position.stop_loss;
                let loosens = match open.position.direction {
                    Direction::Long => stop_loss < current,
                    Direction::Short => stop_loss > current,
                };
                if loosens {
                    return Err(EngineError::StopLoosened {
                        bar_index,
                        stop_loss,
                        current,
                    });
                }
                open.position.stop_loss = stop_loss;
            }
        }
        Ok(())
    }
}
