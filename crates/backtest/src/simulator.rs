//! Backtest simulator.
//!
//! Feeds ticks to the order book and the algorithm in lockstep, applies the
//! algorithm's commands, and matches working child orders against each tick.

use algo_core::config::SimulatorConfig;
use algo_core::{
    AlgoState, Command, Error, Fill, OrderId, Quantity, RawTick, SequenceNumber, Tick,
};
use tracing::{debug, info, warn};

use crate::metrics::{RunCounters, RunSummary, SummaryCalculator};
use crate::order_book::{LevelMatch, OrderBook};
use crate::strategy::DecisionMaker;

/// Category of a rejected tick or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Malformed tick, out-of-sequence tick, or bad order parameters.
    Validation,
    /// Illegal state transition (e.g. cancel after fill).
    InvalidTransition,
    /// Cancel for an order id that was never created.
    UnknownOrder,
    /// Anything else.
    Other,
}

impl From<&Error> for RejectionKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::Validation(_) => RejectionKind::Validation,
            Error::InvalidTransition { .. } => RejectionKind::InvalidTransition,
            Error::UnknownOrder(_) => RejectionKind::UnknownOrder,
            _ => RejectionKind::Other,
        }
    }
}

/// A tick or command the simulator refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Sequence number of the tick being processed.
    pub seq: SequenceNumber,
    /// Offending command, `None` for tick and fill rejections.
    pub command: Option<Command>,
    /// Order whose fill could not be applied.
    pub order: Option<OrderId>,
    pub kind: RejectionKind,
    pub reason: String,
}

/// Everything that happened while processing one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub seq: SequenceNumber,
    /// Orders created (and accepted) on this tick.
    pub created: Vec<OrderId>,
    /// Orders cancelled on this tick.
    pub cancelled: Vec<OrderId>,
    /// Fills applied on this tick, in matching order.
    pub fills: Vec<(OrderId, Fill)>,
    pub rejections: Vec<Rejection>,
}

impl TickReport {
    fn new(seq: SequenceNumber) -> Self {
        Self {
            seq,
            ..Default::default()
        }
    }

    /// Quantity filled on this tick.
    pub fn filled_quantity(&self) -> Quantity {
        self.fills.iter().map(|(_, f)| f.quantity).sum()
    }

    /// Was the tick itself rejected (nothing applied)?
    pub fn tick_rejected(&self) -> bool {
        self.rejections
            .iter()
            .any(|r| r.command.is_none() && r.order.is_none())
    }
}

/// Backtest simulator state.
///
/// Owns its order book, Algo State and strategy; nothing is shared between
/// simulators, so independent runs can execute in parallel.
pub struct BacktestSimulator<D> {
    config: SimulatorConfig,
    strategy: D,
    book: OrderBook,
    state: AlgoState,
    /// Sequence number of the last applied tick.
    last_seq: Option<SequenceNumber>,
    counters: RunCounters,
    rejections: Vec<Rejection>,
}

impl<D: DecisionMaker> BacktestSimulator<D> {
    /// Create a new simulator with default configuration.
    pub fn new(strategy: D) -> Self {
        Self::with_config(SimulatorConfig::default(), strategy)
    }

    /// Create a new simulator.
    pub fn with_config(config: SimulatorConfig, strategy: D) -> Self {
        Self {
            config,
            strategy,
            book: OrderBook::new(),
            state: AlgoState::new(),
            last_seq: None,
            counters: RunCounters::default(),
            rejections: Vec::new(),
        }
    }

    /// Process one tick: apply to book, ask the strategy, apply its commands,
    /// then match every working order.
    pub fn on_tick(&mut self, tick: Tick) -> TickReport {
        let seq = tick.seq();
        let mut report = TickReport::new(seq);

        if let Some(last) = self.last_seq {
            if seq <= last {
                self.counters.ticks_rejected += 1;
                let error = Error::validation(format!(
                    "tick {seq} out of sequence (last applied {last})"
                ));
                self.reject(&mut report, None, error);
                return self.finish(report);
            }
        }
        self.last_seq = Some(seq);

        let tick = self.book.apply_tick(tick);
        debug!(
            seq,
            bid = tick.best_bid().price,
            ask = tick.best_ask().price,
            "tick applied"
        );

        let commands = self.strategy.decide(&self.state, tick);
        for command in commands {
            self.apply_command(seq, command, &mut report);
        }

        self.match_working_orders(seq, &mut report);
        self.counters.ticks_processed += 1;
        self.finish(report)
    }

    /// Validate raw tick data and process it. A malformed tick is rejected
    /// without touching the book or the state.
    pub fn on_raw_tick(&mut self, raw: RawTick) -> TickReport {
        let seq = raw.seq;
        let built = if self.config.allow_crossed_ticks {
            Tick::new_crossed(raw.seq, raw.ts_ms, raw.bids, raw.asks)
        } else {
            Tick::try_from(raw)
        };

        match built {
            Ok(tick) => self.on_tick(tick),
            Err(error) => {
                let mut report = TickReport::new(seq);
                self.counters.ticks_rejected += 1;
                self.reject(&mut report, None, error);
                self.finish(report)
            }
        }
    }

    /// Feed every tick and return the run summary.
    pub fn run(&mut self, ticks: impl IntoIterator<Item = Tick>) -> RunSummary {
        for tick in ticks {
            self.on_tick(tick);
        }
        self.complete()
    }

    /// Feed every raw tick and return the run summary.
    pub fn run_raw(&mut self, ticks: impl IntoIterator<Item = RawTick>) -> RunSummary {
        for raw in ticks {
            self.on_raw_tick(raw);
        }
        self.complete()
    }

    /// Current Algo State.
    pub fn state(&self) -> &AlgoState {
        &self.state
    }

    /// Current order book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn strategy(&self) -> &D {
        &self.strategy
    }

    /// Every rejection so far (empty when recording is disabled).
    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    /// Calculate the run summary.
    pub fn summary(&self) -> RunSummary {
        SummaryCalculator::calculate(&self.state, self.counters)
    }

    /// Consume the simulator and return the final state.
    pub fn into_state(self) -> AlgoState {
        self.state
    }

    fn apply_command(&mut self, seq: SequenceNumber, command: Command, report: &mut TickReport) {
        match command {
            Command::Create {
                side,
                price,
                quantity,
            } => {
                let created = self
                    .state
                    .add_child_order(side, price, quantity, seq)
                    .and_then(|id| self.state.accept(id).map(|()| id));
                match created {
                    Ok(id) => {
                        info!(seq, %id, ?side, price, quantity, "child order created");
                        report.created.push(id);
                    }
                    Err(error) => self.reject(report, Some(command), error),
                }
            }
            Command::Cancel { id } => match self.state.cancel(id) {
                Ok(()) => {
                    info!(seq, %id, "child order cancelled");
                    report.cancelled.push(id);
                }
                Err(error) => self.reject(report, Some(command), error),
            },
        }
    }

    fn match_working_orders(&mut self, seq: SequenceNumber, report: &mut TickReport) {
        // Most aggressive limit first, then creation order.
        let mut working: Vec<_> = self
            .state
            .active_child_orders()
            .iter()
            .map(|o| (-o.side().sign() * o.price(), o.id()))
            .collect();
        working.sort_unstable();

        for (_, id) in working {
            let Some(order) = self.state.child_order(id) else {
                continue;
            };
            let matches = self.book.match_order(order);
            self.apply_matches(seq, id, matches, report);
        }
    }

    /// Apply matched liquidity to an order. Stops at the first fill the order
    /// refuses and records it as a rejection.
    fn apply_matches(
        &mut self,
        seq: SequenceNumber,
        id: OrderId,
        matches: Vec<LevelMatch>,
        report: &mut TickReport,
    ) {
        for m in matches {
            let fill = Fill {
                seq,
                price: m.price,
                quantity: m.quantity,
            };
            if let Err(error) = self.state.apply_fill(id, fill) {
                self.record(report, None, Some(id), error);
                return;
            }
            report.fills.push((id, fill));
        }
    }

    fn reject(&mut self, report: &mut TickReport, command: Option<Command>, error: Error) {
        self.record(report, command, None, error);
    }

    fn record(
        &mut self,
        report: &mut TickReport,
        command: Option<Command>,
        order: Option<OrderId>,
        error: Error,
    ) {
        warn!(seq = report.seq, ?command, ?order, %error, "rejected");
        if command.is_some() {
            self.counters.commands_rejected += 1;
        }
        report.rejections.push(Rejection {
            seq: report.seq,
            command,
            order,
            kind: RejectionKind::from(&error),
            reason: error.to_string(),
        });
    }

    fn finish(&mut self, report: TickReport) -> TickReport {
        if self.config.record_rejections {
            self.rejections.extend(report.rejections.iter().cloned());
        }
        report
    }

    fn complete(&self) -> RunSummary {
        let summary = self.summary();
        info!(
            strategy = self.strategy.name(),
            ticks = summary.ticks_processed,
            rejected_ticks = summary.ticks_rejected,
            orders = summary.orders_created,
            filled = summary.total_filled_quantity,
            "run complete"
        );
        summary
    }
}
