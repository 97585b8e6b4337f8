//! Algorithm interface and reference strategies.

use std::collections::BTreeMap;

use algo_core::config::StrategyConfig;
use algo_core::{AlgoState, Command, Price, SequenceNumber, Side, Tick};
use algo_signals::ImbalanceTracker;

/// Decision logic under test.
///
/// Called once per tick with a read-only view of the run's state. The only
/// way to affect the run is through the returned commands.
pub trait DecisionMaker {
    fn decide(&mut self, state: &AlgoState, tick: &Tick) -> Vec<Command>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> DecisionMaker for F
where
    F: FnMut(&AlgoState, &Tick) -> Vec<Command>,
{
    fn decide(&mut self, state: &AlgoState, tick: &Tick) -> Vec<Command> {
        self(state, tick)
    }
}

/// Replays a fixed list of commands keyed by tick sequence number.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStrategy {
    script: BTreeMap<SequenceNumber, Vec<Command>>,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `commands` when the tick with sequence `seq` arrives.
    pub fn on(mut self, seq: SequenceNumber, commands: impl IntoIterator<Item = Command>) -> Self {
        self.script.entry(seq).or_default().extend(commands);
        self
    }
}

impl DecisionMaker for ScriptedStrategy {
    fn decide(&mut self, _state: &AlgoState, tick: &Tick) -> Vec<Command> {
        self.script.remove(&tick.seq()).unwrap_or_default()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Crosses the spread in the direction of top-of-book pressure.
///
/// Buys at the best ask when bid-side imbalance reaches `entry_imbalance`,
/// sells at the best bid when ask-side imbalance does. When the number of
/// working orders is at its cap, the oldest working orders are cancelled to
/// make room. Stops creating orders after `max_child_orders`.
pub struct ImbalanceStrategy {
    config: StrategyConfig,
    tracker: ImbalanceTracker,
}

impl ImbalanceStrategy {
    pub fn new(config: StrategyConfig, depth: usize) -> Self {
        Self {
            config,
            tracker: ImbalanceTracker::new(256, depth, 10),
        }
    }

    /// Imbalance history observed so far.
    pub fn tracker(&self) -> &ImbalanceTracker {
        &self.tracker
    }

    fn entry(&self, imbalance: f64, tick: &Tick) -> Option<(Side, Price)> {
        if imbalance >= self.config.entry_imbalance {
            Some((Side::Buy, tick.best_ask().price))
        } else if imbalance <= -self.config.entry_imbalance {
            Some((Side::Sell, tick.best_bid().price))
        } else {
            None
        }
    }
}

impl DecisionMaker for ImbalanceStrategy {
    fn decide(&mut self, state: &AlgoState, tick: &Tick) -> Vec<Command> {
        let Some(imbalance) = self.tracker.observe(tick) else {
            return Vec::new();
        };
        let Some((side, price)) = self.entry(imbalance, tick) else {
            return Vec::new();
        };
        if state.len() >= self.config.max_child_orders {
            return Vec::new();
        }

        let active = state.active_child_orders();
        let excess = (active.len() + 1).saturating_sub(self.config.max_active_orders);
        let mut commands: Vec<Command> = active
            .iter()
            .take(excess)
            .map(|order| Command::cancel(order.id()))
            .collect();

        commands.push(Command::Create {
            side,
            price,
            quantity: self.config.order_quantity,
        });
        commands
    }

    fn name(&self) -> &str {
        "imbalance"
    }
}
